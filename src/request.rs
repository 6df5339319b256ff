//! Request-scoped value objects passed between pipeline stages

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::guardrails::Rejection;

/// Sampling parameters sent with every model call. Missing keys
/// deserialize to the generation preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters
{   pub max_new_tokens: u32
  , pub temperature: f32
  , pub top_p: f32
  , /// Provider-specific extras, flattened onto the wire object
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, serde_json::Value>
}

impl GenerationParameters
{   pub fn new(max_new_tokens: u32, temperature: f32, top_p: f32)
      -> Self
    {   GenerationParameters
        {   max_new_tokens
          , temperature
          , top_p
          , extra: BTreeMap::new()
        }
    }

    /// Creative preset used for code synthesis
    pub fn generation() -> Self
    {   GenerationParameters::new(500, 0.7, 0.9)
    }

    /// Conservative preset used for review
    pub fn critic() -> Self
    {   GenerationParameters::new(600, 0.5, 0.9)
    }

    /// Apply `overrides` on top of these defaults, override wins
    pub fn merged(&self, overrides: &ParameterOverrides) -> Self
    {   let mut extra = self.extra.clone();
        for (key, value) in &overrides.extra
        {   extra.insert(key.clone(), value.clone());
        }
        GenerationParameters
        {   max_new_tokens: overrides.max_new_tokens
              .unwrap_or(self.max_new_tokens)
          , temperature: overrides.temperature
              .unwrap_or(self.temperature)
          , top_p: overrides.top_p.unwrap_or(self.top_p)
          , extra
        }
    }
}

impl Default for GenerationParameters
{   fn default() -> Self
    {   GenerationParameters::generation()
    }
}

/// Per-call parameter overrides; unset keys keep the defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterOverrides
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>
  , #[serde(flatten, default)]
    pub extra: BTreeMap<String, serde_json::Value>
}

impl ParameterOverrides
{   pub fn none() -> Self
    {   ParameterOverrides::default()
    }
}

impl From<&GenerationParameters> for ParameterOverrides
{   fn from(params: &GenerationParameters) -> Self
    {   ParameterOverrides
        {   max_new_tokens: Some(params.max_new_tokens)
          , temperature: Some(params.temperature)
          , top_p: Some(params.top_p)
          , extra: params.extra.clone()
        }
    }
}

/// Wire payload posted to the inference endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelRequest<'a>
{   pub inputs: &'a str
  , pub parameters: GenerationParameters
}

/// First completion returned by the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse
{   pub text: String
}

/// Outcome of the guardrail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult
{   pub valid: bool
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>
  , #[serde(skip)]
    pub rejection: Option<Rejection>
}

impl ValidationResult
{   pub fn accepted() -> Self
    {   ValidationResult
        {   valid: true
          , reason: None
          , rejection: None
        }
    }

    pub fn rejected(rejection: Rejection) -> Self
    {   ValidationResult
        {   valid: false
          , reason: Some(rejection.to_string())
          , rejection: Some(rejection)
        }
    }
}

/// Parsed critique completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CritiqueResult
{   pub improved_code: Option<String>
  , pub improvements: String
}

/// Caller-visible result of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult
{   pub generated_code: String
  , pub improved_code: String
  , pub improvements: String
}

/// Caller-visible failure body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse
{   pub error: String
  , pub status: u16
}

impl From<&crate::error::PipelineError> for ErrorResponse
{   fn from(e: &crate::error::PipelineError) -> Self
    {   ErrorResponse
        {   error: e.to_string()
          , status: e.status_code()
        }
    }
}

//! Configuration for the inference gateway and the guardrail

use std::path::Path;
use serde::{Deserialize, Deserializer, Serialize};
use log::debug;

use crate::error::ConfigError;
use crate::guardrails::{
  DEFAULT_MAX_PROMPT_LENGTH, DEFAULT_MIN_PROMPT_LENGTH
};
use crate::request::{GenerationParameters, ParameterOverrides};

pub const TOKEN_VAR: &str = "HUGGING_FACE_TOKEN";
pub const DEFAULT_API_URL: &str
  = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL_ID: &str
  = "bilalburney/qwen2.5-3b-coder-alpaca";
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Inference endpoint configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig
{   /// Base URL, the model id is appended as a path segment
    pub api_url: String
  , pub model_id: String
  , /// Bearer token
    pub api_token: String
  , /// Request timeout in milliseconds
    pub timeout_ms: u64
  , /// Defaults for every call
    #[serde(deserialize_with = "generation_over_preset")]
    pub generation_params: GenerationParameters
  , /// Overrides used by the critique call
    #[serde(deserialize_with = "critic_over_preset")]
    pub critic_params: GenerationParameters
}

// Partial parameter objects fill their gaps from the matching
// preset, not from the generation defaults.
fn generation_over_preset<'de, D>(de: D)
  -> Result<GenerationParameters, D::Error>
  where D: Deserializer<'de>
{   let overrides = ParameterOverrides::deserialize(de)?;
    Ok(GenerationParameters::generation().merged(&overrides))
}

fn critic_over_preset<'de, D>(de: D)
  -> Result<GenerationParameters, D::Error>
  where D: Deserializer<'de>
{   let overrides = ParameterOverrides::deserialize(de)?;
    Ok(GenerationParameters::critic().merged(&overrides))
}

impl Default for GatewayConfig
{   fn default() -> Self
    {   GatewayConfig
        {   api_url: DEFAULT_API_URL.to_string()
          , model_id: DEFAULT_MODEL_ID.to_string()
          , api_token: String::new()
          , timeout_ms: DEFAULT_TIMEOUT_MS
          , generation_params: GenerationParameters::generation()
          , critic_params: GenerationParameters::critic()
        }
    }
}

// Keeps the token out of debug logs.
impl std::fmt::Debug for GatewayConfig
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.debug_struct("GatewayConfig")
          .field("api_url", &self.api_url)
          .field("model_id", &self.model_id)
          .field("api_token", &"<redacted>")
          .field("timeout_ms", &self.timeout_ms)
          .field("generation_params", &self.generation_params)
          .field("critic_params", &self.critic_params)
          .finish()
    }
}

/// Prompt length bounds, in characters of the trimmed prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailConfig
{   pub min_prompt_length: usize
  , pub max_prompt_length: usize
}

impl Default for GuardrailConfig
{   fn default() -> Self
    {   GuardrailConfig
        {   min_prompt_length: DEFAULT_MIN_PROMPT_LENGTH
          , max_prompt_length: DEFAULT_MAX_PROMPT_LENGTH
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeeConfig
{   pub gateway: GatewayConfig
  , pub guardrail: GuardrailConfig
}

impl CodeeConfig
{   /// Build from process environment and validate
    pub fn from_env() -> Result<Self, ConfigError>
    {   CodeeConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup and validate
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String>
    {   let mut config = CodeeConfig::default();
        config.apply_lookup(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError>
    {   let config = CodeeConfig::read_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON file without validating; an empty token is
    /// taken from the environment
    pub fn read_json_file(path: &Path) -> Result<Self, ConfigError>
    {   debug!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path)
          .map_err(|e| ConfigError::Io(
            format!("{}: {}", path.display(), e)
          ))?;
        let mut config: CodeeConfig = serde_json::from_str(&raw)
          .map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.gateway.api_token.is_empty()
        {   if let Ok(token) = std::env::var(TOKEN_VAR)
            {   config.gateway.api_token = token;
            }
        }
        Ok(config)
    }

    fn apply_lookup<F>(&mut self, lookup: &F)
      -> Result<(), ConfigError>
    where F: Fn(&str) -> Option<String>
    {   if let Some(token) = lookup(TOKEN_VAR)
        {   self.gateway.api_token = token;
        }
        if let Some(url) = lookup("INFERENCE_API")
        {   self.gateway.api_url = url;
        }
        if let Some(model) = lookup("MODEL_ID")
        {   self.gateway.model_id = model;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT")
        {   self.gateway.timeout_ms = parse_number(
              "REQUEST_TIMEOUT", &v
            )?;
        }
        if let Some(v) = lookup("MIN_PROMPT_LENGTH")
        {   self.guardrail.min_prompt_length = parse_number(
              "MIN_PROMPT_LENGTH", &v
            )?;
        }
        if let Some(v) = lookup("MAX_PROMPT_LENGTH")
        {   self.guardrail.max_prompt_length = parse_number(
              "MAX_PROMPT_LENGTH", &v
            )?;
        }
        Ok(())
    }

    /// Check everything a gateway-backed process needs
    pub fn validate(&self) -> Result<(), ConfigError>
    {   if self.gateway.api_token.trim().is_empty()
        {   return Err(ConfigError::MissingApiKey(
              TOKEN_VAR.to_string()
            ));
        }
        self.validate_guardrail()?;
        if self.gateway.api_url.trim().is_empty()
        {   return Err(ConfigError::InvalidValue(
              "api_url is empty".to_string()
            ));
        }
        if self.gateway.model_id.trim().is_empty()
        {   return Err(ConfigError::InvalidValue(
              "model_id is empty".to_string()
            ));
        }
        if self.gateway.timeout_ms == 0
        {   return Err(ConfigError::InvalidValue(
              "timeout_ms must be positive".to_string()
            ));
        }
        Ok(())
    }

    /// Check only the guardrail section; validation-only
    /// processes need no token
    pub fn validate_guardrail(&self) -> Result<(), ConfigError>
    {   let g = &self.guardrail;
        if g.min_prompt_length > g.max_prompt_length
        {   return Err(ConfigError::InvalidValue(format!(
              "min_prompt_length {} exceeds max_prompt_length {}",
              g.min_prompt_length, g.max_prompt_length
            )));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str)
  -> Result<T, ConfigError>
{   value.trim().parse::<T>().map_err(|_| {
      ConfigError::InvalidValue(
        format!("{} is not a number: {}", key, value)
      )
    })
}

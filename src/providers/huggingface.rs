use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;
use log::{debug, trace, error};

use crate::config::GatewayConfig;
use crate::error::{ConfigError, GatewayError};
use crate::request::{
  GenerationParameters, ModelRequest, ModelResponse,
  ParameterOverrides
};
use super::ModelGateway;

// ===== Wire Types =====

#[derive(Debug, Clone, Deserialize)]
struct Completion
{   #[serde(default)]
    generated_text: String
}

/// Translate a raw response body into a domain response.
/// Expects a JSON array whose first element carries
/// `generated_text`.
pub fn parse_completion(body: &str)
  -> Result<ModelResponse, GatewayError>
{   let completions: Vec<Completion> = serde_json::from_str(body)
      .map_err(|e| {
        error!("Undecodable completion body: {}", e);
        GatewayError::MalformedResponse(e.to_string())
      })?;

    completions.into_iter()
      .next()
      .map(|c| ModelResponse { text: c.generated_text })
      .ok_or_else(|| {
        error!("No completions in response");
        GatewayError::MalformedResponse(
          "response contained no completions".to_string()
        )
      })
}

fn map_transport_error(e: reqwest::Error) -> GatewayError
{   if e.is_timeout()
    {   error!("Inference request timed out");
        GatewayError::Timeout
    } else
    {   error!("HTTP error: {}", e);
        GatewayError::Upstream
        {   status: e.status().map(|s| s.as_u16())
          , detail: e.to_string()
        }
    }
}

// ===== Gateway =====

/// Hugging Face style text-generation endpoint
pub struct HuggingFaceGateway
{   url: String
  , api_token: String
  , defaults: GenerationParameters
  , http_client: reqwest::Client
}

impl HuggingFaceGateway
{   pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError>
    {   debug!("Creating HuggingFaceGateway for {}", config.model_id);
        let http_client = reqwest::Client::builder()
          .timeout(Duration::from_millis(config.timeout_ms))
          .build()
          .map_err(|e| ConfigError::InvalidValue(
            format!("HTTP client: {}", e)
          ))?;

        Ok(HuggingFaceGateway
        {   url: format!(
              "{}/{}",
              config.api_url.trim_end_matches('/'),
              config.model_id
            )
          , api_token: config.api_token.clone()
          , defaults: config.generation_params.clone()
          , http_client
        })
    }

    pub fn url(&self) -> &str
    {   &self.url
    }
}

#[async_trait]
impl ModelGateway for HuggingFaceGateway
{   async fn call(
      &self
    , formatted_prompt: &str
    , overrides: &ParameterOverrides
    ) -> Result<ModelResponse, GatewayError>
    {   let request = ModelRequest
        {   inputs: formatted_prompt
          , parameters: self.defaults.merged(overrides)
        };
        trace!("Inference parameters: {:?}", request.parameters);

        let response = self.http_client
          .post(&self.url)
          .bearer_auth(&self.api_token)
          .header("Content-Type", "application/json")
          .json(&request)
          .send()
          .await
          .map_err(map_transport_error)?;

        let status = response.status();
        trace!("Inference response status: {}", status);

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {   error!("Rate limited by inference API");
            return Err(GatewayError::RateLimited);
        }

        let body = response.text().await
          .map_err(map_transport_error)?;

        if !status.is_success()
        {   error!("Inference API error {}: {}", status, body);
            return Err(GatewayError::Upstream
            {   status: Some(status.as_u16())
              , detail: body.trim().to_string()
            });
        }

        trace!("Inference response body: {}", body);
        parse_completion(&body)
    }
}

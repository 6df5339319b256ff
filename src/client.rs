use std::sync::Arc;
use log::{debug, error, info, warn};

use crate::config::CodeeConfig;
use crate::error::{ConfigError, GatewayError, PipelineError};
use crate::guardrails::{Guardrail, GuardrailRules};
use crate::prompts;
use crate::providers::{HuggingFaceGateway, ModelGateway};
use crate::request::{
  CritiqueResult, ParameterOverrides, PipelineResult,
  ValidationResult
};
use crate::utils::{measure_time, truncate_text};

pub const CRITIQUE_SKIPPED: &str
  = "Improvement step skipped due to an error.";

const PREVIEW_CHARS: usize = 80;

/// Generate-then-critique orchestrator.
///
/// Holds only read-only state, so one instance can serve any
/// number of concurrent runs.
pub struct CodeAssistant
{   guardrail: Guardrail
  , gateway: Arc<dyn ModelGateway>
  , critic_overrides: ParameterOverrides
}

impl CodeAssistant
{   pub fn new(
      guardrail: Guardrail
    , gateway: Arc<dyn ModelGateway>
    , critic_overrides: ParameterOverrides
    ) -> Self
    {   CodeAssistant
        {   guardrail
          , gateway
          , critic_overrides
        }
    }

    /// Wire up the default guardrail and the HTTP gateway
    pub fn from_config(config: &CodeeConfig)
      -> Result<Self, ConfigError>
    {   config.validate()?;
        let gateway = HuggingFaceGateway::new(&config.gateway)?;
        debug!("CodeAssistant using {}", gateway.url());
        Ok(CodeAssistant::new(
          Guardrail::new(GuardrailRules::from_config(
            &config.guardrail
          ))
        , Arc::new(gateway)
        , ParameterOverrides::from(&config.gateway.critic_params)
        ))
    }

    pub fn validate_prompt(&self, prompt: &str) -> ValidationResult
    {   self.guardrail.validate(prompt)
    }

    /// Validate, generate, then critique. Fails only at the
    /// validation or generation stage.
    pub async fn run_pipeline(&self, prompt: &str)
      -> Result<PipelineResult, PipelineError>
    {   let prompt = prompt.trim();
        debug!(
          "Validating prompt: {}",
          truncate_text(prompt, PREVIEW_CHARS)
        );
        self.guardrail.check(prompt)
          .map_err(PipelineError::ValidationRejected)?;

        let generated_code = measure_time(
          "generation",
          self.generate_code(prompt)
        ).await
          .map_err(|e| {
            error!("Code generation error: {}", e);
            e
          })?;

        // Best-effort stage: any failure falls back to the
        // unreviewed code.
        let (improved_code, improvements) = match measure_time(
          "critique",
          self.critique_code(&generated_code, prompt)
        ).await
        {   Ok(critique) => (
              critique.improved_code
                .unwrap_or_else(|| generated_code.clone())
            , critique.improvements
            )
          , Err(e) => {
              warn!("Code improvement error: {}", e);
              ( generated_code.clone()
              , CRITIQUE_SKIPPED.to_string()
              )
            }
        };

        info!(
          "Pipeline done: {} chars generated, {} chars improved",
          generated_code.len(),
          improved_code.len()
        );
        Ok(PipelineResult
        {   generated_code
          , improved_code
          , improvements
        })
    }

    async fn generate_code(&self, prompt: &str)
      -> Result<String, PipelineError>
    {   let formatted = prompts::format_generation_prompt(prompt);
        let response = self.gateway
          .call(&formatted, &ParameterOverrides::none())
          .await?;
        let code = prompts::extract_code(&response.text);
        if code.is_empty()
        {   return Err(PipelineError::NoCodeGenerated);
        }
        Ok(code)
    }

    async fn critique_code(&self, code: &str, prompt: &str)
      -> Result<CritiqueResult, GatewayError>
    {   let formatted = prompts::format_critique_prompt(code, prompt);
        let response = self.gateway
          .call(&formatted, &self.critic_overrides)
          .await?;
        Ok(prompts::extract_critique(&response.text))
    }
}

//! Inference gateways

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::request::{ModelResponse, ParameterOverrides};

pub mod huggingface;

// Re-export for convenience
pub use huggingface::HuggingFaceGateway;

/// One-shot text completion against a remote model.
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait ModelGateway: Send + Sync
{   async fn call(
      &self
    , formatted_prompt: &str
    , overrides: &ParameterOverrides
    ) -> Result<ModelResponse, GatewayError>;
}

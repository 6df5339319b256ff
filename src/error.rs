use std::fmt;

use crate::guardrails::Rejection;

/// Failure of a single call to the inference endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError
{   /// Transport timeout, usually a cold-starting model
    Timeout
  , /// Upstream answered 429
    RateLimited
  , /// Response had no decodable first completion
    MalformedResponse(String)
  , /// Any other transport or HTTP failure. `detail` is for
    /// logs only and never reaches the caller.
    Upstream { status: Option<u16>, detail: String }
}

impl GatewayError
{   /// Whether a caller-side retry has a reasonable chance to succeed
    pub fn is_transient(&self) -> bool
    {   match self
        {   GatewayError::Timeout
          | GatewayError::RateLimited => true
          , GatewayError::Upstream { status, .. } => {
              status.map_or(false, |s| s >= 500)
            }
          , GatewayError::MalformedResponse(_) => false
        }
    }
}

impl fmt::Display for GatewayError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   GatewayError::Timeout => {
              write!(f,
                "Request timeout. Model may be loading. \
                 Please try again."
              )
            }
          , GatewayError::RateLimited => {
              write!(f,
                "Rate limited by the inference API. \
                 Please try again later."
              )
            }
          , GatewayError::MalformedResponse(detail) => {
              write!(f,
                "Unexpected response format from the \
                 inference API: {}",
                detail
              )
            }
          , GatewayError::Upstream { status: Some(status), .. } => {
              write!(f,
                "API error: upstream returned status {}",
                status
              )
            }
          , GatewayError::Upstream { status: None, .. } => {
              write!(f,
                "API error: inference endpoint unreachable"
              )
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Failure of a pipeline run. Only validation and generation
/// can fail; critique problems degrade instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError
{   /// Prompt rejected by the guardrail, no model call made
    ValidationRejected(Rejection)
  , /// Generation call failed
    GenerationFailed(GatewayError)
  , /// Generation call succeeded but yielded no code
    NoCodeGenerated
}

impl PipelineError
{   /// HTTP-style status a serving layer should answer with
    pub fn status_code(&self) -> u16
    {   match self
        {   PipelineError::ValidationRejected(_) => 400
          , PipelineError::GenerationFailed(_)
          | PipelineError::NoCodeGenerated => 500
        }
    }

    /// Whether retrying the whole run may help
    pub fn is_transient(&self) -> bool
    {   match self
        {   PipelineError::GenerationFailed(e) => e.is_transient()
          , _ => false
        }
    }
}

impl fmt::Display for PipelineError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   PipelineError::ValidationRejected(rejection) => {
              write!(f, "{}", rejection)
            }
          , PipelineError::GenerationFailed(cause) => {
              write!(f, "{}", cause)
            }
          , PipelineError::NoCodeGenerated => {
              write!(f, "Model did not generate any code")
            }
        }
    }
}

impl std::error::Error for PipelineError
{   fn source(&self)
      -> Option<&(dyn std::error::Error + 'static)>
    {   match self
        {   PipelineError::GenerationFailed(cause) => Some(cause)
          , _ => None
        }
    }
}

impl From<GatewayError> for PipelineError
{   fn from(e: GatewayError) -> Self
    {   PipelineError::GenerationFailed(e)
    }
}

/// Startup configuration problems
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError
{   /// Required auth token is absent
    MissingApiKey(String)
  , /// A value is present but unusable
    InvalidValue(String)
  , /// Config file could not be read
    Io(String)
  , /// Config file could not be parsed
    Parse(String)
}

impl fmt::Display for ConfigError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   ConfigError::MissingApiKey(var) => {
              write!(f,
                "{} environment variable is required",
                var
              )
            }
          , ConfigError::InvalidValue(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , ConfigError::Io(msg) => {
              write!(f, "Failed to read config: {}", msg)
            }
          , ConfigError::Parse(msg) => {
              write!(f, "Failed to parse config: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

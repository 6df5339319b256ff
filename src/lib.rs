//! codee: a guarded generate-then-critique coding assistant in
//! front of a hosted text-generation endpoint.
//!
//! A request flows through four stages, strictly in sequence:
//! the guardrail rejects unsafe or off-topic prompts, the
//! templater wraps the prompt in chat-turn markup, the gateway
//! calls the model, and the orchestrator runs a second critique
//! call whose failure degrades to the unreviewed code.

/*

codee/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports
│   ├── main.rs         # `codee` CLI
│   ├── error.rs        # Gateway, pipeline and config errors
│   ├── config.rs       # Endpoint, token, parameters, bounds
│   ├── guardrails.rs   # Prompt validator
│   ├── prompts.rs      # Chat-turn formatting and extraction
│   ├── providers/      # ModelGateway trait and HTTP gateway
│   ├── request.rs      # Request-scoped value objects
│   ├── client.rs       # CodeAssistant orchestrator
│   ├── failover.rs     # Caller-side retry policy
│   └── utils.rs        # Truncation and timing helpers
└── tests/

*/

pub mod error;
pub mod config;
pub mod guardrails;
pub mod prompts;
pub mod providers;
pub mod request;
pub mod failover;
pub mod client;
pub mod utils;

pub use client::CodeAssistant;
pub use config::CodeeConfig;
pub use error::{ConfigError, GatewayError, PipelineError};
pub use guardrails::{validate_prompt, Guardrail, Rejection};
pub use providers::ModelGateway;
pub use request::{PipelineResult, ValidationResult};

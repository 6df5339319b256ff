use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, error};
use serde::Serialize;

use codee::config::CodeeConfig;
use codee::failover::RetryPolicy;
use codee::guardrails::{Guardrail, GuardrailRules};
use codee::request::ErrorResponse;
use codee::{CodeAssistant, ConfigError, PipelineError};

#[derive(Parser)]
#[command(name = "codee", version, about = "Guarded code generation with a critique pass")]
struct Cli
{   #[command(subcommand)]
    command: Command
}

#[derive(Subcommand)]
enum Command
{   /// Check a prompt against the guardrail, no model call
    Validate
    {   prompt: String
      , /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>
    }
  , /// Generate code and a reviewed version of it
    Generate
    {   prompt: String
      , /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>
      , /// Attempts for transient generation failures
        #[arg(long, default_value_t = 1)]
        attempts: usize
      , /// Delay between attempts in milliseconds
        #[arg(long, default_value_t = 1000)]
        retry_delay_ms: u64
    }
}

fn print_json<T: Serialize>(value: &T)
{   match serde_json::to_string_pretty(value)
    {   Ok(s) => println!("{}", s)
      , Err(e) => error!("Failed to serialize output: {}", e)
    }
}

fn config_error(e: ConfigError) -> ExitCode
{   error!("{}", e);
    print_json(&ErrorResponse
    {   error: e.to_string()
      , status: 500
    });
    ExitCode::FAILURE
}

fn validate(prompt: &str, config: Option<PathBuf>) -> ExitCode
{   let config = match config
    {   Some(path) => CodeeConfig::read_json_file(&path)
          .and_then(|c| c.validate_guardrail().map(|_| c))
      , None => Ok(CodeeConfig::default())
    };
    let config = match config
    {   Ok(c) => c
      , Err(e) => return config_error(e)
    };

    let guardrail = Guardrail::new(
      GuardrailRules::from_config(&config.guardrail)
    );
    let result = guardrail.validate(prompt);
    print_json(&result);
    if result.valid { ExitCode::SUCCESS } else { ExitCode::from(2) }
}

async fn generate(
  prompt: &str
, config: Option<PathBuf>
, retry: RetryPolicy
) -> ExitCode
{   let config = match config
    {   Some(path) => CodeeConfig::from_json_file(&path)
      , None => CodeeConfig::from_env()
    };
    let assistant = match config
      .and_then(|c| CodeAssistant::from_config(&c))
    {   Ok(a) => a
      , Err(e) => return config_error(e)
    };
    debug!("Running pipeline with {:?}", retry);

    let outcome = retry.run_if(
      || assistant.run_pipeline(prompt),
      |e: &PipelineError| e.is_transient()
    ).await;

    match outcome
    {   Ok(result) => {
          print_json(&result);
          ExitCode::SUCCESS
        }
      , Err(e) => {
          error!("Pipeline failed: {}", e);
          print_json(&ErrorResponse::from(&e));
          ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode
{   env_logger::Builder::from_env(
      env_logger::Env::default()
        .filter_or("LOG_LEVEL", "info")
    )
      .parse_env("RUST_LOG")
      .init();

    match Cli::parse().command
    {   Command::Validate { prompt, config } => {
          validate(&prompt, config)
        }
      , Command::Generate {
          prompt, config, attempts, retry_delay_ms
        } => {
          generate(
            &prompt,
            config,
            RetryPolicy::new(attempts, retry_delay_ms)
          ).await
        }
    }
}

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_test::{assert_err, assert_ok};

use codee::client::{CodeAssistant, CRITIQUE_SKIPPED};
use codee::error::{GatewayError, PipelineError};
use codee::guardrails::{Guardrail, Rejection};
use codee::prompts::DEFAULT_IMPROVEMENTS;
use codee::providers::ModelGateway;
use codee::request::{
  GenerationParameters, ModelResponse, ParameterOverrides
};

type Reply = Result<ModelResponse, GatewayError>;

/// Gateway answering from a fixed script and recording calls
struct ScriptedGateway
{   replies: Mutex<VecDeque<Reply>>
  , calls: Mutex<Vec<(String, ParameterOverrides)>>
}

impl ScriptedGateway
{   fn new(replies: Vec<Reply>) -> Arc<Self>
    {   Arc::new(ScriptedGateway
        {   replies: Mutex::new(replies.into())
          , calls: Mutex::new(vec![])
        })
    }

    fn calls(&self) -> Vec<(String, ParameterOverrides)>
    {   self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway
{   async fn call(
      &self
    , formatted_prompt: &str
    , overrides: &ParameterOverrides
    ) -> Result<ModelResponse, GatewayError>
    {   self.calls.lock().unwrap()
          .push((formatted_prompt.to_string(), overrides.clone()));
        self.replies.lock().unwrap()
          .pop_front()
          .unwrap_or_else(|| Err(GatewayError::Upstream
          {   status: None
            , detail: "script exhausted".to_string()
          }))
    }
}

fn text(s: &str) -> Reply
{   Ok(ModelResponse { text: s.to_string() })
}

fn assistant(gateway: Arc<ScriptedGateway>) -> CodeAssistant
{   CodeAssistant::new(
      Guardrail::default()
    , gateway
    , ParameterOverrides::from(&GenerationParameters::critic())
    )
}

const PROMPT: &str = "write a function to add numbers in Python";

#[tokio::test]
async fn test_full_pipeline()
{   let gateway = ScriptedGateway::new(vec![
      text("```python\ndef add(a, b): return a+b\n```")
    , text("Added spacing.\n```python\ndef add(a, b):\n    return a + b\n```")
    ]);
    let result = assert_ok!(
      assistant(gateway.clone()).run_pipeline(PROMPT).await
    );

    assert_eq!(result.generated_code, "def add(a, b): return a+b");
    assert_eq!(
      result.improved_code,
      "def add(a, b):\n    return a + b"
    );
    assert_eq!(result.improvements, "Added spacing.");

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].0.contains(PROMPT));
    assert_eq!(calls[0].1, ParameterOverrides::none());
    assert!(calls[1].0.contains("def add(a, b): return a+b"));
    assert!(calls[1].0.contains(&format!("Original request: {}", PROMPT)));
    assert_eq!(calls[1].1.max_new_tokens, Some(600));
    assert_eq!(calls[1].1.temperature, Some(0.5));
}

#[tokio::test]
async fn test_rejection_makes_no_model_call()
{   let gateway = ScriptedGateway::new(vec![]);
    let err = assert_err!(
      assistant(gateway.clone())
        .run_pipeline("write a poem about love")
        .await
    );
    assert_eq!(
      err,
      PipelineError::ValidationRejected(Rejection::NonCodingContent)
    );
    assert_eq!(err.status_code(), 400);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_generation_failure_is_fatal()
{   let gateway = ScriptedGateway::new(vec![
      Err(GatewayError::Timeout)
    ]);
    let err = assert_err!(
      assistant(gateway.clone()).run_pipeline(PROMPT).await
    );
    assert_eq!(err, PipelineError::GenerationFailed(GatewayError::Timeout));
    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("Model may be loading"));
    assert_eq!(gateway.calls().len(), 1);
}

#[tokio::test]
async fn test_empty_generation_is_fatal()
{   let gateway = ScriptedGateway::new(vec![
      text("<|im_start|>assistant\n   <|im_end|>")
    ]);
    let err = assert_err!(
      assistant(gateway.clone()).run_pipeline(PROMPT).await
    );
    assert_eq!(err, PipelineError::NoCodeGenerated);
    assert_eq!(err.to_string(), "Model did not generate any code");
    assert_eq!(gateway.calls().len(), 1);
}

#[tokio::test]
async fn test_critique_failure_degrades()
{   let gateway = ScriptedGateway::new(vec![
      text("```js\nconst x = 1;\n```")
    , Err(GatewayError::RateLimited)
    ]);
    let result = assert_ok!(
      assistant(gateway).run_pipeline(PROMPT).await
    );
    assert_eq!(result.generated_code, "const x = 1;");
    assert_eq!(result.improved_code, result.generated_code);
    assert_eq!(result.improvements, CRITIQUE_SKIPPED);
}

#[tokio::test]
async fn test_critique_without_code_keeps_generated()
{   let gateway = ScriptedGateway::new(vec![
      text("```js\nconst x = 1;\n```")
    , text("Looks good as is.")
    ]);
    let result = assert_ok!(
      assistant(gateway).run_pipeline(PROMPT).await
    );
    assert_eq!(result.improved_code, "const x = 1;");
    assert_eq!(result.improvements, "Looks good as is.");
}

#[tokio::test]
async fn test_empty_critique_uses_default_summary()
{   let gateway = ScriptedGateway::new(vec![
      text("const x = 1;")
    , text("")
    ]);
    let result = assert_ok!(
      assistant(gateway).run_pipeline(PROMPT).await
    );
    assert_eq!(result.generated_code, "const x = 1;");
    assert_eq!(result.improved_code, "const x = 1;");
    assert_eq!(result.improvements, DEFAULT_IMPROVEMENTS);
}

#[tokio::test]
async fn test_prompt_is_trimmed_before_use()
{   let gateway = ScriptedGateway::new(vec![
      text("x = 1")
    , text("ok")
    ]);
    let padded = format!("   {}  \n", PROMPT);
    assert_ok!(assistant(gateway.clone()).run_pipeline(&padded).await);
    let calls = gateway.calls();
    assert!(calls[0].0.contains(&format!("user\n{}\n", PROMPT)));
}

#[tokio::test]
async fn test_concurrent_runs_share_assistant()
{   let gateway = ScriptedGateway::new(vec![
      text("a = 1"), text("ok"), text("b = 2"), text("ok")
    ]);
    let assistant = Arc::new(assistant(gateway.clone()));
    let (a, b) = tokio::join!(
      assistant.run_pipeline(PROMPT),
      assistant.run_pipeline(PROMPT)
    );
    assert_ok!(a);
    assert_ok!(b);
    assert_eq!(gateway.calls().len(), 4);
}

#[test]
fn test_validate_prompt_passthrough()
{   let a = assistant(ScriptedGateway::new(vec![]));
    assert!(a.validate_prompt(PROMPT).valid);
    assert!(!a.validate_prompt("   ").valid);
}

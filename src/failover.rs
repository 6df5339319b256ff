//! Caller-side retry with a fixed delay between attempts

use std::future::Future;
use std::time::Duration;
use log::{debug, warn};

/// Retry policy for failed runs. Never invoked inside the
/// pipeline itself.
#[derive(Debug, Clone)]
pub struct RetryPolicy
{   pub max_attempts: usize
  , pub delay: Duration
}

impl RetryPolicy
{   /// Create a new retry policy; at least one attempt is made
    pub fn new(max_attempts: usize, delay_ms: u64) -> Self
    {   RetryPolicy
        {   max_attempts: max_attempts.max(1)
          , delay: Duration::from_millis(delay_ms)
        }
    }

    /// Run `f` until it succeeds or attempts run out
    pub async fn run<T, E, F, Fut>(&self, f: F) -> Result<T, E>
    where F: FnMut() -> Fut
        , Fut: Future<Output = Result<T, E>>
        , E: std::fmt::Display
    {   self.run_if(f, |_| true).await
    }

    /// Like [`RetryPolicy::run`], but gives up immediately on
    /// errors `should_retry` declines. Returns the last error.
    pub async fn run_if<T, E, F, Fut, P>(
      &self
    , mut f: F
    , should_retry: P
    ) -> Result<T, E>
    where F: FnMut() -> Fut
        , Fut: Future<Output = Result<T, E>>
        , P: Fn(&E) -> bool
        , E: std::fmt::Display
    {   let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop
        {   debug!("Attempt {}/{}", attempt, attempts);
            match f().await
            {   Ok(value) => return Ok(value)
              , Err(e) => {
                  if attempt >= attempts || !should_retry(&e)
                  {   return Err(e);
                  }
                  warn!(
                    "Retry {}/{} after {}ms: {}",
                    attempt,
                    attempts - 1,
                    self.delay.as_millis(),
                    e
                  );
                  tokio::time::sleep(self.delay).await;
                  attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(3, 1000)
    }
}

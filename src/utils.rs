//! Small helpers shared by the pipeline and the CLI

use std::future::Future;
use std::time::Instant;
use log::{debug, warn};

/// Shorten `text` to at most `max_chars` characters, ending in
/// `...` when cut
pub fn truncate_text(text: &str, max_chars: usize) -> String
{   if text.chars().count() <= max_chars
    {   return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Await `fut`, logging how long it took and whether it failed
pub async fn measure_time<T, E, Fut>(label: &str, fut: Fut)
  -> Result<T, E>
where Fut: Future<Output = Result<T, E>>
    , E: std::fmt::Display
{   let start = Instant::now();
    let result = fut.await;
    let elapsed = start.elapsed().as_millis();
    match &result
    {   Ok(_) => debug!("{} completed in {}ms", label, elapsed)
      , Err(e) => warn!("{} failed after {}ms: {}", label, elapsed, e)
    }
    result
}

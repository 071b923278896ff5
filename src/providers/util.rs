use anyhow::Error;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries an async request on transport errors.
///
/// Runs `operation` once plus up to `retries` more times, sleeping `delay_ms`
/// between attempts, and returns the last error if every attempt fails.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err.into());
                }
                debug!(attempt, retries, error = %err, "Request failed, retrying");
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

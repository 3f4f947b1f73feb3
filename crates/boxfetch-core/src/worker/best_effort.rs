//! Attempt-and-log for steps whose failure must not affect the job.

use std::future::Future;

use crate::job_store::JobId;

/// Awaits `step`; an error is logged at `warn` and swallowed.
pub(crate) async fn attempt<T, E, F>(job_id: JobId, what: &str, step: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<anyhow::Error>,
{
    match step.await {
        Ok(value) => Some(value),
        Err(e) => {
            let e: anyhow::Error = e.into();
            tracing::warn!(job_id, "{what} failed: {e:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_values_and_swallows_errors() {
        let ok = attempt(1, "step", async { Ok::<_, std::io::Error>(7) }).await;
        assert_eq!(ok, Some(7));

        let failed = attempt(1, "step", async {
            Err::<u8, _>(anyhow::anyhow!("scanner offline"))
        })
        .await;
        assert_eq!(failed, None);
    }
}

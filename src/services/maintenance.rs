use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::core::time::{minutes_ago, primitive_now_utc};
use crate::repositories;

pub(crate) const STALE_SUBMISSION_MESSAGE: &str =
    "Assessment was interrupted before it finished, please resubmit";

/// Fails submissions stuck in `pending` or `in_progress` past the configured
/// age. Run once at startup, before the listener accepts requests.
pub(crate) async fn fail_stale_submissions(state: &AppState) -> Result<usize> {
    let minutes = state.settings().assessment().stale_submission_minutes;
    let now = primitive_now_utc();

    let failed = repositories::submissions::fail_stale(
        state.db(),
        minutes_ago(now, minutes),
        STALE_SUBMISSION_MESSAGE,
        now,
    )
    .await
    .context("Failed to fail stale submissions")?;

    if !failed.is_empty() {
        tracing::warn!(
            failed_submissions = failed.len(),
            older_than_minutes = minutes,
            "Failed stale submissions"
        );
    }
    metrics::counter!("stale_submissions_failed_total").increment(failed.len() as u64);

    Ok(failed.len())
}

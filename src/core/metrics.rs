use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;
use crate::db::types::{AnalysisStatus, SubmissionType};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_assessment(
    submission_type: SubmissionType,
    status: AnalysisStatus,
    elapsed: Duration,
) {
    metrics::counter!(
        "assessments_total",
        "type" => submission_type.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
    metrics::histogram!("assessment_duration_seconds", "type" => submission_type.as_str())
        .record(elapsed.as_secs_f64());
}

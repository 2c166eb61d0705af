use chrono::NaiveDate;
use deepcx::surveys::{MemorySurveyStore, SurveyService, SurveyServiceError, SurveySettings};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Service over a fresh in-memory store with the system attribute catalogue loaded.
pub(crate) fn in_memory_service(
    settings: SurveySettings,
) -> Result<SurveyService<MemorySurveyStore>, SurveyServiceError> {
    let service = SurveyService::new(Arc::new(MemorySurveyStore::default()), settings);
    service.seed_system_attributes()?;
    Ok(service)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

//! Classification of individual scores and aggregate satisfaction metrics.
//!
//! Everything here is pure and synchronous; callers can share it across
//! request handlers without coordination.

mod classify;
mod metrics;

pub use classify::{classify, classify_stored, CsatLevel, NpsCategory, ScoreClass, ScoreState};
pub use metrics::{
    attribute_averages, csat_average, nps_score, satisfaction_rate, summarize,
    AttributeAverage, NpsBreakdown, SurveyMetrics, SATISFIED_THRESHOLD,
};

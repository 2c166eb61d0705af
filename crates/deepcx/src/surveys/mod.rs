//! Survey lifecycle: administrators define surveys and distribution
//! instances, respondents submit scored feedback, and managers read
//! aggregate satisfaction metrics.

pub mod definition;
pub mod domain;
pub mod import;
pub(crate) mod intake;
pub mod memory;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
mod settings;
pub mod validation;

#[cfg(test)]
mod tests;

pub use definition::{CreateSurveyRequest, SurveyDefinition, SurveyDraft};
pub use domain::{
    Attribute, AttributeId, Branding, CampaignType, DateRange, InstanceId, RatingLevel,
    RequestMetadata, Response, ResponseId, ResponseSubmission, Survey, SurveyAttribute,
    SurveyId, SurveyInstance, SurveyMethod, SurveyStatus,
};
pub use import::{ImportError, ImportedResponses, ResponseCsvImporter};
pub use memory::MemorySurveyStore;
pub use repository::{StoreError, SurveyStore};
pub use router::survey_router;
pub use scoring::{classify, ScoreClass, SurveyMetrics};
pub use service::{
    CreatedSurvey, InstanceDraft, PublicSurvey, SubmissionReceipt, SurveyService,
    SurveyServiceError,
};
pub use settings::SurveySettings;
pub use validation::ValidationError;

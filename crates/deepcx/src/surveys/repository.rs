use super::domain::{
    Attribute, AttributeRatingRecord, DateRange, InstanceId, NewAttribute, NewAttributeRating,
    NewResponse, NewSurvey, NewSurveyAttribute, NewSurveyInstance, Response, Survey,
    SurveyAttribute, SurveyId, SurveyInstance, SurveyStatus,
};

/// Persistence collaborator. Implementations assign ids and timestamps.
///
/// The service only relies on single-row atomicity; no multi-statement
/// transaction is assumed.
pub trait SurveyStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the survey code is taken.
    fn insert_survey(&self, survey: NewSurvey) -> Result<Survey, StoreError>;
    fn update_survey(&self, survey: Survey) -> Result<Survey, StoreError>;
    /// Fails with [`StoreError::Conflict`] when the instance code is taken.
    fn insert_instance(&self, instance: NewSurveyInstance) -> Result<SurveyInstance, StoreError>;
    fn insert_attribute(&self, attribute: NewAttribute) -> Result<Attribute, StoreError>;
    fn insert_survey_attribute(
        &self,
        binding: NewSurveyAttribute,
    ) -> Result<SurveyAttribute, StoreError>;
    fn insert_response(&self, response: NewResponse) -> Result<Response, StoreError>;
    fn insert_attribute_ratings(
        &self,
        ratings: Vec<NewAttributeRating>,
    ) -> Result<Vec<AttributeRatingRecord>, StoreError>;

    fn survey_by_id(&self, id: &SurveyId) -> Result<Option<Survey>, StoreError>;
    /// Surveys newest first, optionally limited to one status.
    fn surveys(&self, status: Option<SurveyStatus>) -> Result<Vec<Survey>, StoreError>;
    fn survey_by_code(
        &self,
        code: &str,
        status: SurveyStatus,
    ) -> Result<Option<Survey>, StoreError>;
    fn instance_by_id(&self, id: &InstanceId) -> Result<Option<SurveyInstance>, StoreError>;
    fn instance_by_code(
        &self,
        survey_id: &SurveyId,
        code: &str,
    ) -> Result<Option<SurveyInstance>, StoreError>;
    /// Organization attributes plus the system catalogue.
    fn attributes(&self, organization_id: Option<&str>) -> Result<Vec<Attribute>, StoreError>;
    /// Bound attributes ordered by position.
    fn survey_attributes(&self, survey_id: &SurveyId) -> Result<Vec<SurveyAttribute>, StoreError>;
    /// Responses ordered by creation time.
    fn responses(
        &self,
        survey_id: &SurveyId,
        range: Option<&DateRange>,
    ) -> Result<Vec<Response>, StoreError>;
    /// Ratings whose parent response falls in the range.
    fn attribute_ratings(
        &self,
        survey_id: &SurveyId,
        range: Option<&DateRange>,
    ) -> Result<Vec<AttributeRatingRecord>, StoreError>;
    fn response_count(&self, survey_id: &SurveyId) -> Result<usize, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

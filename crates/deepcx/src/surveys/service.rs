use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::definition::{contrast_text_color, generate_code, is_well_formed_code, SurveyDraft};
use super::domain::{
    Attribute, CampaignType, DateRange, NewAttribute, NewAttributeRating, NewSurvey,
    NewSurveyAttribute, NewSurveyInstance, RequestMetadata, ResponseId, ResponseSubmission,
    StoreId, Survey, SurveyAttribute, SurveyId, SurveyInstance, SurveyMethod, SurveyStatus,
    SYSTEM_ATTRIBUTES,
};
use super::intake::ResponseGuard;
use super::repository::{StoreError, SurveyStore};
use super::scoring::{classify, summarize, ScoreClass, SurveyMetrics};
use super::settings::SurveySettings;
use super::validation::ValidationError;

/// Input scale of the stand-alone NPS and CSAT classifier.
const CLASSIFY_INPUT_SCALE: RangeInclusive<u8> = 0..=10;

/// Facade composing the store, definition model, intake guard, and metrics engine.
pub struct SurveyService<S> {
    store: Arc<S>,
    settings: SurveySettings,
}

impl<S> SurveyService<S>
where
    S: SurveyStore + 'static,
{
    pub fn new(store: Arc<S>, settings: SurveySettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &SurveySettings {
        &self.settings
    }

    /// Insert any system attribute that is not stored yet; returns the full catalogue.
    pub fn seed_system_attributes(&self) -> Result<Vec<Attribute>, SurveyServiceError> {
        let existing = self.read("attributes", |store| store.attributes(None))?;
        for (code, label) in SYSTEM_ATTRIBUTES {
            if existing
                .iter()
                .any(|attribute| attribute.is_system && attribute.code == code)
            {
                continue;
            }
            match self.store.insert_attribute(NewAttribute {
                organization_id: None,
                code: code.to_string(),
                label: label.to_string(),
                is_system: true,
            }) {
                Ok(_) | Err(StoreError::Conflict) => {}
                Err(other) => return Err(SurveyServiceError::Persistence(other)),
            }
        }
        Ok(self.read("attributes", |store| store.attributes(None))?)
    }

    /// Attributes an administrator can bind: the system catalogue plus the organization's own.
    pub fn attribute_catalogue(
        &self,
        organization_id: Option<&str>,
    ) -> Result<Vec<Attribute>, SurveyServiceError> {
        Ok(self.read("attributes", |store| store.attributes(organization_id))?)
    }

    /// Add an organization-scoped attribute next to the system catalogue.
    pub fn create_attribute(
        &self,
        organization_id: &str,
        code: &str,
        label: &str,
    ) -> Result<Attribute, SurveyServiceError> {
        let organization_id = organization_id.trim();
        let code = code
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        let label = label.trim();
        if organization_id.is_empty() || code.is_empty() || label.is_empty() {
            return Err(ValidationError::IncompleteAttribute.into());
        }

        let attribute = match self.store.insert_attribute(NewAttribute {
            organization_id: Some(organization_id.to_string()),
            code: code.clone(),
            label: label.to_string(),
            is_system: false,
        }) {
            Ok(attribute) => attribute,
            Err(StoreError::Conflict) => {
                return Err(ValidationError::DuplicateAttribute(code).into())
            }
            Err(other) => return Err(SurveyServiceError::Persistence(other)),
        };

        info!(
            organization_id,
            attribute_id = %attribute.id,
            code = %attribute.code,
            "custom attribute created"
        );
        Ok(attribute)
    }

    /// Surveys newest first, narrowed by status and a case-insensitive title or code search.
    pub fn list_surveys(
        &self,
        status: Option<SurveyStatus>,
        search: Option<&str>,
    ) -> Result<Vec<Survey>, SurveyServiceError> {
        let surveys = self.read("surveys", |store| store.surveys(status))?;
        let needle = search
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());
        let Some(needle) = needle else {
            return Ok(surveys);
        };
        Ok(surveys
            .into_iter()
            .filter(|survey| {
                survey.title.to_lowercase().contains(&needle)
                    || survey.survey_code.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Validate the draft, allocate a survey code, and persist survey plus attribute bindings.
    pub fn create_survey(
        &self,
        draft: &SurveyDraft,
        created_by: Option<String>,
    ) -> Result<CreatedSurvey, SurveyServiceError> {
        let definition = draft.finalize(&self.settings.primary_color)?;

        let organization_id = draft.organization_id.as_deref();
        let known = self.read("attributes", |store| store.attributes(organization_id))?;
        if let Some(unknown) = definition
            .attributes
            .iter()
            .find(|choice| !known.iter().any(|attribute| attribute.id == choice.attribute_id))
        {
            return Err(ValidationError::UnknownAttribute(unknown.attribute_id.clone()).into());
        }

        let template = NewSurvey {
            survey_code: String::new(),
            title: definition.title,
            method: definition.method,
            main_question: definition.main_question,
            comment_label: definition.comment_label,
            branding: definition.branding,
            status: SurveyStatus::Draft,
            created_by,
        };
        let survey = self.allocate("survey", self.settings.survey_code_prefix, |code| {
            self.store.insert_survey(NewSurvey {
                survey_code: code,
                ..template.clone()
            })
        })?;

        let mut attributes = Vec::with_capacity(definition.attributes.len());
        for (position, choice) in definition.attributes.into_iter().enumerate() {
            match self.store.insert_survey_attribute(NewSurveyAttribute {
                survey_id: survey.id.clone(),
                attribute_id: choice.attribute_id,
                position: position as u8,
                is_required: choice.required,
            }) {
                Ok(binding) => attributes.push(binding),
                Err(err) => {
                    self.abandon(&survey, &err);
                    return Err(SurveyServiceError::Persistence(err));
                }
            }
        }

        info!(
            survey_id = %survey.id,
            survey_code = %survey.survey_code,
            method = %survey.method,
            attributes = attributes.len(),
            "survey created"
        );
        Ok(CreatedSurvey { survey, attributes })
    }

    /// Attach a new distribution channel to an existing survey.
    pub fn create_instance(
        &self,
        survey_id: &SurveyId,
        draft: InstanceDraft,
    ) -> Result<SurveyInstance, SurveyServiceError> {
        let survey = self.require_survey(survey_id)?;

        let template = NewSurveyInstance {
            survey_id: survey.id.clone(),
            instance_code: String::new(),
            store_id: draft.store_id,
            name: draft
                .name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            campaign_type: draft.campaign_type,
            qr_location: draft.qr_location,
            is_active: true,
            expires_at: draft.expires_at,
        };
        let instance = self.allocate("instance", self.settings.instance_code_prefix, |code| {
            self.store.insert_instance(NewSurveyInstance {
                instance_code: code,
                ..template.clone()
            })
        })?;

        info!(
            survey_id = %survey.id,
            instance_code = %instance.instance_code,
            "survey instance created"
        );
        Ok(instance)
    }

    /// Move a survey through its lifecycle.
    pub fn set_status(
        &self,
        survey_id: &SurveyId,
        status: SurveyStatus,
    ) -> Result<Survey, SurveyServiceError> {
        let mut survey = self.require_survey(survey_id)?;
        if survey.status == status {
            return Ok(survey);
        }
        survey.status = status;
        let updated = self
            .store
            .update_survey(survey)
            .map_err(SurveyServiceError::Persistence)?;
        info!(survey_id = %updated.id, status = updated.status.label(), "survey status changed");
        Ok(updated)
    }

    /// Change the scoring method; refused once any response is recorded.
    pub fn change_method(
        &self,
        survey_id: &SurveyId,
        method: SurveyMethod,
    ) -> Result<Survey, SurveyServiceError> {
        let mut survey = self.require_survey(survey_id)?;
        if survey.method == method {
            return Ok(survey);
        }

        let recorded = self.read("response_count", |store| store.response_count(survey_id))?;
        if recorded > 0 {
            return Err(SurveyServiceError::MethodLocked { responses: recorded });
        }

        if survey.main_question == survey.method.default_question() {
            survey.main_question = method.default_question().to_string();
        }
        survey.method = method;
        self.store
            .update_survey(survey)
            .map_err(SurveyServiceError::Persistence)
    }

    /// Resolve the respondent page for an active survey and open instance.
    ///
    /// Every miss reports the same not-found error so codes cannot be probed.
    pub fn load_public_survey(
        &self,
        survey_code: &str,
        instance_code: &str,
    ) -> Result<PublicSurvey, SurveyServiceError> {
        if !is_well_formed_code(survey_code) || !is_well_formed_code(instance_code) {
            return Err(SurveyServiceError::NotFound);
        }

        let survey = self
            .read("survey_by_code", |store| {
                store.survey_by_code(survey_code, SurveyStatus::Active)
            })?
            .ok_or(SurveyServiceError::NotFound)?;

        let instance = self
            .read("instance_by_code", |store| {
                store.instance_by_code(&survey.id, instance_code)
            })?
            .filter(|instance| instance.is_open_at(Utc::now()))
            .ok_or(SurveyServiceError::NotFound)?;

        let attributes = self.read("survey_attributes", |store| {
            store.survey_attributes(&survey.id)
        })?;

        let range = survey.method.score_range();
        Ok(PublicSurvey {
            text_color: contrast_text_color(&survey.branding.primary_color).to_string(),
            min_score: *range.start(),
            max_score: *range.end(),
            survey,
            instance,
            attributes,
        })
    }

    /// Validate and persist one respondent submission.
    ///
    /// Nothing is written unless validation passes. A failure writing the
    /// attribute ratings after the main row succeeded is logged and tolerated.
    pub fn submit_response(
        &self,
        submission: ResponseSubmission,
        metadata: RequestMetadata,
    ) -> Result<SubmissionReceipt, SurveyServiceError> {
        let survey = self
            .read("survey_by_id", |store| store.survey_by_id(&submission.survey_id))?
            .filter(|survey| survey.status == SurveyStatus::Active)
            .ok_or(SurveyServiceError::NotFound)?;

        let instance = match &submission.instance_id {
            Some(instance_id) => Some(
                self.read("instance_by_id", |store| store.instance_by_id(instance_id))?
                    .filter(|instance| {
                        instance.survey_id == survey.id && instance.is_open_at(Utc::now())
                    })
                    .ok_or(SurveyServiceError::NotFound)?,
            ),
            None => None,
        };

        let attributes = self.read("survey_attributes", |store| {
            store.survey_attributes(&survey.id)
        })?;

        let admitted =
            ResponseGuard::new(&survey, &attributes).admit(submission, instance.as_ref(), metadata)?;

        let response = self
            .store
            .insert_response(admitted.response)
            .map_err(SurveyServiceError::Persistence)?;

        let mut ratings_recorded = true;
        if !admitted.ratings.is_empty() {
            let rows = admitted
                .ratings
                .iter()
                .map(|(attribute_id, rating)| NewAttributeRating {
                    response_id: response.id.clone(),
                    attribute_id: attribute_id.clone(),
                    rating: *rating,
                })
                .collect();
            if let Err(err) = self.store.insert_attribute_ratings(rows) {
                ratings_recorded = false;
                warn!(
                    survey_id = %survey.id,
                    response_id = %response.id,
                    error = %err,
                    "attribute ratings not saved; response kept"
                );
            }
        }

        info!(
            survey_id = %survey.id,
            response_id = %response.id,
            bucket = %admitted.class.label(),
            "response recorded"
        );

        Ok(SubmissionReceipt {
            response_id: response.id,
            label: admitted.class.label(),
            classification: admitted.class,
            ratings_recorded,
        })
    }

    /// Aggregate metrics over the survey's responses, optionally restricted to a date window.
    pub fn compute_metrics(
        &self,
        survey_id: &SurveyId,
        range: Option<DateRange>,
    ) -> Result<SurveyMetrics, SurveyServiceError> {
        let survey = self.require_survey(survey_id)?;
        let responses = self.read("responses", |store| {
            store.responses(&survey.id, range.as_ref())
        })?;
        let ratings = self.read("attribute_ratings", |store| {
            store.attribute_ratings(&survey.id, range.as_ref())
        })?;

        let scores: Vec<u8> = responses.iter().map(|response| response.main_score).collect();
        let pairs: Vec<_> = ratings
            .into_iter()
            .map(|record| (record.attribute_id, record.rating))
            .collect();

        Ok(summarize(survey.id, survey.method, &scores, &pairs))
    }

    /// Classify a stand-alone score: 0-10 for NPS and CSAT, 1-5 for stars.
    pub fn classify(&self, method: SurveyMethod, score: i64) -> Result<ScoreClass, ValidationError> {
        let range = match method {
            SurveyMethod::Nps | SurveyMethod::Csat => CLASSIFY_INPUT_SCALE,
            SurveyMethod::Stars => method.score_range(),
        };
        match u8::try_from(score) {
            Ok(value) if range.contains(&value) => Ok(classify(method, value)),
            _ => Err(ValidationError::ScoreOutOfRange {
                method,
                score,
                min: *range.start(),
                max: *range.end(),
            }),
        }
    }

    // Half-bound surveys are archived so they cannot be published.
    fn abandon(&self, survey: &Survey, cause: &StoreError) {
        let archived = self
            .store
            .update_survey(Survey {
                status: SurveyStatus::Archived,
                ..survey.clone()
            })
            .is_ok();
        warn!(
            survey_id = %survey.id,
            error = %cause,
            archived,
            "attribute binding failed; survey row left behind"
        );
    }

    fn require_survey(&self, survey_id: &SurveyId) -> Result<Survey, SurveyServiceError> {
        self.read("survey_by_id", |store| store.survey_by_id(survey_id))?
            .ok_or(SurveyServiceError::NotFound)
    }

    // Reads are idempotent, so one transparent retry covers a blip.
    fn read<T>(
        &self,
        operation: &'static str,
        query: impl Fn(&S) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match query(self.store.as_ref()) {
            Err(StoreError::Unavailable(reason)) => {
                warn!(operation, %reason, "store read failed; retrying once");
                query(self.store.as_ref())
            }
            other => other,
        }
    }

    fn allocate<T>(
        &self,
        kind: &'static str,
        prefix: char,
        mut insert: impl FnMut(String) -> Result<T, StoreError>,
    ) -> Result<T, SurveyServiceError> {
        let attempts = self.settings.code_retries.max(1);
        for attempt in 1..=attempts {
            let code = generate_code(prefix);
            match insert(code.clone()) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::Conflict) => {
                    warn!(kind, %code, attempt, "code already taken; regenerating");
                }
                Err(other) => return Err(SurveyServiceError::Persistence(other)),
            }
        }
        Err(SurveyServiceError::CodeSpaceExhausted { kind, attempts })
    }
}

/// Admin payload for a new distribution channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub store_id: Option<StoreId>,
    #[serde(default)]
    pub campaign_type: CampaignType,
    #[serde(default)]
    pub qr_location: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Survey row plus the attributes bound during creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedSurvey {
    pub survey: Survey,
    pub attributes: Vec<SurveyAttribute>,
}

/// Everything the respondent page needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicSurvey {
    pub survey: Survey,
    pub instance: SurveyInstance,
    pub attributes: Vec<SurveyAttribute>,
    pub text_color: String,
    pub min_score: u8,
    pub max_score: u8,
}

/// Acknowledgement returned to the respondent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub response_id: ResponseId,
    pub classification: ScoreClass,
    pub label: String,
    pub ratings_recorded: bool,
}

/// Error raised by the survey service.
#[derive(Debug, thiserror::Error)]
pub enum SurveyServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("survey not found")]
    NotFound,
    #[error("survey method is locked after {responses} response(s)")]
    MethodLocked { responses: usize },
    #[error("no free {kind} code after {attempts} attempt(s)")]
    CodeSpaceExhausted { kind: &'static str, attempts: u8 },
    #[error("persistence failure: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for SurveyServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => SurveyServiceError::NotFound,
            other => SurveyServiceError::Persistence(other),
        }
    }
}

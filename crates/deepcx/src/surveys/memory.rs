use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{
    Attribute, AttributeId, AttributeRatingRecord, DateRange, InstanceId, NewAttribute,
    NewAttributeRating, NewResponse, NewSurvey, NewSurveyAttribute, NewSurveyInstance, Response,
    ResponseId, Survey, SurveyAttribute, SurveyId, SurveyInstance, SurveyStatus,
};
use super::repository::{StoreError, SurveyStore};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Process-local [`SurveyStore`] used by the demo server and tests.
#[derive(Clone)]
pub struct MemorySurveyStore {
    state: Arc<Mutex<MemoryState>>,
    clock: Clock,
}

#[derive(Default)]
struct MemoryState {
    surveys: Vec<Survey>,
    instances: Vec<SurveyInstance>,
    attributes: Vec<Attribute>,
    bindings: Vec<NewSurveyAttribute>,
    responses: Vec<Response>,
    ratings: Vec<AttributeRatingRecord>,
}

impl Default for MemorySurveyStore {
    fn default() -> Self {
        Self::with_clock(Utc::now)
    }
}

impl MemorySurveyStore {
    /// Store whose timestamps come from `clock`.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            clock: Arc::new(clock),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

fn next_id() -> String {
    Uuid::new_v4().to_string()
}

impl MemoryState {
    fn response_ids_in(&self, survey_id: &SurveyId, range: Option<&DateRange>) -> Vec<ResponseId> {
        self.responses
            .iter()
            .filter(|response| &response.survey_id == survey_id)
            .filter(|response| range.map_or(true, |range| range.contains(response.created_at)))
            .map(|response| response.id.clone())
            .collect()
    }

    fn attribute(&self, id: &AttributeId) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| &attribute.id == id)
    }
}

impl SurveyStore for MemorySurveyStore {
    fn insert_survey(&self, survey: NewSurvey) -> Result<Survey, StoreError> {
        let now = self.now();
        let mut state = self.lock()?;
        if state
            .surveys
            .iter()
            .any(|existing| existing.survey_code == survey.survey_code)
        {
            return Err(StoreError::Conflict);
        }

        let stored = Survey {
            id: SurveyId(next_id()),
            survey_code: survey.survey_code,
            title: survey.title,
            method: survey.method,
            main_question: survey.main_question,
            comment_label: survey.comment_label,
            branding: survey.branding,
            status: survey.status,
            created_by: survey.created_by,
            created_at: now,
            updated_at: now,
        };
        state.surveys.push(stored.clone());
        Ok(stored)
    }

    fn update_survey(&self, mut survey: Survey) -> Result<Survey, StoreError> {
        survey.updated_at = self.now();
        let mut state = self.lock()?;
        let slot = state
            .surveys
            .iter_mut()
            .find(|existing| existing.id == survey.id)
            .ok_or(StoreError::NotFound)?;
        *slot = survey.clone();
        Ok(survey)
    }

    fn insert_instance(&self, instance: NewSurveyInstance) -> Result<SurveyInstance, StoreError> {
        let now = self.now();
        let mut state = self.lock()?;
        if !state
            .surveys
            .iter()
            .any(|survey| survey.id == instance.survey_id)
        {
            return Err(StoreError::NotFound);
        }
        if state
            .instances
            .iter()
            .any(|existing| existing.instance_code == instance.instance_code)
        {
            return Err(StoreError::Conflict);
        }

        let stored = SurveyInstance {
            id: InstanceId(next_id()),
            survey_id: instance.survey_id,
            instance_code: instance.instance_code,
            store_id: instance.store_id,
            name: instance.name,
            campaign_type: instance.campaign_type,
            qr_location: instance.qr_location,
            is_active: instance.is_active,
            created_at: now,
            expires_at: instance.expires_at,
        };
        state.instances.push(stored.clone());
        Ok(stored)
    }

    fn insert_attribute(&self, attribute: NewAttribute) -> Result<Attribute, StoreError> {
        let mut state = self.lock()?;
        if state.attributes.iter().any(|existing| {
            existing.code == attribute.code && existing.organization_id == attribute.organization_id
        }) {
            return Err(StoreError::Conflict);
        }

        let stored = Attribute {
            id: AttributeId(next_id()),
            organization_id: attribute.organization_id,
            code: attribute.code,
            label: attribute.label,
            is_system: attribute.is_system,
        };
        state.attributes.push(stored.clone());
        Ok(stored)
    }

    fn insert_survey_attribute(
        &self,
        binding: NewSurveyAttribute,
    ) -> Result<SurveyAttribute, StoreError> {
        let mut state = self.lock()?;
        if !state
            .surveys
            .iter()
            .any(|survey| survey.id == binding.survey_id)
        {
            return Err(StoreError::NotFound);
        }
        let attribute = state
            .attribute(&binding.attribute_id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        if state.bindings.iter().any(|existing| {
            existing.survey_id == binding.survey_id && existing.attribute_id == binding.attribute_id
        }) {
            return Err(StoreError::Conflict);
        }

        let stored = SurveyAttribute {
            survey_id: binding.survey_id.clone(),
            attribute,
            position: binding.position,
            is_required: binding.is_required,
        };
        state.bindings.push(binding);
        Ok(stored)
    }

    fn insert_response(&self, response: NewResponse) -> Result<Response, StoreError> {
        let now = self.now();
        let mut state = self.lock()?;
        let stored = Response {
            id: ResponseId(next_id()),
            survey_id: response.survey_id,
            instance_id: response.instance_id,
            store_id: response.store_id,
            main_score: response.main_score,
            comment: response.comment,
            contact: response.contact,
            metadata: response.metadata,
            created_at: now,
        };
        state.responses.push(stored.clone());
        Ok(stored)
    }

    fn insert_attribute_ratings(
        &self,
        ratings: Vec<NewAttributeRating>,
    ) -> Result<Vec<AttributeRatingRecord>, StoreError> {
        let mut state = self.lock()?;
        for rating in &ratings {
            if !state
                .responses
                .iter()
                .any(|response| response.id == rating.response_id)
            {
                return Err(StoreError::NotFound);
            }
            if state.ratings.iter().any(|existing| {
                existing.response_id == rating.response_id
                    && existing.attribute_id == rating.attribute_id
            }) {
                return Err(StoreError::Conflict);
            }
        }

        let stored: Vec<AttributeRatingRecord> = ratings
            .into_iter()
            .map(|rating| AttributeRatingRecord {
                id: next_id(),
                response_id: rating.response_id,
                attribute_id: rating.attribute_id,
                rating: rating.rating,
            })
            .collect();
        state.ratings.extend(stored.iter().cloned());
        Ok(stored)
    }

    fn survey_by_id(&self, id: &SurveyId) -> Result<Option<Survey>, StoreError> {
        let state = self.lock()?;
        Ok(state.surveys.iter().find(|survey| &survey.id == id).cloned())
    }

    fn surveys(&self, status: Option<SurveyStatus>) -> Result<Vec<Survey>, StoreError> {
        let state = self.lock()?;
        let mut surveys: Vec<Survey> = state
            .surveys
            .iter()
            .filter(|survey| status.map_or(true, |status| survey.status == status))
            .cloned()
            .collect();
        // Ties fall back to reverse insertion order.
        surveys.reverse();
        surveys.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(surveys)
    }

    fn survey_by_code(
        &self,
        code: &str,
        status: SurveyStatus,
    ) -> Result<Option<Survey>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .surveys
            .iter()
            .find(|survey| survey.survey_code == code && survey.status == status)
            .cloned())
    }

    fn instance_by_id(&self, id: &InstanceId) -> Result<Option<SurveyInstance>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .instances
            .iter()
            .find(|instance| &instance.id == id)
            .cloned())
    }

    fn instance_by_code(
        &self,
        survey_id: &SurveyId,
        code: &str,
    ) -> Result<Option<SurveyInstance>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .instances
            .iter()
            .find(|instance| {
                &instance.survey_id == survey_id
                    && instance.instance_code == code
                    && instance.is_active
            })
            .cloned())
    }

    fn attributes(&self, organization_id: Option<&str>) -> Result<Vec<Attribute>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .attributes
            .iter()
            .filter(|attribute| {
                attribute.is_system || attribute.organization_id.as_deref() == organization_id
            })
            .cloned()
            .collect())
    }

    fn survey_attributes(&self, survey_id: &SurveyId) -> Result<Vec<SurveyAttribute>, StoreError> {
        let state = self.lock()?;
        let mut bound: Vec<SurveyAttribute> = state
            .bindings
            .iter()
            .filter(|binding| &binding.survey_id == survey_id)
            .filter_map(|binding| {
                state
                    .attribute(&binding.attribute_id)
                    .map(|attribute| SurveyAttribute {
                        survey_id: binding.survey_id.clone(),
                        attribute: attribute.clone(),
                        position: binding.position,
                        is_required: binding.is_required,
                    })
            })
            .collect();
        bound.sort_by_key(|binding| binding.position);
        Ok(bound)
    }

    fn responses(
        &self,
        survey_id: &SurveyId,
        range: Option<&DateRange>,
    ) -> Result<Vec<Response>, StoreError> {
        let state = self.lock()?;
        let mut responses: Vec<Response> = state
            .responses
            .iter()
            .filter(|response| &response.survey_id == survey_id)
            .filter(|response| range.map_or(true, |range| range.contains(response.created_at)))
            .cloned()
            .collect();
        responses.sort_by_key(|response| response.created_at);
        Ok(responses)
    }

    fn attribute_ratings(
        &self,
        survey_id: &SurveyId,
        range: Option<&DateRange>,
    ) -> Result<Vec<AttributeRatingRecord>, StoreError> {
        let state = self.lock()?;
        let response_ids = state.response_ids_in(survey_id, range);
        Ok(state
            .ratings
            .iter()
            .filter(|rating| response_ids.contains(&rating.response_id))
            .cloned()
            .collect())
    }

    fn response_count(&self, survey_id: &SurveyId) -> Result<usize, StoreError> {
        let state = self.lock()?;
        Ok(state
            .responses
            .iter()
            .filter(|response| &response.survey_id == survey_id)
            .count())
    }
}

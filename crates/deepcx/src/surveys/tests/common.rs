use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::surveys::definition::SurveyDraft;
use crate::surveys::domain::{
    Attribute, AttributeId, AttributeRatingRecord, Branding, DateRange, InstanceId,
    NewAttribute, NewAttributeRating, NewResponse, NewSurvey, NewSurveyAttribute,
    NewSurveyInstance, ResponseSubmission, Survey, SurveyAttribute, SurveyId, SurveyInstance,
    SurveyMethod, SurveyStatus,
};
use crate::surveys::domain::{CampaignType, Response as SurveyResponse, StoreId};
use crate::surveys::repository::{StoreError, SurveyStore};
use crate::surveys::service::{InstanceDraft, SurveyService};
use crate::surveys::{MemorySurveyStore, SurveySettings};

pub(super) fn memory_service() -> (SurveyService<MemorySurveyStore>, Arc<MemorySurveyStore>) {
    let store = Arc::new(MemorySurveyStore::default());
    let service = seeded_service(store.clone());
    (service, store)
}

pub(super) fn seeded_service<S>(store: Arc<S>) -> SurveyService<S>
where
    S: SurveyStore + 'static,
{
    let service = SurveyService::new(store, SurveySettings::default());
    service
        .seed_system_attributes()
        .expect("system attributes seed");
    service
}

pub(super) fn attribute_id<S>(service: &SurveyService<S>, code: &str) -> AttributeId
where
    S: SurveyStore + 'static,
{
    service
        .attribute_catalogue(None)
        .expect("catalogue loads")
        .into_iter()
        .find(|attribute| attribute.code == code)
        .map(|attribute| attribute.id)
        .expect("system attribute present")
}

/// Active survey with one open QR instance; `attributes` are `(code, required)` pairs.
pub(super) fn publish_survey<S>(
    service: &SurveyService<S>,
    method: SurveyMethod,
    attributes: &[(&str, bool)],
) -> (Survey, SurveyInstance)
where
    S: SurveyStore + 'static,
{
    let mut draft = SurveyDraft::new("Downtown store feedback");
    draft.set_method(method);
    for (code, required) in attributes {
        let id = attribute_id(service, code);
        assert!(draft.select_attribute(&id), "attribute {code} selectable");
        draft.set_required(&id, *required);
    }

    let created = service
        .create_survey(&draft, Some("manager@example.com".to_string()))
        .expect("survey created");
    let survey = service
        .set_status(&created.survey.id, SurveyStatus::Active)
        .expect("survey published");
    let instance = service
        .create_instance(
            &survey.id,
            InstanceDraft {
                name: Some("Front counter".to_string()),
                store_id: Some(StoreId("store-7".to_string())),
                ..InstanceDraft::default()
            },
        )
        .expect("instance created");
    (survey, instance)
}

pub(super) fn submission(
    survey: &Survey,
    instance: &SurveyInstance,
    score: i64,
) -> ResponseSubmission {
    ResponseSubmission {
        survey_id: survey.id.clone(),
        instance_id: Some(instance.id.clone()),
        main_score: Some(score),
        ..ResponseSubmission::default()
    }
}

pub(super) fn survey_fixture(method: SurveyMethod) -> Survey {
    let created_at = Utc
        .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    Survey {
        id: SurveyId("survey-1".to_string()),
        survey_code: "SABC1234".to_string(),
        title: "Lobby".to_string(),
        method,
        main_question: method.default_question().to_string(),
        comment_label: "Comments".to_string(),
        branding: Branding {
            show_logo: false,
            logo_url: None,
            primary_color: "#4F46E5".to_string(),
        },
        status: SurveyStatus::Active,
        created_by: None,
        created_at,
        updated_at: created_at,
    }
}

pub(super) fn instance_fixture(survey: &Survey) -> SurveyInstance {
    SurveyInstance {
        id: InstanceId("instance-1".to_string()),
        survey_id: survey.id.clone(),
        instance_code: "IXYZ9876".to_string(),
        store_id: Some(StoreId("store-7".to_string())),
        name: None,
        campaign_type: CampaignType::Qr,
        qr_location: Some("Checkout".to_string()),
        is_active: true,
        created_at: survey.created_at,
        expires_at: None,
    }
}

pub(super) fn bound_attribute(
    survey: &Survey,
    code: &str,
    position: u8,
    is_required: bool,
) -> SurveyAttribute {
    SurveyAttribute {
        survey_id: survey.id.clone(),
        attribute: Attribute {
            id: AttributeId(format!("attr-{code}")),
            organization_id: None,
            code: code.to_string(),
            label: code.replace('_', " "),
            is_system: true,
        },
        position,
        is_required,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Memory store with switchable faults.
#[derive(Default)]
pub(super) struct ScriptedStore {
    pub(super) inner: MemorySurveyStore,
    read_failures: AtomicUsize,
    code_conflicts: AtomicUsize,
    reject_ratings: AtomicBool,
    reject_bindings: AtomicBool,
    reject_responses: AtomicBool,
    pub(super) reads: AtomicUsize,
}

impl ScriptedStore {
    /// The next `count` reads fail as unavailable.
    pub(super) fn fail_reads(&self, count: usize) {
        self.read_failures.store(count, Ordering::SeqCst);
    }

    /// The next `count` survey or instance inserts report a code conflict.
    pub(super) fn conflict_codes(&self, count: usize) {
        self.code_conflicts.store(count, Ordering::SeqCst);
    }

    pub(super) fn reject_ratings(&self) {
        self.reject_ratings.store(true, Ordering::SeqCst);
    }

    pub(super) fn reject_bindings(&self) {
        self.reject_bindings.store(true, Ordering::SeqCst);
    }

    pub(super) fn reject_responses(&self) {
        self.reject_responses.store(true, Ordering::SeqCst);
    }

    pub(super) fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read<T>(
        &self,
        query: impl FnOnce(&MemorySurveyStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.read_failures) {
            return Err(StoreError::Unavailable("replica lagging".to_string()));
        }
        query(&self.inner)
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}

impl SurveyStore for ScriptedStore {
    fn insert_survey(&self, survey: NewSurvey) -> Result<Survey, StoreError> {
        if take_one(&self.code_conflicts) {
            return Err(StoreError::Conflict);
        }
        self.inner.insert_survey(survey)
    }

    fn update_survey(&self, survey: Survey) -> Result<Survey, StoreError> {
        self.inner.update_survey(survey)
    }

    fn insert_instance(&self, instance: NewSurveyInstance) -> Result<SurveyInstance, StoreError> {
        if take_one(&self.code_conflicts) {
            return Err(StoreError::Conflict);
        }
        self.inner.insert_instance(instance)
    }

    fn insert_attribute(&self, attribute: NewAttribute) -> Result<Attribute, StoreError> {
        self.inner.insert_attribute(attribute)
    }

    fn insert_survey_attribute(
        &self,
        binding: NewSurveyAttribute,
    ) -> Result<SurveyAttribute, StoreError> {
        if self.reject_bindings.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("bindings table locked".to_string()));
        }
        self.inner.insert_survey_attribute(binding)
    }

    fn insert_response(&self, response: NewResponse) -> Result<SurveyResponse, StoreError> {
        if self.reject_responses.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("primary offline".to_string()));
        }
        self.inner.insert_response(response)
    }

    fn insert_attribute_ratings(
        &self,
        ratings: Vec<NewAttributeRating>,
    ) -> Result<Vec<AttributeRatingRecord>, StoreError> {
        if self.reject_ratings.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ratings table locked".to_string()));
        }
        self.inner.insert_attribute_ratings(ratings)
    }

    fn survey_by_id(&self, id: &SurveyId) -> Result<Option<Survey>, StoreError> {
        self.read(|store| store.survey_by_id(id))
    }

    fn surveys(&self, status: Option<SurveyStatus>) -> Result<Vec<Survey>, StoreError> {
        self.read(|store| store.surveys(status))
    }

    fn survey_by_code(
        &self,
        code: &str,
        status: SurveyStatus,
    ) -> Result<Option<Survey>, StoreError> {
        self.read(|store| store.survey_by_code(code, status))
    }

    fn instance_by_id(&self, id: &InstanceId) -> Result<Option<SurveyInstance>, StoreError> {
        self.read(|store| store.instance_by_id(id))
    }

    fn instance_by_code(
        &self,
        survey_id: &SurveyId,
        code: &str,
    ) -> Result<Option<SurveyInstance>, StoreError> {
        self.read(|store| store.instance_by_code(survey_id, code))
    }

    fn attributes(&self, organization_id: Option<&str>) -> Result<Vec<Attribute>, StoreError> {
        self.read(|store| store.attributes(organization_id))
    }

    fn survey_attributes(&self, survey_id: &SurveyId) -> Result<Vec<SurveyAttribute>, StoreError> {
        self.read(|store| store.survey_attributes(survey_id))
    }

    fn responses(
        &self,
        survey_id: &SurveyId,
        range: Option<&DateRange>,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        self.read(|store| store.responses(survey_id, range))
    }

    fn attribute_ratings(
        &self,
        survey_id: &SurveyId,
        range: Option<&DateRange>,
    ) -> Result<Vec<AttributeRatingRecord>, StoreError> {
        self.read(|store| store.attribute_ratings(survey_id, range))
    }

    fn response_count(&self, survey_id: &SurveyId) -> Result<usize, StoreError> {
        self.read(|store| store.response_count(survey_id))
    }
}

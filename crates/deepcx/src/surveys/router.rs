use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::definition::{CreateSurveyRequest, SurveyDraft};
use super::domain::{
    DateRange, RequestMetadata, ResponseSubmission, SurveyId, SurveyMethod, SurveyStatus,
};
use super::repository::SurveyStore;
use super::service::{InstanceDraft, SurveyService, SurveyServiceError};

const UNKNOWN_CLIENT: &str = "unknown";

/// Router builder exposing the admin, respondent, and reporting endpoints.
pub fn survey_router<S>(service: Arc<SurveyService<S>>) -> Router
where
    S: SurveyStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/attributes",
            get(attributes_handler::<S>).post(create_attribute_handler::<S>),
        )
        .route(
            "/api/v1/surveys",
            get(list_surveys_handler::<S>).post(create_survey_handler::<S>),
        )
        .route(
            "/api/v1/surveys/:survey_id/instances",
            post(create_instance_handler::<S>),
        )
        .route(
            "/api/v1/surveys/:survey_id/status",
            put(status_handler::<S>),
        )
        .route(
            "/api/v1/surveys/:survey_id/method",
            put(method_handler::<S>),
        )
        .route(
            "/api/v1/surveys/:survey_id/metrics",
            get(metrics_handler::<S>),
        )
        .route(
            "/api/v1/s/:survey_code/:instance_code",
            get(public_survey_handler::<S>),
        )
        .route("/api/v1/responses", post(submit_handler::<S>))
        .route("/api/v1/classify", get(classify_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CatalogueQuery {
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewAttributeRequest {
    pub organization_id: String,
    pub code: String,
    pub label: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SurveyListQuery {
    #[serde(default)]
    pub status: Option<SurveyStatus>,
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    pub status: SurveyStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MethodChange {
    pub method: SurveyMethod,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetricsQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassifyQuery {
    pub method: SurveyMethod,
    pub score: i64,
}

pub(crate) async fn attributes_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Query(query): Query<CatalogueQuery>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.attribute_catalogue(query.organization_id.as_deref()) {
        Ok(attributes) => (StatusCode::OK, axum::Json(attributes)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_attribute_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    axum::Json(request): axum::Json<NewAttributeRequest>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.create_attribute(&request.organization_id, &request.code, &request.label) {
        Ok(attribute) => (StatusCode::CREATED, axum::Json(attribute)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_surveys_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Query(query): Query<SurveyListQuery>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.list_surveys(query.status, query.q.as_deref()) {
        Ok(surveys) => (StatusCode::OK, axum::Json(surveys)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_survey_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    axum::Json(request): axum::Json<CreateSurveyRequest>,
) -> Response
where
    S: SurveyStore + 'static,
{
    let created_by = request.created_by.clone();
    let draft = match SurveyDraft::try_from(request) {
        Ok(draft) => draft,
        Err(error) => return error_response(error.into()),
    };

    match service.create_survey(&draft, created_by) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_instance_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(survey_id): Path<String>,
    axum::Json(draft): axum::Json<InstanceDraft>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.create_instance(&SurveyId(survey_id), draft) {
        Ok(instance) => (StatusCode::CREATED, axum::Json(instance)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(survey_id): Path<String>,
    axum::Json(change): axum::Json<StatusChange>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.set_status(&SurveyId(survey_id), change.status) {
        Ok(survey) => (StatusCode::OK, axum::Json(survey)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn method_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(survey_id): Path<String>,
    axum::Json(change): axum::Json<MethodChange>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.change_method(&SurveyId(survey_id), change.method) {
        Ok(survey) => (StatusCode::OK, axum::Json(survey)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn metrics_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(survey_id): Path<String>,
    Query(query): Query<MetricsQuery>,
) -> Response
where
    S: SurveyStore + 'static,
{
    let range = (query.from.is_some() || query.to.is_some()).then_some(DateRange {
        from: query.from,
        to: query.to,
    });

    match service.compute_metrics(&SurveyId(survey_id), range) {
        Ok(metrics) => (StatusCode::OK, axum::Json(metrics)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn public_survey_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path((survey_code, instance_code)): Path<(String, String)>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.load_public_survey(&survey_code, &instance_code) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<ResponseSubmission>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.submit_response(submission, request_metadata(&headers)) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn classify_handler<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Query(query): Query<ClassifyQuery>,
) -> Response
where
    S: SurveyStore + 'static,
{
    match service.classify(query.method, query.score) {
        Ok(class) => {
            let payload = json!({
                "method": query.method,
                "score": query.score,
                "label": class.label(),
                "classification": class,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error.into()),
    }
}

/// Client address from proxy headers and the user agent, each falling back to `"unknown"`.
pub(crate) fn request_metadata(headers: &HeaderMap) -> RequestMetadata {
    let ip_address = header_value(headers, "x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| header_value(headers, "x-real-ip"))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string();

    RequestMetadata {
        ip_address,
        user_agent: header_value(headers, "user-agent")
            .unwrap_or(UNKNOWN_CLIENT)
            .to_string(),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn error_response(error: SurveyServiceError) -> Response {
    let (status, message) = match &error {
        SurveyServiceError::Validation(rule) => (StatusCode::UNPROCESSABLE_ENTITY, rule.to_string()),
        SurveyServiceError::NotFound => (StatusCode::NOT_FOUND, error.to_string()),
        SurveyServiceError::MethodLocked { .. } => (StatusCode::CONFLICT, error.to_string()),
        SurveyServiceError::CodeSpaceExhausted { .. } | SurveyServiceError::Persistence(_) => {
            tracing::error!(error = %error, "survey request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        }
    };

    let payload = json!({
        "error": message,
    });
    (status, axum::Json(payload)).into_response()
}

//! End-to-end survey scenarios driven through the public service facade and
//! HTTP router: definition, distribution, intake, and reporting.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use deepcx::surveys::{
    survey_router, MemorySurveyStore, RequestMetadata, ResponseSubmission, SurveyDraft,
    SurveyMethod, SurveyService, SurveyServiceError, SurveySettings, SurveyStatus,
    ValidationError,
};

fn service() -> SurveyService<MemorySurveyStore> {
    let service = SurveyService::new(
        Arc::new(MemorySurveyStore::default()),
        SurveySettings::default(),
    );
    service.seed_system_attributes().expect("seed catalogue");
    service
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

#[test]
fn nps_campaign_reports_net_score_and_attribute_averages() {
    let service = service();
    let catalogue = service.attribute_catalogue(None).expect("catalogue");
    let wait = catalogue
        .iter()
        .find(|attribute| attribute.code == "wait_time")
        .expect("wait time attribute")
        .id
        .clone();

    let mut draft = SurveyDraft::new("Pharmacy counter");
    draft.select_attribute(&wait);
    draft.set_required(&wait, true);
    let created = service.create_survey(&draft, None).expect("created");
    let survey = service
        .set_status(&created.survey.id, SurveyStatus::Active)
        .expect("published");
    let instance = service
        .create_instance(&survey.id, Default::default())
        .expect("instance");

    for (score, wait_rating) in [(10, 3.0), (9, 2.0), (8, 2.0), (3, 1.0)] {
        let mut submission = ResponseSubmission {
            survey_id: survey.id.clone(),
            instance_id: Some(instance.id.clone()),
            main_score: Some(score),
            ..ResponseSubmission::default()
        };
        submission.attribute_scores.insert(wait.clone(), wait_rating);
        service
            .submit_response(submission, RequestMetadata::default())
            .expect("accepted");
    }

    let metrics = service.compute_metrics(&survey.id, None).expect("metrics");
    assert_eq!(metrics.total_responses, 4);
    // 2 promoters, 1 passive, 1 detractor
    assert_eq!(metrics.nps_score, Some(25));
    assert_eq!(metrics.attribute_averages.len(), 1);
    assert_eq!(metrics.attribute_averages[0].attribute_id, wait);
    assert_eq!(metrics.attribute_averages[0].average, 2.0);
    assert_eq!(metrics.attribute_averages[0].samples, 4);
}

#[test]
fn draft_surveys_do_not_accept_responses() {
    let service = service();
    let created = service
        .create_survey(&SurveyDraft::new("Not yet live"), None)
        .expect("created");

    let submission = ResponseSubmission {
        survey_id: created.survey.id.clone(),
        main_score: Some(7),
        ..ResponseSubmission::default()
    };
    assert!(matches!(
        service.submit_response(submission, RequestMetadata::default()),
        Err(SurveyServiceError::NotFound)
    ));
}

#[test]
fn csat_scores_outside_five_point_scale_are_rejected() {
    let service = service();
    let mut draft = SurveyDraft::new("Delivery");
    draft.set_method(SurveyMethod::Csat);
    let created = service.create_survey(&draft, None).expect("created");
    service
        .set_status(&created.survey.id, SurveyStatus::Active)
        .expect("published");

    let submission = ResponseSubmission {
        survey_id: created.survey.id.clone(),
        main_score: Some(10),
        ..ResponseSubmission::default()
    };
    match service.submit_response(submission, RequestMetadata::default()) {
        Err(SurveyServiceError::Validation(ValidationError::ScoreOutOfRange { min, max, .. })) => {
            assert_eq!((min, max), (1, 5));
        }
        other => panic!("expected range error, got {other:?}"),
    }
}

#[tokio::test]
async fn respondent_round_trip_over_http() {
    let service = Arc::new(service());
    let mut draft = SurveyDraft::new("Hotel lobby");
    draft.set_method(SurveyMethod::Stars);
    let created = service.create_survey(&draft, None).expect("created");
    let survey = service
        .set_status(&created.survey.id, SurveyStatus::Active)
        .expect("published");
    let instance = service
        .create_instance(&survey.id, Default::default())
        .expect("instance");

    let page = survey_router(service.clone())
        .oneshot(
            Request::get(format!(
                "/api/v1/s/{}/{}",
                survey.survey_code, instance.instance_code
            ))
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(page.status(), StatusCode::OK);
    let page = json_body(page).await;
    assert_eq!(page["survey"]["main_question"], SurveyMethod::Stars.default_question());

    let submitted = survey_router(service.clone())
        .oneshot(
            Request::post("/api/v1/responses")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-real-ip", "192.0.2.44")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "survey_id": survey.id.0,
                        "instance_id": instance.id.0,
                        "main_score": 4,
                        "wants_contact": true,
                        "contact_name": "Rui",
                        "contact_email": "rui@example.org",
                    }))
                    .expect("serializes"),
                ))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(submitted.status(), StatusCode::CREATED);
    assert_eq!(json_body(submitted).await["label"], "4 stars");

    let metrics = survey_router(service)
        .oneshot(
            Request::get(format!("/api/v1/surveys/{}/metrics", survey.id.0))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    let metrics = json_body(metrics).await;
    assert_eq!(metrics["csat_average"], 4.0);
    assert_eq!(metrics["satisfaction_rate"], 100);
    assert_eq!(metrics["score_distribution"]["4"], 1);
}

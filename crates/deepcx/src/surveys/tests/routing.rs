use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::surveys::domain::SurveyMethod;
use crate::surveys::router::{request_metadata, survey_router};

fn json_request(method: &str, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).expect("serializes")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn admin_flow_creates_publishes_and_distributes() {
    let (service, _) = memory_service();
    let service = Arc::new(service);
    let service_attr = attribute_id(&service, "service");

    let response = survey_router(service.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/surveys",
            &json!({
                "title": "Checkout experience",
                "method": "STARS",
                "primary_color": "#0F0",
                "attributes": [{ "attribute_id": service_attr.0, "required": true }],
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    assert_eq!(created["survey"]["method"], "STARS");
    assert_eq!(created["survey"]["status"], "draft");
    assert_eq!(created["survey"]["branding"]["primary_color"], "#00ff00");
    assert_eq!(created["attributes"][0]["is_required"], true);
    let survey_id = created["survey"]["id"].as_str().expect("id").to_string();
    let survey_code = created["survey"]["survey_code"]
        .as_str()
        .expect("code")
        .to_string();

    let response = survey_router(service.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/surveys/{survey_id}/status"),
            &json!({ "status": "active" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = survey_router(service.clone())
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/surveys/{survey_id}/instances"),
            &json!({ "name": "Register 2", "campaign_type": "link" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let instance = read_json_body(response).await;
    assert_eq!(instance["campaign_type"], "link");
    let instance_code = instance["instance_code"].as_str().expect("code").to_string();

    let response = survey_router(service)
        .oneshot(get(&format!("/api/v1/s/{survey_code}/{instance_code}")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_json_body(response).await;
    assert_eq!(page["max_score"], 5);
    assert_eq!(page["text_color"], "#111111");
    assert_eq!(page["attributes"][0]["attribute"]["code"], "service");
}

#[tokio::test]
async fn create_survey_rejects_too_many_attributes() {
    let (service, _) = memory_service();
    let attributes: Vec<Value> = (0..6)
        .map(|index| json!({ "attribute_id": format!("attr-{index}") }))
        .collect();

    let response = survey_router(Arc::new(service))
        .oneshot(json_request(
            "POST",
            "/api/v1/surveys",
            &json!({ "title": "Too much", "method": "NPS", "attributes": attributes }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_codes_are_not_found() {
    let (service, _) = memory_service();
    let response = survey_router(Arc::new(service))
        .oneshot(get("/api/v1/s/SNOPE000/INOPE000"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "survey not found");
}

#[tokio::test]
async fn submission_records_client_metadata() {
    let (service, store) = memory_service();
    let (survey, instance) = publish_survey(&service, SurveyMethod::Nps, &[]);

    let mut request = json_request(
        "POST",
        "/api/v1/responses",
        &json!({
            "survey_id": survey.id.0,
            "instance_id": instance.id.0,
            "main_score": 9,
            "comment": "Quick and friendly",
        }),
    );
    request.headers_mut().insert(
        "x-forwarded-for",
        HeaderValue::from_static("198.51.100.4, 10.0.0.1"),
    );
    request
        .headers_mut()
        .insert(header::USER_AGENT, HeaderValue::from_static("qr-scanner"));

    let response = survey_router(Arc::new(service))
        .oneshot(request)
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt = read_json_body(response).await;
    assert_eq!(receipt["label"], "Promoter");
    assert_eq!(
        receipt["classification"],
        json!({ "method": "NPS", "bucket": "promoter" })
    );

    use crate::surveys::repository::SurveyStore;
    let stored = store.responses(&survey.id, None).expect("responses");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].metadata.ip_address, "198.51.100.4");
    assert_eq!(stored[0].metadata.user_agent, "qr-scanner");
    assert_eq!(stored[0].comment.as_deref(), Some("Quick and friendly"));
}

#[tokio::test]
async fn invalid_score_is_unprocessable() {
    let (service, _) = memory_service();
    let (survey, _) = publish_survey(&service, SurveyMethod::Csat, &[]);

    let response = survey_router(Arc::new(service))
        .oneshot(json_request(
            "POST",
            "/api/v1/responses",
            &json!({ "survey_id": survey.id.0, "main_score": 9 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "score 9 is outside the CSAT range 1-5");
}

#[tokio::test]
async fn method_change_conflicts_after_first_response() {
    let (service, _) = memory_service();
    let (survey, instance) = publish_survey(&service, SurveyMethod::Nps, &[]);
    service
        .submit_response(
            submission(&survey, &instance, 3),
            crate::surveys::domain::RequestMetadata::default(),
        )
        .expect("accepted");

    let response = survey_router(Arc::new(service))
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/surveys/{}/method", survey.id.0),
            &json!({ "method": "CSAT" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn metrics_route_applies_query_window() {
    let (service, _) = memory_service();
    let (survey, instance) = publish_survey(&service, SurveyMethod::Nps, &[]);
    for score in [10, 9, 2] {
        service
            .submit_response(
                submission(&survey, &instance, score),
                crate::surveys::domain::RequestMetadata::default(),
            )
            .expect("accepted");
    }
    let service = Arc::new(service);

    let response = survey_router(service.clone())
        .oneshot(get(&format!("/api/v1/surveys/{}/metrics", survey.id.0)))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let metrics = read_json_body(response).await;
    assert_eq!(metrics["total_responses"], 3);
    assert_eq!(metrics["nps_score"], 33);
    assert_eq!(metrics["nps_breakdown"]["detractors"], 1);
    assert!(metrics.get("csat_average").is_none());

    let response = survey_router(service)
        .oneshot(get(&format!(
            "/api/v1/surveys/{}/metrics?from=2000-01-01&to=2000-12-31",
            survey.id.0
        )))
        .await
        .expect("route executes");
    let metrics = read_json_body(response).await;
    assert_eq!(metrics["total_responses"], 0);
    assert_eq!(metrics["nps_score"], 0);
}

#[tokio::test]
async fn metrics_for_unknown_survey_is_not_found() {
    let (service, _) = memory_service();
    let response = survey_router(Arc::new(service))
        .oneshot(get("/api/v1/surveys/missing/metrics"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn persistence_failures_hide_details() {
    let store = Arc::new(ScriptedStore::default());
    let service = seeded_service(store.clone());
    let (survey, _) = publish_survey(&service, SurveyMethod::Nps, &[]);
    store.fail_reads(2);

    let response = survey_router(Arc::new(service))
        .oneshot(get(&format!("/api/v1/surveys/{}/metrics", survey.id.0)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "internal error");
}

#[tokio::test]
async fn classify_route_labels_scores() {
    let (service, _) = memory_service();
    let service = Arc::new(service);

    let response = survey_router(service.clone())
        .oneshot(get("/api/v1/classify?method=CSAT&score=7"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["label"], "Satisfied");

    let response = survey_router(service.clone())
        .oneshot(get("/api/v1/classify?method=NPS&score=12"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    for score in [0, 6] {
        let response = survey_router(service.clone())
            .oneshot(get(&format!("/api/v1/classify?method=STARS&score={score}")))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json_body(response).await;
        assert_eq!(
            payload["error"],
            format!("score {score} is outside the STARS range 1-5")
        );
    }
}

#[tokio::test]
async fn survey_listing_honours_status_and_search() {
    let (service, _) = memory_service();
    let (live, _) = publish_survey(&service, SurveyMethod::Nps, &[]);
    service
        .create_survey(&crate::surveys::SurveyDraft::new("Checkout pilot"), None)
        .expect("draft created");
    let service = Arc::new(service);

    let response = survey_router(service.clone())
        .oneshot(get("/api/v1/surveys"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(2));

    let response = survey_router(service.clone())
        .oneshot(get("/api/v1/surveys?status=active"))
        .await
        .expect("route executes");
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["id"], live.id.0);

    let response = survey_router(service)
        .oneshot(get("/api/v1/surveys?q=checkout"))
        .await
        .expect("route executes");
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["title"], "Checkout pilot");
}

#[tokio::test]
async fn organization_attribute_joins_the_catalogue() {
    let (service, _) = memory_service();
    let service = Arc::new(service);

    let response = survey_router(service.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/attributes",
            &json!({ "organization_id": "org-1", "code": "parking", "label": "Parking" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let attribute = read_json_body(response).await;
    assert_eq!(attribute["is_system"], false);
    let attribute_id = attribute["id"].as_str().expect("id").to_string();

    let response = survey_router(service.clone())
        .oneshot(get("/api/v1/attributes?organization_id=org-1"))
        .await
        .expect("route executes");
    let catalogue = read_json_body(response).await;
    assert!(catalogue
        .as_array()
        .expect("array")
        .iter()
        .any(|entry| entry["code"] == "parking"));

    let response = survey_router(service.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/surveys",
            &json!({
                "title": "Drive-through",
                "method": "NPS",
                "organization_id": "org-1",
                "attributes": [{ "attribute_id": attribute_id, "required": true }],
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = survey_router(service)
        .oneshot(json_request(
            "POST",
            "/api/v1/attributes",
            &json!({ "organization_id": "org-1", "code": "parking", "label": "Parking" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn client_address_falls_back_through_headers() {
    let mut headers = HeaderMap::new();
    assert_eq!(request_metadata(&headers).ip_address, "unknown");
    assert_eq!(request_metadata(&headers).user_agent, "unknown");

    headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.10"));
    assert_eq!(request_metadata(&headers).ip_address, "192.0.2.10");

    headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 "));
    assert_eq!(request_metadata(&headers).ip_address, "203.0.113.7");
}

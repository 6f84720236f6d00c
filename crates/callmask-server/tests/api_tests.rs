//! Integration tests for the call bridge API.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use callmask_server::api::create_router;
use common::{mock_origination, test_state, ACCOUNT_SID};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn text_body(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_welcome_endpoint() {
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["service"], "callmask");
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn test_health_endpoint() {
    let carrier = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/2010-04-01/Accounts/{}.json", ACCOUNT_SID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sid": ACCOUNT_SID,
            "status": "active",
        })))
        .mount(&carrier)
        .await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_sessions"], 0);
    assert_eq!(json["carrier_api_healthy"], true);
}

#[tokio::test]
async fn test_health_reports_carrier_down() {
    // No account mock mounted: the credentials check gets a 404
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["carrier_api_healthy"], false);
}

#[tokio::test]
async fn test_start_bridge() {
    let carrier = MockServer::start().await;
    mock_origination(&carrier, "%2B15551230000", "CA100").await;
    mock_origination(&carrier, "%2B15559990000", "CA200").await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bridges")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "caller_number": "+15551230000",
                        "callee_number": "+15559990000",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["session_id"].as_str().unwrap().len(), 32);
    assert_eq!(json["state"], "ringing");
    assert_eq!(json["caller_leg_id"], "CA100");
    assert_eq!(json["callee_leg_id"], "CA200");
}

#[tokio::test]
async fn test_start_bridge_rejects_invalid_number() {
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bridges")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "caller_number": "garbage",
                        "callee_number": "+15559990000",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_start_bridge_rejects_same_number() {
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bridges")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "caller_number": "+15551230000",
                        "callee_number": "+1 (555) 123-0000",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_start_bridge_carrier_rejected() {
    let carrier = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/2010-04-01/Accounts/{}/Calls.json",
            ACCOUNT_SID
        )))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": 21211,
            "message": "Invalid 'To' Phone Number",
            "status": 400,
        })))
        .mount(&carrier)
        .await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bridges")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "caller_number": "+15551230000",
                        "callee_number": "+15559990000",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert_eq!(json["code"], "ORIGINATION_FAILED");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Invalid 'To' Phone Number"));
}

#[tokio::test]
async fn test_get_session_unknown() {
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/bridges/deadbeef")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["code"], "UNKNOWN_SESSION");
}

#[tokio::test]
async fn test_answered_webhook_unknown_session() {
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/webhooks/answered?session=deadbeef&leg=caller")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // The carrier gets a playable document, never an error page
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
    let doc = text_body(response).await;
    assert!(doc.contains("cannot be completed"));
    assert!(doc.ends_with("<Hangup/></Response>"));
}

#[tokio::test]
async fn test_answered_webhook_missing_params() {
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/webhooks/answered")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = text_body(response).await;
    assert!(doc.contains("cannot be completed"));
}

#[tokio::test]
async fn test_answered_webhook_unparseable_leg() {
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/webhooks/answered?session=deadbeef&leg=observer")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = text_body(response).await;
    assert!(doc.contains("cannot be completed"));
}

#[tokio::test]
async fn test_incoming_webhook() {
    let carrier = MockServer::start().await;
    let app = create_router(test_state(&carrier));

    // Carrier console probes with GET
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/webhooks/incoming")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Real inbound calls arrive as form POSTs
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/webhooks/incoming")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("CallSid=CA900&CallStatus=ringing"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
    let doc = text_body(response).await;
    assert!(doc.contains("cannot accept incoming calls"));
    assert!(doc.ends_with("<Hangup/></Response>"));
}

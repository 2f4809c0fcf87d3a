use analyst_agent::{server, Analyst};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "analyst-agent-test-boundary";

fn app() -> axum::Router {
    server::router(Arc::new(Analyst::new("http://127.0.0.1:1/unused")))
}

/// Hand-rolled multipart body: (field name, filename, bytes) triples.
fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, bytes) in parts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_api(parts: &[(&str, &str, &[u8])]) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn test_unsupported_question_still_returns_success_status() {
    let (status, value) =
        post_api(&[("file", "question.txt", b"tell me a joke".as_slice())]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        value,
        serde_json::json!({"error": "Unsupported question type"})
    );
}

#[tokio::test]
async fn test_sales_request_over_multipart() {
    let csv = b"date,region,sales\n2023-01-01,East,100\n2023-01-02,West,200\n";
    let (status, value) = post_api(&[
        (
            "file",
            "question.txt",
            b"What is the total sales and correlation?".as_slice(),
        ),
        ("other_files", "sample-sales.csv", csv.as_slice()),
    ])
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["total_sales"], 300.0);
    assert_eq!(value["top_region"], "West");
    assert_eq!(value["total_sales_tax"], 30.0);
    let chart = value["bar_chart"].as_str().unwrap();
    assert!(chart.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_missing_question_field_reported_in_body() {
    let csv = b"date,region,sales\n2023-01-01,East,100\n";
    let (status, value) = post_api(&[("other_files", "sales.csv", csv.as_slice())]).await;
    assert_eq!(status, StatusCode::OK);
    let error = value["error"].as_str().expect("error body");
    assert!(error.contains("missing question field"));
}

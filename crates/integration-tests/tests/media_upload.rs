//! Multipart image upload through the full router, landing on the local
//! content-addressed media store.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};

use integration_tests::{register, send, test_app, TestApp, UPLOAD_LIMIT};

const BOUNDARY: &str = "huntly-test-boundary";
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn multipart_request(token: Option<&str>, field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\n\
             Content-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/media")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

async fn cleanup(app: &TestApp) {
    tokio::fs::remove_dir_all(&app.media_root).await.ok();
}

#[tokio::test]
async fn upload_stores_file_and_returns_public_url() {
    let app = test_app();
    let (token, _) = register(&app, "Ada").await;

    let (status, body) = send(&app, multipart_request(Some(&token), "image", PNG_MAGIC)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("/media/"));
    assert!(url.ends_with(".png"));

    let on_disk = app.media_root.join(url.trim_start_matches("/media/"));
    assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), PNG_MAGIC);
    cleanup(&app).await;
}

#[tokio::test]
async fn upload_requires_auth() {
    let app = test_app();
    let (status, _) = send(&app, multipart_request(None, "image", PNG_MAGIC)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_image_bytes_are_rejected() {
    let app = test_app();
    let (token, _) = register(&app, "Ada").await;
    let (status, body) = send(
        &app,
        multipart_request(Some(&token), "image", b"#!/bin/sh\necho not an image"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    cleanup(&app).await;
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let app = test_app();
    let (token, _) = register(&app, "Ada").await;

    let mut huge = PNG_MAGIC.to_vec();
    huge.resize(UPLOAD_LIMIT + 1, 0);
    let (status, body) = send(&app, multipart_request(Some(&token), "image", &huge)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("limit"));
    cleanup(&app).await;
}

#[tokio::test]
async fn wrong_field_name_is_rejected() {
    let app = test_app();
    let (token, _) = register(&app, "Ada").await;
    let (status, body) = send(&app, multipart_request(Some(&token), "file", PNG_MAGIC)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("image"));
}

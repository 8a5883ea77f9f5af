//! Web API integration tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

#![cfg(feature = "web")]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use image::{Rgba, RgbaImage};
use imgscrub::{codec, EncodeOptions, OutputFormat, ServerConfig, WebServer};
use tower::ServiceExt;

const BOUNDARY: &str = "imgscrub-test-boundary";

fn router() -> Router {
    WebServer::new().router()
}

fn png(img: &RgbaImage) -> Vec<u8> {
    codec::encode(img, OutputFormat::Png, &EncodeOptions::default()).unwrap()
}

/// Build a multipart body from `(name, filename, bytes)` parts
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, String, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_remove_background_white_png() {
    let input = png(&RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])));
    let body = multipart_body(&[("image", Some("white.png"), input.as_slice())]);

    let (status, content_type, bytes) =
        send(router(), upload_request("/api/remove-background", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/png");

    let decoded = codec::decode(&bytes).unwrap();
    assert_eq!(decoded.format, image::ImageFormat::Png);
    let out = decoded.image.to_rgba8();
    assert_eq!(out.dimensions(), (4, 4));
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[tokio::test]
async fn test_remove_background_keeps_foreground() {
    let mut img = RgbaImage::from_pixel(3, 3, Rgba([250, 250, 250, 255]));
    img.put_pixel(1, 1, Rgba([180, 200, 200, 200]));
    img.put_pixel(0, 2, Rgba([200, 200, 200, 100]));
    let body = multipart_body(&[("image", Some("mixed.png"), png(&img).as_slice())]);

    let (status, _, bytes) = send(router(), upload_request("/api/remove-background", body)).await;
    assert_eq!(status, StatusCode::OK);

    let out = codec::decode(&bytes).unwrap().image.to_rgba8();
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(out.get_pixel(1, 1).0, [180, 200, 200, 200]);
    assert_eq!(out.get_pixel(0, 2).0, [200, 200, 200, 100]);
}

#[tokio::test]
async fn test_remove_background_threshold_field() {
    let input = png(&RgbaImage::from_pixel(2, 2, Rgba([150, 150, 150, 255])));
    let body = multipart_body(&[
        ("threshold", None, &b"100"[..]),
        ("image", Some("grey.png"), input.as_slice()),
    ]);

    let (status, _, bytes) = send(router(), upload_request("/api/remove-background", body)).await;
    assert_eq!(status, StatusCode::OK);

    let out = codec::decode(&bytes).unwrap().image.to_rgba8();
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[tokio::test]
async fn test_remove_background_invalid_threshold() {
    let input = png(&RgbaImage::new(1, 1));
    let body = multipart_body(&[
        ("image", Some("a.png"), input.as_slice()),
        ("threshold", None, &b"999"[..]),
    ]);

    let (status, content_type, _) =
        send(router(), upload_request("/api/remove-background", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, "application/json");
}

#[tokio::test]
async fn test_denoise_single_pixel() {
    let input = png(&RgbaImage::from_pixel(1, 1, Rgba([90, 90, 90, 255])));
    let body = multipart_body(&[("image", Some("dot.png"), input.as_slice())]);

    let (status, content_type, bytes) = send(router(), upload_request("/api/denoise", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/jpeg");

    let decoded = codec::decode(&bytes).unwrap();
    assert_eq!(decoded.format, image::ImageFormat::Jpeg);
    let out = decoded.image.to_rgba8();
    assert_eq!(out.dimensions(), (1, 1));

    // 90 / 9 = 10, within JPEG rounding
    let px = out.get_pixel(0, 0).0;
    for c in &px[..3] {
        assert!(c.abs_diff(10) <= 2, "channel {} not near 10", c);
    }
    assert_eq!(px[3], 255);
}

#[tokio::test]
async fn test_denoise_preserves_dimensions() {
    let input = png(&RgbaImage::from_pixel(17, 9, Rgba([128, 64, 32, 255])));
    let body = multipart_body(&[("image", Some("block.png"), input.as_slice())]);

    let (status, _, bytes) = send(router(), upload_request("/api/denoise", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(codec::decode(&bytes).unwrap().image.to_rgba8().dimensions(), (17, 9));
}

#[tokio::test]
async fn test_response_headers() {
    let input = png(&RgbaImage::new(2, 2));
    let body = multipart_body(&[("image", Some("a.png"), input.as_slice())]);

    let response = router()
        .oneshot(upload_request("/api/remove-background", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(request_id.len(), 36);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains(&format!("remove-background-{}.png", request_id)));
}

#[tokio::test]
async fn test_legacy_aliases() {
    let input = png(&RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])));

    let body = multipart_body(&[("image", Some("a.png"), input.as_slice())]);
    let (status, content_type, _) = send(router(), upload_request("/bg", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/png");

    let body = multipart_body(&[("image", Some("a.png"), input.as_slice())]);
    let (status, content_type, _) = send(router(), upload_request("/upload", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/jpeg");
}

#[tokio::test]
async fn test_get_not_allowed() {
    for uri in ["/api/denoise", "/api/remove-background", "/upload", "/bg"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
    }
}

#[tokio::test]
async fn test_missing_image_field() {
    let body = multipart_body(&[("file", Some("a.png"), &b"whatever"[..])]);
    let (status, _, bytes) = send(router(), upload_request("/api/denoise", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["error"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_not_multipart() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/denoise")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_undecodable_upload() {
    let body = multipart_body(&[("image", Some("a.png"), &b"this is not an image"[..])]);
    let (status, _, bytes) = send(router(), upload_request("/api/denoise", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("Error loading image"));
}

#[tokio::test]
async fn test_upload_limit() {
    let server = WebServer::with_config(ServerConfig::default().with_upload_limit(1024));
    let input = vec![0u8; 4096];
    let body = multipart_body(&[("image", Some("big.png"), input.as_slice())]);

    let response = server
        .router()
        .oneshot(upload_request("/api/denoise", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_staged_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig::default().with_staging_dir(Some(dir.path().join("staging")));
    let server = WebServer::with_config(config);

    let input = png(&RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])));
    let body = multipart_body(&[("image", Some("white.png"), input.as_slice())]);
    let (status, _, bytes) = send(server.router(), upload_request("/api/remove-background", body)).await;

    assert_eq!(status, StatusCode::OK);
    let out = codec::decode(&bytes).unwrap().image.to_rgba8();
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));

    // staged file is gone once the request is done
    let leftover = std::fs::read_dir(dir.path().join("staging")).unwrap().count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, _, bytes) = send(router(), request).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_stats_count_requests() {
    let server = WebServer::new();

    let input = png(&RgbaImage::from_pixel(2, 3, Rgba([1, 2, 3, 255])));
    let body = multipart_body(&[("image", Some("a.png"), input.as_slice())]);
    let (status, _, _) = send(server.router(), upload_request("/api/denoise", body)).await;
    assert_eq!(status, StatusCode::OK);

    let body = multipart_body(&[("image", Some("a.png"), &b"junk"[..])]);
    let (status, _, _) = send(server.router(), upload_request("/api/remove-background", body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder().uri("/api/stats").body(Body::empty()).unwrap();
    let (status, _, bytes) = send(server.router(), request).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["requests"]["total_requests"], 2);
    assert_eq!(json["requests"]["completed_requests"], 1);
    assert_eq!(json["requests"]["failed_requests"], 1);
    assert_eq!(json["requests"]["total_pixels"], 6);
    assert_eq!(json["filters"]["denoise"], 1);
    assert_eq!(json["filters"]["remove_background"], 1);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let server = WebServer::new();
    let mut handles = Vec::new();

    for i in 0..8u8 {
        let router = server.router();
        handles.push(tokio::spawn(async move {
            let value = 40 + i;
            let input = png(&RgbaImage::from_pixel(3, 3, Rgba([value, value, value, 255])));
            let body = multipart_body(&[("image", Some("a.png"), input.as_slice())]);
            let (status, _, bytes) = send(router, upload_request("/api/remove-background", body)).await;
            assert_eq!(status, StatusCode::OK);
            let out = codec::decode(&bytes).unwrap().image.to_rgba8();
            assert_eq!(out.get_pixel(1, 1).0, [value, value, value, 255]);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

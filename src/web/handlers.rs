// API handlers for the web server

use super::{
    SharedState,
    error::ApiError,
    models::{HealthResponse, ScanRequest},
    redirect::{self, RequestOrigin},
    request_image::decode_image_field,
};
use crate::scan::{ScanResult, scan_image};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
};
use tracing::{debug, info};
use uuid::Uuid;

// --- POST /scan ---
// Decodes the submitted frame and looks for a barcode in its variants
pub async fn scan(
    State(state): State<SharedState>,
    headers: HeaderMap,
    uri: Uri,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let image_field = request
        .image
        .ok_or_else(|| ApiError::BadRequest("No image data provided".to_string()))?;

    let request_id = Uuid::new_v4();
    debug!(
        "Scan request: request_id={}, image_field_len={}, redirect={}",
        request_id,
        image_field.len(),
        request.redirect
    );

    // Decoding and the variant sweep are CPU bound
    let task_state = state.clone();
    let located = tokio::task::spawn_blocking(move || {
        let image = decode_image_field(&image_field)?;
        scan_image(
            image,
            task_state.detector.as_ref(),
            task_state.debug_persister.as_ref(),
        )
    })
    .await??;

    match &located {
        Some(symbol) => info!(
            "Scan succeeded: request_id={}, type={}, variant={}",
            request_id, symbol.family, symbol.variant
        ),
        None => info!("Scan found no symbol: request_id={}", request_id),
    }

    if request.redirect {
        if let Some(symbol) = &located {
            let origin = RequestOrigin::from_parts(&headers, &uri);
            let location =
                state
                    .redirect_template
                    .render(&symbol.data, &origin.scheme, &origin.host);
            debug!("Redirecting: request_id={}, location={}", request_id, location);
            return redirect::found(&location);
        }
    }

    Ok(Json(ScanResult::from(located)).into_response())
}

// --- GET /health ---
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[cfg(test)]
mod tests {
    use crate::scan::{DebugPersister, DetectorChain, SymbolDetector};
    use crate::scan::fixtures;
    use crate::web::{
        AppOptions, MAX_REQUEST_SIZE_BYTES, create_app,
        test_support::{FixedDetector, png_base64, state},
    };
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use http_body_util::BodyExt;
    use image::{DynamicImage, Rgb, RgbImage};
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn app(detector: impl SymbolDetector + 'static, template: &str) -> Router {
        app_with_persister(detector, template, None)
    }

    fn app_with_persister(
        detector: impl SymbolDetector + 'static,
        template: &str,
        persister: Option<DebugPersister>,
    ) -> Router {
        create_app(
            state(detector, template, persister),
            AppOptions {
                static_dir: PathBuf::from("static"),
                request_timeout: None,
            },
        )
    }

    fn frame() -> String {
        png_base64(&DynamicImage::ImageRgb8(RgbImage::from_fn(24, 24, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 128])
        })))
    }

    async fn post_scan(app: Router, body: Value) -> Response {
        app.oneshot(
            Request::post("/scan")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::HOST, "scanner.local:5555")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_no_symbol_reports_failure() {
        let response = post_scan(app(FixedDetector::none(), "http://x/{code}"), json!({ "image": frame() })).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "success": false }));
    }

    #[tokio::test]
    async fn test_symbol_is_reported() {
        let detector = FixedDetector::text("https://example.org/item/42", "QRCODE");
        let response = post_scan(app(detector, "http://x/{code}"), json!({ "image": frame() })).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "data": "https://example.org/item/42", "type": "QRCODE" })
        );
    }

    #[tokio::test]
    async fn test_data_url_prefix_matches_bare_payload() {
        let payload = frame();
        let bare = post_scan(
            app(FixedDetector::text("abc", "QRCODE"), "http://x/{code}"),
            json!({ "image": payload }),
        )
        .await;
        let prefixed = post_scan(
            app(FixedDetector::text("abc", "QRCODE"), "http://x/{code}"),
            json!({ "image": format!("data:image/jpeg;base64,{}", payload) }),
        )
        .await;

        assert_eq!(bare.status(), prefixed.status());
        assert_eq!(body_json(bare).await, body_json(prefixed).await);
    }

    #[tokio::test]
    async fn test_same_input_same_result() {
        let router = app(FixedDetector::text("987654", "QRCODE"), "http://x/{code}");
        let payload = frame();

        let first = body_json(post_scan(router.clone(), json!({ "image": payload })).await).await;
        let second = body_json(post_scan(router, json!({ "image": payload })).await).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_image_is_bad_request() {
        let response = post_scan(app(FixedDetector::none(), "http://x/{code}"), json!({ "redirect": true })).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "No image data provided" })
        );
    }

    #[tokio::test]
    async fn test_malformed_base64_is_bad_request() {
        let response = post_scan(
            app(FixedDetector::none(), "http://x/{code}"),
            json!({ "image": "data:image/png;base64,***" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_non_image_payload_is_bad_request() {
        let response = post_scan(
            app(FixedDetector::none(), "http://x/{code}"),
            json!({ "image": STANDARD.encode(b"definitely not pixels") }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid image data"));
    }

    #[tokio::test]
    async fn test_non_utf8_payload_is_bad_request() {
        let detector = FixedDetector(vec![crate::scan::detector::DetectedSymbol {
            payload: vec![0xc3, 0x28],
            family: "QRCODE".to_string(),
        }]);
        let response = post_scan(app(detector, "http://x/{code}"), json!({ "image": frame() })).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let response = app(FixedDetector::none(), "http://x/{code}")
            .oneshot(
                Request::post("/scan")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let response = app(FixedDetector::none(), "http://x/{code}")
            .oneshot(
                Request::post("/scan")
                    .body(Body::from(json!({ "image": frame() }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let mut body = br#"{"image":""#.to_vec();
        body.resize(MAX_REQUEST_SIZE_BYTES + 1, b'A');
        let response = app(FixedDetector::none(), "http://x/{code}")
            .oneshot(
                Request::post("/scan")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_redirect_on_success() {
        let detector = FixedDetector::text("4006381333931", "EAN13");
        let response = post_scan(
            app(detector, "http://x/{code}"),
            json!({ "image": frame(), "redirect": true }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "http://x/4006381333931");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_uses_request_origin() {
        let detector = FixedDetector::text("XYZ", "QRCODE");
        let response = post_scan(
            app(detector, "{protocol}://{host}/search/{code}"),
            json!({ "image": frame(), "redirect": true }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://scanner.local:5555/search/XYZ"
        );
    }

    #[tokio::test]
    async fn test_redirect_falls_back_to_json_on_failure() {
        let response = post_scan(
            app(FixedDetector::none(), "http://x/{code}"),
            json!({ "image": frame(), "redirect": true }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::LOCATION));
        assert_eq!(body_json(response).await, json!({ "success": false }));
    }

    #[tokio::test]
    async fn test_unusable_redirect_url_is_internal_error() {
        let detector = FixedDetector::text("line\nbreak", "QRCODE");
        let response = post_scan(
            app(detector, "http://x/{code}"),
            json!({ "image": frame(), "redirect": true }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_debug_images_are_written() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("copies");
        let router = app_with_persister(
            FixedDetector::none(),
            "http://x/{code}",
            Some(DebugPersister::new(&dir)),
        );

        let response = post_scan(router, json!({ "image": frame() })).await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 5);
        assert!(names.iter().all(|n| n.starts_with("scan_") && n.ends_with(".png")));
        assert!(names.iter().any(|n| n.ends_with("_1_original.png")));
        assert!(names.iter().any(|n| n.ends_with("_5_sharpened.png")));
    }

    #[tokio::test]
    async fn test_debug_failure_does_not_fail_request() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("occupied");
        std::fs::write(&blocker, b"x").unwrap();
        let router = app_with_persister(
            FixedDetector::text("ok", "QRCODE"),
            "http://x/{code}",
            Some(DebugPersister::new(blocker.join("copies"))),
        );

        let response = post_scan(router, json!({ "image": frame() })).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "data": "ok", "type": "QRCODE" })
        );
    }

    #[tokio::test]
    async fn test_decodes_real_barcode() {
        let image = DynamicImage::ImageLuma8(fixtures::ean13_image("4006381333931", 4));
        let response = post_scan(
            app(DetectorChain::standard(), "http://x/{code}"),
            json!({ "image": format!("data:image/png;base64,{}", png_base64(&image)) }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "data": "4006381333931", "type": "EAN13" })
        );
    }

    #[tokio::test]
    async fn test_real_qr_code_redirects() {
        let image = DynamicImage::ImageLuma8(fixtures::qr_image("A-1001", 4));
        let response = post_scan(
            app(DetectorChain::standard(), "{protocol}://{host}/item/{code}"),
            json!({ "image": png_base64(&image), "redirect": true }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://scanner.local:5555/item/A-1001"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(FixedDetector::none(), "http://x/{code}")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
    }
}

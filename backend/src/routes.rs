use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use serde_json::json;

use crate::error::ApiError;
use crate::model::{ClassifyParams, ClassifyQuery, ImageSubmission};
use crate::service::ClassificationService;
use crate::storage::validator::{validate_extension, validate_size};

const IMAGE_FIELD: &str = "image_file";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::InvalidRequest(err.to_string()).into()),
    )
    .service(web::resource("/").route(web::get().to(root)))
    .service(web::resource("/classify").route(web::post().to(classify)));
}

async fn root(service: web::Data<ClassificationService>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Skin Tone Classifier API",
        "version": env!("CARGO_PKG_VERSION"),
        "eyes_enabled": service.eye_feature_enabled(),
        "endpoints": {
            "classify": "POST /classify — skin tone (label, color, confidence) + eyes (darkcircle, eyebag + confidence)",
        },
    }))
}

async fn classify(
    service: web::Data<ClassificationService>,
    query: web::Query<ClassifyQuery>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let params = ClassifyParams::from_query(query.into_inner(), service.confidence_min_default())?;
    let submission = read_image_field(&mut payload, service.max_upload_bytes()).await?;

    let response = service.classify(&submission, &params).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Pulls the `image_file` part out of the form. The filename is checked
/// before any of the body is buffered.
async fn read_image_field(
    payload: &mut Multipart,
    limit: usize,
) -> Result<ImageSubmission, ApiError> {
    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        validate_extension(&filename)?;

        let mut content = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            validate_size(content.len() + chunk.len(), limit)?;
            content.extend_from_slice(&chunk);
        }

        return Ok(ImageSubmission::new(filename, content)?);
    }

    Err(ApiError::InvalidRequest(format!("Missing form field: {}", IMAGE_FIELD)))
}

fn malformed(err: MultipartError) -> ApiError {
    ApiError::InvalidRequest(format!("Malformed multipart body: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eyes::adapter::EyeAttributeAdapter;
    use crate::eyes::adapter::tests::FakeEyeDetector;
    use crate::storage::scoped_store::ScopedImageStore;
    use crate::storage::scoped_store::tests::{entries, scratch_dir};
    use crate::tone::adapter::ToneAdapter;
    use crate::tone::adapter::tests::FakeToneClassifier;
    use actix_web::http::StatusCode;
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::{test, App};
    use serde_json::Value;
    use shared::TonePalette;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    const BOUNDARY: &str = "skintone-test-boundary";

    fn multipart(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(uri: &str, body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}")))
            .set_payload(body)
    }

    fn light_face() -> Arc<FakeToneClassifier> {
        Arc::new(FakeToneClassifier::returning(vec![(
            Some("Light"),
            Some("#E5C8A6"),
            Some(87.4213),
        )]))
    }

    fn service(
        dir: &Path,
        tone: Arc<FakeToneClassifier>,
        eyes: Option<FakeEyeDetector>,
    ) -> ClassificationService {
        ClassificationService::new(
            ScopedImageStore::new(dir),
            ToneAdapter::new(tone),
            eyes.map(|detector| {
                EyeAttributeAdapter::new(Arc::new(detector), Duration::from_secs(5))
            }),
            64,
            0.30,
        )
    }

    macro_rules! app {
        ($service:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($service))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn classify_without_detector_returns_results_only() {
        let dir = scratch_dir();
        let app = app!(service(&dir, light_face(), None));

        let req = upload("/classify", multipart("image_file", "face.jpg", b"jpeg")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({"results": [{"label": "Light", "color": "#E5C8A6", "confidence": 87.42}]})
        );
        assert_eq!(entries(&dir), 0);
    }

    #[actix_web::test]
    async fn classify_with_detector_reports_eyes() {
        let dir = scratch_dir();
        let detector = FakeEyeDetector::returning(&[("darkcircle", 0.55), ("Eyebag", 0.10)]);
        let app = app!(service(&dir, light_face(), Some(detector)));

        let req = upload(
            "/classify?confidence_min=0.30",
            multipart("image_file", "face.png", b"png"),
        );
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["eyes"],
            json!({
                "darkcircle": true,
                "darkcircle_confidence": 0.55,
                "eyebag": false,
                "eyebag_confidence": 0.0,
            })
        );
    }

    #[actix_web::test]
    async fn query_parameters_reach_both_classifiers() {
        let dir = scratch_dir();
        let tone = light_face();
        let detector = FakeEyeDetector::returning(&[("darkcircle", 0.55), ("Eyebag", 0.10)]);
        let app = app!(service(&dir, tone.clone(), Some(detector)));

        let req = upload(
            "/classify?confidence_min=0.05&tone_palette=monk",
            multipart("image_file", "face.jpg", b"jpeg"),
        );
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["eyes"],
            json!({
                "darkcircle": true,
                "darkcircle_confidence": 0.55,
                "eyebag": true,
                "eyebag_confidence": 0.1,
            })
        );
        assert_eq!(tone.calls.lock().unwrap()[0].1, TonePalette::Monk);
        assert_eq!(entries(&dir), 0);
    }

    #[actix_web::test]
    async fn detector_failure_keeps_default_eyes() {
        let dir = scratch_dir();
        let app = app!(service(&dir, light_face(), Some(FakeEyeDetector::Failing)));

        let req = upload("/classify", multipart("image_file", "face.webp", b"x")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["eyes"],
            json!({
                "darkcircle": false,
                "darkcircle_confidence": 0.0,
                "eyebag": false,
                "eyebag_confidence": 0.0,
            })
        );
    }

    #[actix_web::test]
    async fn unsupported_extension_is_rejected_without_storage() {
        let dir = scratch_dir();
        let tone = light_face();
        let app = app!(service(&dir, tone.clone(), None));

        let req = upload("/classify", multipart("image_file", "face.bmp", b"bmp")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["detail"],
            "Invalid file type. Allowed: .jpg, .jpeg, .png, .gif, .webp, .tif"
        );
        assert!(tone.calls.lock().unwrap().is_empty());
        assert_eq!(entries(&dir), 0);
    }

    #[actix_web::test]
    async fn tone_failure_is_a_server_error() {
        let dir = scratch_dir();
        let tone = Arc::new(FakeToneClassifier::failing("no face detected"));
        let app = app!(service(&dir, tone, None));

        let req = upload("/classify", multipart("image_file", "face.jpeg", b"x")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "no face detected");
        assert_eq!(entries(&dir), 0);
    }

    #[actix_web::test]
    async fn oversized_upload_is_rejected() {
        let dir = scratch_dir();
        let app = app!(service(&dir, light_face(), None));

        let req = upload("/classify", multipart("image_file", "face.jpg", &[0u8; 65])).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(entries(&dir), 0);
    }

    #[actix_web::test]
    async fn malformed_requests_are_unprocessable() {
        let dir = scratch_dir();
        let app = app!(service(&dir, light_face(), None));

        let req = upload("/classify", multipart("photo", "face.jpg", b"x")).to_request();
        let missing = test::call_service(&app, req).await;
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(missing).await;
        assert_eq!(body["detail"], "Missing form field: image_file");

        for uri in [
            "/classify?confidence_min=1.5",
            "/classify?confidence_min=high",
            "/classify?tone_palette=sepia",
        ] {
            let req = upload(uri, multipart("image_file", "face.jpg", b"x")).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert!(body["detail"].is_string());
        }
    }

    #[actix_web::test]
    async fn root_describes_the_service() {
        let dir = scratch_dir();
        let app = app!(service(&dir, light_face(), Some(FakeEyeDetector::returning(&[]))));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Skin Tone Classifier API");
        assert_eq!(body["eyes_enabled"], true);
        assert!(body["endpoints"]["classify"].as_str().unwrap().starts_with("POST /classify"));
    }
}

//! Integration tests for the API.
//!
//! The router runs against a temporary registry and a scripted execution
//! engine, so no ONNX model is needed.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use onnxai_api::{build_router, ApiConfig, AppState};
use onnxai_model_cache::{ModelPath, ModelRegistry};
use onnxai_onnx_loader::ModelOutput;
use onnxai_pipeline::{
    ExecutionEngine, ImageClassifier, LabelMap, PipelineError, PreprocessConfig,
};

const BOUNDARY: &str = "onnxai-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([120, 60, 30]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

struct FixedScores(Vec<f32>);

#[async_trait]
impl ExecutionEngine for FixedScores {
    async fn execute(&self, _model: &ModelPath, _input: Array4<f32>) -> onnxai_pipeline::Result<ModelOutput> {
        Ok(ModelOutput {
            name: "logits".to_string(),
            shape: vec![1, self.0.len() as i64],
            data: self.0.clone(),
        })
    }
}

struct Broken;

#[async_trait]
impl ExecutionEngine for Broken {
    async fn execute(&self, _model: &ModelPath, _input: Array4<f32>) -> onnxai_pipeline::Result<ModelOutput> {
        Err(PipelineError::ExecutionFailed("session creation failed".to_string()))
    }
}

struct TestApp {
    _root: TempDir,
    router: axum::Router,
}

fn test_app_with(engine: Arc<dyn ExecutionEngine>) -> TestApp {
    let root = TempDir::new().unwrap();
    let leaf = root.path().join("v1").join("mobilenetv2").join("base");
    std::fs::create_dir_all(&leaf).unwrap();
    std::fs::write(leaf.join("model.onnx"), b"stub").unwrap();
    std::fs::write(leaf.join("model.json"), br#"{"num_classes": 3}"#).unwrap();

    let labels = LabelMap::from_json_str(r#"{"0": "cat", "1": "dog", "2": "bird"}"#).unwrap();
    let classifier = ImageClassifier::new(
        ModelRegistry::new(root.path()),
        Arc::new(labels),
        engine,
        PreprocessConfig::default(),
        2,
    );

    let config = ApiConfig {
        assets_dir: root.path().join("assets"),
        ..ApiConfig::default()
    };

    TestApp {
        router: build_router(AppState::new(Arc::new(classifier), config)),
        _root: root,
    }
}

fn test_app() -> TestApp {
    test_app_with(Arc::new(FixedScores(vec![0.1, 0.3, 0.6])))
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_predict_returns_label() {
    let app = test_app();
    let image = png(640, 480);

    let response = app
        .router
        .oneshot(multipart_request(
            "/predict",
            &[
                Part::Text("model_name", "v1/mobilenetv2/base/model.onnx"),
                Part::File("input_data", "bird.png", &image),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["model"], "v1/mobilenetv2/base/model.onnx");
    assert_eq!(body["filename"], "bird.png");
    assert_eq!(body["size"], image.len());
    assert_eq!(body["class_index"], 2);
    assert_eq!(body["label"], "bird");
    assert!(body.get("scores").is_none());
}

#[tokio::test]
async fn test_predict_include_scores() {
    let app = test_app();
    let image = png(16, 16);

    let response = app
        .router
        .oneshot(multipart_request(
            "/predict",
            &[
                Part::Text("model_name", "v1/mobilenetv2/base"),
                Part::Text("include_scores", "true"),
                Part::File("input_data", "x.png", &image),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["scores"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_predict_invalid_image_is_400() {
    let app = test_app();

    let response = app
        .router
        .oneshot(multipart_request(
            "/predict",
            &[
                Part::Text("model_name", "v1/mobilenetv2/base"),
                Part::File("input_data", "notes.txt", b"hello"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["title"], "Bad Request");
}

#[tokio::test]
async fn test_predict_unknown_model_is_404() {
    let app = test_app();
    let image = png(8, 8);

    for model in [
        "v1/mobilenetv2/large",
        "../../etc/passwd",
        "v1/mobilenetv2/base/model.json",
    ] {
        let response = app
            .router
            .clone()
            .oneshot(multipart_request(
                "/predict",
                &[
                    Part::Text("model_name", model),
                    Part::File("input_data", "x.png", &image),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "model {}", model);
    }
}

#[tokio::test]
async fn test_predict_missing_fields_is_400() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/predict",
            &[Part::Text("model_name", "v1/mobilenetv2/base")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["errors"]["input_data"], "field is required");

    let image = png(8, 8);
    let response = app
        .router
        .oneshot(multipart_request(
            "/predict",
            &[Part::File("input_data", "x.png", &image)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_not_multipart_is_400() {
    let app = test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_execution_failure_is_500() {
    let app = test_app_with(Arc::new(Broken));
    let image = png(8, 8);

    let response = app
        .router
        .oneshot(multipart_request(
            "/predict",
            &[
                Part::Text("model_name", "v1/mobilenetv2/base"),
                Part::File("input_data", "x.png", &image),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_batch_reports_each_file() {
    let app = test_app();
    let good = png(32, 64);

    let response = app
        .router
        .oneshot(multipart_request(
            "/predict/batch",
            &[
                Part::Text("model_name", "v1/mobilenetv2/base"),
                Part::File("input_files", "a.png", &good),
                Part::File("input_files", "b.txt", b"not an image"),
                Part::File("input_files", "c.png", &good),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["filename"], "a.png");
    assert_eq!(results[0]["label"], "bird");
    assert!(results[1]["error"].as_str().unwrap().contains("Invalid image"));
    assert!(results[1].get("label").is_none());
    assert_eq!(results[2]["class_index"], 2);
}

#[tokio::test]
async fn test_batch_unknown_model_is_404() {
    let app = test_app();
    let image = png(8, 8);

    let response = app
        .router
        .oneshot(multipart_request(
            "/predict/batch",
            &[
                Part::Text("model_name", "v9/none/none"),
                Part::File("input_files", "a.png", &image),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registry_listing_and_entry() {
    let app = test_app();

    let response = app.router.clone().oneshot(get("/registry")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let entry = &body["v1"]["mobilenetv2"]["base"];
    assert_eq!(entry["onnx"], "v1/mobilenetv2/base/model.onnx");
    assert_eq!(entry["metadata"]["status"], "present");
    assert_eq!(entry["metadata"]["value"]["num_classes"], 3);

    let response = app
        .router
        .clone()
        .oneshot(get("/registry/v1/mobilenetv2/base"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["model_name"], "base");

    let response = app
        .router
        .oneshot(get("/registry/v1/mobilenetv2/missing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registry_root_missing_is_404() {
    let root = TempDir::new().unwrap();
    let classifier = ImageClassifier::new(
        ModelRegistry::new(root.path().join("absent")),
        Arc::new(LabelMap::empty()),
        Arc::new(FixedScores(vec![1.0])),
        PreprocessConfig::default(),
        1,
    );
    let router = build_router(AppState::new(Arc::new(classifier), ApiConfig::default()));

    let response = router.oneshot(get("/registry")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favicon_missing_is_404() {
    let app = test_app();
    let response = app.router.oneshot(get("/favicon.ico")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document() {
    let app = test_app();
    let response = app.router.oneshot(get("/api-doc/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"].get("/predict").is_some());
    assert!(body["paths"].get("/registry").is_some());
}

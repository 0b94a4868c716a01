//! Integration tests for ONNX session loading and inference
//!
//! `fixtures/mean_pool.onnx` takes `pixel_values` [1,3,224,224] and returns
//! `logits` (per-channel mean) and `peak` (per-channel max), both [1,3].
//! Regenerate it with `fixtures/make_fixtures.py`.

use ndarray::Array4;
use onnxai_onnx_loader::{ExecutionBackend, OnnxError, OnnxSession, SessionOptions};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn cpu_options() -> SessionOptions {
    SessionOptions {
        intra_threads: 1,
        execution_providers: vec![ExecutionBackend::Cpu],
    }
}

/// Each channel filled with its own constant
fn channel_tensor(values: [f32; 3]) -> Array4<f32> {
    Array4::from_shape_fn((1, 3, 224, 224), |(_, c, _, _)| values[c])
}

#[test]
fn test_load_nonexistent_model() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("missing").join("model.onnx");

    let result = OnnxSession::load(&model_path);

    match result {
        Err(OnnxError::ModelNotFound(path)) => assert_eq!(path, model_path),
        other => panic!("Expected ModelNotFound, got {:?}", other),
    }
}

#[test]
fn test_load_directory_is_not_a_model() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let result = OnnxSession::load(temp_dir.path());

    assert!(matches!(result, Err(OnnxError::ModelNotFound(_))));
}

#[test]
fn test_load_corrupt_model_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.onnx");
    std::fs::write(&model_path, b"this is not a protobuf graph").expect("Failed to write model");

    let options = SessionOptions {
        intra_threads: 1,
        execution_providers: vec![ExecutionBackend::Cpu],
    };
    let result = OnnxSession::load_with_options(&model_path, &options);

    assert!(
        matches!(result, Err(OnnxError::ModelLoadFailed(_))),
        "Corrupt model should fail to load: {:?}",
        result
    );
}

#[test]
fn test_load_discovers_input_and_first_output() {
    let session = OnnxSession::load(fixture("mean_pool.onnx")).expect("Failed to load fixture");

    assert_eq!(session.input_name(), "pixel_values");
    assert_eq!(session.output_name(), "logits");
    assert_eq!(session.model_path(), fixture("mean_pool.onnx").as_path());
}

#[test]
fn test_run_returns_first_output() {
    let session =
        OnnxSession::load_with_options(fixture("mean_pool.onnx"), &cpu_options()).expect("load");

    let output = session.run(channel_tensor([-1.0, 0.5, 0.25])).expect("Inference failed");

    assert_eq!(output.name, "logits");
    assert_eq!(output.shape, vec![1, 3]);
    assert_eq!(output.data.len(), 3);
    for (got, want) in output.data.iter().zip([-1.0f32, 0.5, 0.25]) {
        assert!((got - want).abs() < 1e-5, "got {} want {}", got, want);
    }
}

#[test]
fn test_run_reuses_session() {
    let session = OnnxSession::load(fixture("mean_pool.onnx")).expect("load");

    let first = session.run(channel_tensor([0.0, 1.0, 0.0])).expect("first run");
    let second = session.run(channel_tensor([1.0, 0.0, 0.0])).expect("second run");

    assert!(first.data[1] > first.data[0]);
    assert!(second.data[0] > second.data[1]);
}

#[test]
fn test_run_rejects_wrong_input_shape() {
    let session = OnnxSession::load(fixture("mean_pool.onnx")).expect("load");

    let result = session.run(Array4::zeros((1, 3, 32, 32)));

    assert!(
        matches!(result, Err(OnnxError::InferenceFailed(_))),
        "Mismatched input shape should fail: {:?}",
        result
    );
}

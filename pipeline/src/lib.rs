//! OnnxAI classification pipeline
//!
//! Turns encoded image bytes into a class label using an ONNX model from the
//! registry:
//!
//! 1. **Decode** to 3-channel RGB (`image`)
//! 2. **Orient** portrait images 90° clockwise
//! 3. **Resize** the longest edge to 224
//! 4. **Pad** to 224×224 with zeros, centered
//! 5. **Tensor** `[1, 3, 224, 224]` f32 in `[-1, 1]`
//! 6. **Execute** through an [`ExecutionEngine`] (ONNX Runtime by default)
//! 7. **Map** the arg-max score to a label
//!
//! # Example
//!
//! ```no_run
//! use onnxai_model_cache::ModelRegistry;
//! use onnxai_onnx_loader::SessionOptions;
//! use onnxai_pipeline::{ImageClassifier, LabelMap, OnnxEngine, PreprocessConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = ImageClassifier::new(
//!     ModelRegistry::new("models"),
//!     Arc::new(LabelMap::from_path("assets/labels.json")?),
//!     Arc::new(OnnxEngine::new(SessionOptions::default(), 4)),
//!     PreprocessConfig::default(),
//!     2,
//! );
//!
//! let bytes = std::fs::read("cat.jpg")?;
//! let result = classifier.classify(bytes, "v1/mobilenetv2/base/model.onnx").await?;
//! println!("{} ({})", result.label, result.class_index);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod engine;
pub mod error;
pub mod postprocess;
pub mod preprocess;
pub mod types;

pub use classifier::ImageClassifier;
pub use engine::{ExecutionEngine, OnnxEngine};
pub use error::{PipelineError, Result};
pub use postprocess::{argmax, LabelMap, UNKNOWN_LABEL};
pub use preprocess::{preprocess, Padding};
pub use types::{ChannelOrder, InferenceResult, PreprocessConfig, TARGET_SIZE};

//! Execution provider selection for ONNX Runtime sessions
//!
//! Converts the serializable [`ExecutionBackend`] list coming from configuration
//! into `ort` execution provider dispatch types. Unsupported providers are
//! logged and skipped; CPU is always appended as the final fallback.

use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
use serde::{Deserialize, Serialize};

/// Execution backend requested by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExecutionBackend {
    /// Default CPU provider
    Cpu,
    /// NVIDIA CUDA (requires the `cuda` feature)
    Cuda {
        #[serde(default)]
        device_id: i32,
    },
}

impl Default for ExecutionBackend {
    fn default() -> Self {
        Self::Cpu
    }
}

impl ExecutionBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda { .. } => "cuda",
        }
    }
}

/// Convert configured backends to ort execution providers
///
/// The returned list is never empty: a CPU provider is appended when the
/// configuration does not already end with one.
pub fn to_ort_providers(backends: &[ExecutionBackend]) -> Vec<ExecutionProviderDispatch> {
    let mut providers = Vec::with_capacity(backends.len() + 1);
    let mut has_cpu = false;

    for backend in backends {
        match convert_backend(backend) {
            Some(provider) => {
                log::info!("Bridged {} provider to ort", backend.name());
                has_cpu |= matches!(backend, ExecutionBackend::Cpu);
                providers.push(provider);
            }
            None => {
                log::warn!(
                    "Provider {} requested but not compiled in, skipping",
                    backend.name()
                );
            }
        }
    }

    if !has_cpu {
        providers.push(CPUExecutionProvider::default().build());
    }

    providers
}

fn convert_backend(backend: &ExecutionBackend) -> Option<ExecutionProviderDispatch> {
    match backend {
        ExecutionBackend::Cpu => Some(CPUExecutionProvider::default().build()),
        ExecutionBackend::Cuda { device_id } => {
            #[cfg(feature = "cuda")]
            {
                let cuda = ort::execution_providers::CUDAExecutionProvider::default()
                    .with_device_id(*device_id);
                log::debug!("Configured CUDA provider on device {}", device_id);
                Some(cuda.build())
            }
            #[cfg(not(feature = "cuda"))]
            {
                log::warn!(
                    "CUDA provider requested for device {} but cuda feature not enabled",
                    device_id
                );
                None
            }
        }
    }
}

/// Shared pipeline types
///
/// Preprocessing settings and the per-image classification result.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length of the square model input
pub const TARGET_SIZE: u32 = 224;

/// Order of the three color planes in the input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Blue, green, red planes (OpenCV decode order)
    #[default]
    Bgr,
    Rgb,
}

impl ChannelOrder {
    /// Source RGB channel index for each output plane
    pub fn source_indices(&self) -> [usize; 3] {
        match self {
            Self::Bgr => [2, 1, 0],
            Self::Rgb => [0, 1, 2],
        }
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bgr => write!(f, "bgr"),
            Self::Rgb => write!(f, "rgb"),
        }
    }
}

impl std::str::FromStr for ChannelOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bgr" => Ok(Self::Bgr),
            "rgb" => Ok(Self::Rgb),
            other => Err(format!("Unknown channel order: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Longest edge after resize, and side of the padded square
    pub target_size: u32,
    pub channel_order: ChannelOrder,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_size: TARGET_SIZE,
            channel_order: ChannelOrder::default(),
        }
    }
}

/// Outcome of classifying one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Model identifier as requested
    pub model: String,
    pub class_index: usize,
    pub label: String,
    /// Raw first-output scores
    pub scores: Vec<f32>,
}

/// Score interpretation: arg-max and label lookup
use crate::error::{PipelineError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Label returned for indices missing from the label table
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Index of the highest score; ties resolve to the lowest index.
///
/// NaN never wins. Returns `None` for an empty or all-NaN slice.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((index, score)),
        }
    }

    best.map(|(index, _)| index)
}

/// Immutable index → label table
///
/// Loaded once from a JSON object whose keys are string-encoded
/// non-negative integers, e.g. `{"0": "cat", "1": "dog"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    labels: HashMap<String, String>,
}

impl LabelMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let labels: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| PipelineError::Labels {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;

        if let Some(bad) = labels.keys().find(|k| k.parse::<usize>().is_err()) {
            log::warn!("Label key '{}' is not a class index and will never match", bad);
        }

        Ok(Self { labels })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| PipelineError::Labels {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let map = Self::from_json_str(&contents).map_err(|e| match e {
            PipelineError::Labels { reason, .. } => PipelineError::Labels {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;

        log::info!("Loaded {} class labels from {:?}", map.len(), path);
        Ok(map)
    }

    /// Label for `index`, or [`UNKNOWN_LABEL`]
    pub fn label_for(&self, index: usize) -> &str {
        self.labels
            .get(&index.to_string())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(usize, String)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (usize, String)>>(iter: T) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|(index, label)| (index.to_string(), label))
                .collect(),
        }
    }
}

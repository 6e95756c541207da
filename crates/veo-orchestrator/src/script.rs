//! Script splitting and reference image assignment.

use std::sync::LazyLock;

use regex::Regex;

use veo_models::{ReferenceImage, VideoMode};

use crate::error::{OrchestratorError, OrchestratorResult};

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]").unwrap());

/// Split a script into prompt units: one per non-blank line, trimmed, in order.
pub fn split_script(script: &str) -> OrchestratorResult<Vec<String>> {
    let units: Vec<String> = script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if units.is_empty() {
        return Err(OrchestratorError::EmptyInput);
    }
    Ok(units)
}

/// Collect every `[...]` segment of a drafted script, in order.
///
/// Drafting tools return prose with the shot prompts in square brackets;
/// the result is one prompt per line, ready for [`split_script`].
pub fn extract_bracketed_prompts(text: &str) -> Vec<String> {
    BRACKETED
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Reference images uploaded for a run, handed out per prompt unit.
#[derive(Debug, Clone, Default)]
pub struct ReferencePool {
    images: Vec<ReferenceImage>,
}

impl ReferencePool {
    pub fn new(images: Vec<ReferenceImage>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Images for the unit at `index`.
    ///
    /// ImageToVideo takes image `index`; Interpolation takes the pair
    /// `2*index`, `2*index+1`; Consistency shares every image; TextToVideo
    /// takes none. Missing slots are skipped, so a short pool yields a
    /// request that fails validation rather than a shifted pairing.
    pub fn assets_for(&self, mode: VideoMode, index: usize) -> Vec<ReferenceImage> {
        match mode {
            VideoMode::TextToVideo => Vec::new(),
            VideoMode::ImageToVideo => self.images.get(index).cloned().into_iter().collect(),
            VideoMode::Interpolation => [index * 2, index * 2 + 1]
                .iter()
                .filter_map(|i| self.images.get(*i).cloned())
                .collect(),
            VideoMode::Consistency => self.images.clone(),
        }
    }
}

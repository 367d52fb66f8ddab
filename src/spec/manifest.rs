//! Capture manifest types.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Manifest of captured scenes, produced by an external capture collaborator.
///
/// The reconciliation core only consumes this: figure blocks resolve their
/// `figure_id` against the scene list, and `degraded` flags are surfaced as
/// informational trace data without suppressing the figure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureManifest {
    /// Captured scenes in capture order
    #[serde(default)]
    pub scenes: Vec<Scene>,

    /// Page capability flags detected during capture
    #[serde(default)]
    pub capabilities: HashMap<String, bool>,
}

impl CaptureManifest {
    /// Load a manifest from a JSON file.
    ///
    /// A missing file is not an error: capture is optional, so it loads as
    /// an empty manifest.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Map of figure id to scene.
    pub fn scene_map(&self) -> HashMap<&str, &Scene> {
        self.scenes
            .iter()
            .map(|s| (s.figure_id.as_str(), s))
            .collect()
    }

    /// Check if the manifest has no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// One captured scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Stable identifier referenced by figure blocks
    pub figure_id: String,

    /// Scene kind (e.g. "overview", "flow_step")
    #[serde(default)]
    pub scene_type: String,

    /// Capture file name
    #[serde(default)]
    pub file: String,

    /// Image path relative to the document base directory
    #[serde(default)]
    pub image_rel: String,

    /// URL the scene was captured from
    #[serde(default)]
    pub source_url: String,

    /// Capture confidence score in 0.0..=1.0
    #[serde(default)]
    pub confidence: f64,

    /// Whether a fallback capture strategy was used
    #[serde(default)]
    pub degraded: bool,

    /// Caption override, when the capture step supplied one
    #[serde(default)]
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest: CaptureManifest = serde_json::from_str(
            r#"{
                "scenes": [
                    {"figure_id": "home", "scene_type": "overview", "file": "home.png",
                     "image_rel": "shots/home.png", "source_url": "https://example.com",
                     "confidence": 0.9, "degraded": false},
                    {"figure_id": "search", "scene_type": "flow_step", "file": "search.png",
                     "image_rel": "shots/search.png", "source_url": "https://example.com/s",
                     "confidence": 0.4, "degraded": true, "caption": "Search results"}
                ],
                "capabilities": {"has_search": true}
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.scenes.len(), 2);
        assert!(manifest.capabilities["has_search"]);

        let map = manifest.scene_map();
        assert!(map["search"].degraded);
        assert_eq!(map["search"].caption.as_deref(), Some("Search results"));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let manifest = CaptureManifest::from_file("/nonexistent/manifest.json").unwrap();
        assert!(manifest.is_empty());
    }
}

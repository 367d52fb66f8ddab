//! Content specification types for manual generation.
//!
//! This module defines the intermediate representation consumed by the
//! reconcilers and the flat renderers: the [`ManualSpec`] (sections of
//! typed content blocks) and the [`CaptureManifest`] (captured scenes
//! referenced by figure blocks). Both are JSON-shaped inputs produced by
//! external collaborators; the reconciliation core consumes them read-only.

mod manifest;
mod manual;

pub use manifest::{CaptureManifest, Scene};
pub use manual::{Block, ManualSpec, Meta, Section, Trace};

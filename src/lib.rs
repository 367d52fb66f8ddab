//! # manualsync
//!
//! Reconciliation engine that synchronizes a declarative manual spec into
//! an existing styled DOCX document without regenerating it.
//!
//! The spec is a versioned JSON description of sections and typed content
//! blocks (paragraphs, bullet lists, numbered lists, tables, figures). The
//! target document keeps its styles, numbering definitions, and layout;
//! only block content is grown, shrunk, and overwritten to match the spec.
//! Repeated runs converge: the second pass reports zero content changes.
//!
//! Two anchoring strategies are supported:
//!
//! - **Token mode**: the document carries `MANUAL_BLOCK:<id>` /
//!   `MANUAL_FIG:<id>` placeholder paragraphs (as emitted by the
//!   [`render`] module) and each is replaced by the block it names.
//! - **Legacy mode**: no tokens; anchors are inferred from heading text
//!   with fuzzy matching, and content comes from the companion LaTeX
//!   source.
//!
//! ## Quick Start
//!
//! ```no_run
//! use manualsync::{ManualSpec, ManualSync};
//!
//! fn main() -> manualsync::Result<()> {
//!     let spec = ManualSpec::from_file("manual_spec.json")?;
//!     spec.validate()?;
//!
//!     let report = ManualSync::new()
//!         .with_base_dir("out")
//!         .sync_spec("manual_styled.docx", &spec)?;
//!     println!("changes: {}", report.changed);
//!     Ok(())
//! }
//! ```

pub mod docx;
pub mod error;
pub mod render;
pub mod spec;
pub mod sync;

pub use docx::DocxDocument;
pub use error::{Error, Result};
pub use render::{apply_template, to_latex, to_markdown};
pub use spec::{Block, CaptureManifest, ManualSpec, Meta, Scene, Section, Trace};
pub use sync::{
    LatexSource, LegacyLayout, LegacyReconciler, Reconciler, SyncMode, SyncReport, TokenReconciler,
};

use std::path::{Path, PathBuf};

/// Load a spec and reconcile it into a DOCX file in token mode.
///
/// The document is overwritten in place; images resolve against the spec
/// file's directory.
pub fn sync_file<P: AsRef<Path>, Q: AsRef<Path>>(docx: P, spec_path: Q) -> Result<SyncReport> {
    let spec = ManualSpec::from_file(&spec_path)?;
    let base_dir = spec_path
        .as_ref()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    ManualSync::new().with_base_dir(base_dir).sync_spec(docx, &spec)
}

/// Reconcile a LaTeX source into a DOCX file in legacy mode, using the
/// default layout vocabulary.
pub fn sync_latex_file<P: AsRef<Path>, Q: AsRef<Path>>(docx: P, tex_path: Q) -> Result<SyncReport> {
    let tex = LatexSource::from_file(&tex_path)?;
    let base_dir = tex_path
        .as_ref()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    ManualSync::new().with_base_dir(base_dir).sync_latex(docx, &tex)
}

/// Builder for reconciliation runs.
///
/// # Example
///
/// ```no_run
/// use manualsync::{LatexSource, ManualSync};
///
/// let tex = LatexSource::from_file("main.tex").unwrap();
/// let report = ManualSync::new()
///     .with_base_dir(".")
///     .with_out("manual_updated.docx")
///     .sync_latex("manual_styled.docx", &tex)
///     .unwrap();
/// println!("inserted_blocks: {}", report.inserted_blocks);
/// ```
pub struct ManualSync {
    base_dir: PathBuf,
    out: Option<PathBuf>,
    layout: LegacyLayout,
    dry_run: bool,
}

impl ManualSync {
    /// Create a builder with the default layout, writing in place.
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            out: None,
            layout: LegacyLayout::default(),
            dry_run: false,
        }
    }

    /// Directory figure image paths resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Write the result to a separate file instead of in place.
    pub fn with_out(mut self, out: impl Into<PathBuf>) -> Self {
        self.out = Some(out.into());
        self
    }

    /// Layout vocabulary for legacy mode.
    pub fn with_layout(mut self, layout: LegacyLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Reconcile without writing anything back.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Token-mode reconciliation of a spec into a DOCX file.
    pub fn sync_spec<P: AsRef<Path>>(&self, docx: P, spec: &ManualSpec) -> Result<SyncReport> {
        let mut doc = DocxDocument::open(&docx)?;
        let report = TokenReconciler::new(spec, &self.base_dir).reconcile(&mut doc)?;
        self.finish(doc, docx.as_ref(), &report)?;
        Ok(report)
    }

    /// Legacy-mode reconciliation of a LaTeX source into a DOCX file.
    pub fn sync_latex<P: AsRef<Path>>(&self, docx: P, tex: &LatexSource) -> Result<SyncReport> {
        let mut doc = DocxDocument::open(&docx)?;
        let report =
            LegacyReconciler::new(tex, &self.layout, &self.base_dir).reconcile(&mut doc)?;
        self.finish(doc, docx.as_ref(), &report)?;
        Ok(report)
    }

    fn finish(&self, mut doc: DocxDocument, source: &Path, report: &SyncReport) -> Result<()> {
        if self.dry_run {
            log::info!("dry run, not writing output");
            return Ok(());
        }
        let target = self.out.clone().unwrap_or_else(|| source.to_path_buf());
        // In-place runs that changed nothing keep the original bytes.
        if report.is_noop() && self.out.is_none() {
            return Ok(());
        }
        doc.save(target)
    }
}

impl Default for ManualSync {
    fn default() -> Self {
        Self::new()
    }
}

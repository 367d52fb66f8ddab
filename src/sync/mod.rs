//! Reconciliation of a manual spec into an existing DOCX document.
//!
//! Two modes cover the two generations of target documents:
//!
//! - **Token mode** ([`TokenReconciler`]): the document carries
//!   `MANUAL_BLOCK:<id>` / `MANUAL_FIG:<id>` placeholder paragraphs and each
//!   one is replaced by the spec block it names. Consuming a token destroys
//!   the match, so repeated runs converge.
//! - **Legacy mode** ([`LegacyReconciler`]): no tokens; anchor points are
//!   inferred from heading text with fuzzy matching against a fixed layout
//!   vocabulary, and content under each anchor is grown, shrunk, and
//!   overwritten in place.
//!
//! Every pass threads a [`SyncReport`] through explicitly; nothing counts
//! changes through shared state.

pub mod anchor;
pub mod canonical;
pub mod figure;
pub mod latex;
pub mod legacy;
pub mod list_table;
pub mod token;

use regex::Regex;

use crate::docx::document::{is_paragraph, paragraph_text};
use crate::docx::DocxDocument;
use crate::error::Result;

pub use figure::FigureEmbedder;
pub use latex::LatexSource;
pub use legacy::{LegacyLayout, LegacyReconciler};
pub use token::TokenReconciler;

const BLOCK_TOKEN: &str = r"(?:\[\[)?MANUAL_BLOCK:([A-Za-z0-9_.:-]+)(?:\]\])?";
const FIG_TOKEN: &str = r"(?:\[\[)?MANUAL_FIG:([A-Za-z0-9_.:-]+)(?:\]\])?";

/// Extract the block id when the trimmed text is exactly a block token.
pub(crate) fn block_token(text: &str) -> Option<String> {
    let re = Regex::new(&format!("^{}$", BLOCK_TOKEN)).unwrap();
    re.captures(text.trim())
        .map(|c| c[1].trim().to_string())
}

/// Extract the figure id when the trimmed text is exactly a figure token.
pub(crate) fn fig_token(text: &str) -> Option<String> {
    let re = Regex::new(&format!("^{}$", FIG_TOKEN)).unwrap();
    re.captures(text.trim())
        .map(|c| c[1].trim().to_string())
}

/// Check whether the text contains any placeholder token at all. Used by
/// mode detection and by the post-pass that scrubs leftover markers.
pub fn contains_token(text: &str) -> bool {
    let block = Regex::new(BLOCK_TOKEN).unwrap();
    let fig = Regex::new(FIG_TOKEN).unwrap();
    block.is_match(text) || fig.is_match(text)
}

/// Which reconciliation strategy applies to a target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Placeholder tokens present; replace them block by block.
    Token,
    /// No tokens; anchor by heading text.
    Legacy,
}

impl SyncMode {
    /// Pick the mode for a document: token iff any paragraph carries a
    /// placeholder token.
    pub fn detect(doc: &DocxDocument) -> Result<Self> {
        let body = doc.body()?;
        let tokenized = body
            .elements()
            .filter(|n| is_paragraph(n))
            .any(|p| contains_token(paragraph_text(p).trim()));
        Ok(if tokenized {
            SyncMode::Token
        } else {
            SyncMode::Legacy
        })
    }
}

/// Counters accumulated over a reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Mutations applied to document content
    pub changed: usize,
    /// Blocks skipped because their reference could not be resolved
    pub skipped_blocks: usize,
    /// Stale blocks removed (legacy figure cleanup)
    pub removed_blocks: usize,
    /// New blocks inserted (figures, missing sections)
    pub inserted_blocks: usize,
}

impl SyncReport {
    /// Fold another report's counters into this one.
    pub fn merge(&mut self, other: SyncReport) {
        self.changed += other.changed;
        self.skipped_blocks += other.skipped_blocks;
        self.removed_blocks += other.removed_blocks;
        self.inserted_blocks += other.inserted_blocks;
    }

    /// Whether the run touched the document at all.
    pub fn is_noop(&self) -> bool {
        *self == SyncReport::default()
    }
}

/// A reconciliation strategy applied to a whole document.
pub trait Reconciler {
    /// Apply the strategy, mutating the document in memory.
    fn reconcile(&self, doc: &mut DocxDocument) -> Result<SyncReport>;
}

//! Manual specification types.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A versioned manual content specification.
///
/// Produced once per pipeline run by an external spec builder, validated
/// upstream, then consumed read-only by the reconcilers and renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSpec {
    /// Generation metadata (locale, target URL, timestamps)
    #[serde(default)]
    pub meta: Meta,

    /// Ordered sections of the manual
    pub sections: Vec<Section>,

    /// Record of which synthesis rules fired during spec building
    #[serde(default)]
    pub trace: Trace,
}

impl ManualSpec {
    /// Load a spec from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse a spec from a JSON string.
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Sections sorted by their 1-based `order` field.
    pub fn sections_in_order(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }

    /// Map of block id to block across all sections.
    pub fn block_map(&self) -> HashMap<&str, &Block> {
        self.sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .map(|b| (b.block_id(), b))
            .collect()
    }

    /// Map of figure id to figure block across all sections.
    pub fn figure_map(&self) -> HashMap<&str, &Block> {
        self.sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .filter_map(|b| match b {
                Block::Figure { figure_id, .. } => Some((figure_id.as_str(), b)),
                _ => None,
            })
            .collect()
    }

    /// Total number of blocks across all sections.
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }

    /// Validate the structural invariants the reconcilers rely on.
    ///
    /// This is the pre-flight check normally run by the external validator:
    /// non-empty sections, contiguous 1-based section order, document-wide
    /// unique block ids, and per-kind field presence for figures. The
    /// reconcilers themselves assume a valid spec and do not re-check.
    pub fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(Error::Spec("sections missing or empty".to_string()));
        }

        let ordered = self.sections_in_order();
        for (i, section) in ordered.iter().enumerate() {
            let expected = (i + 1) as u32;
            if section.order != expected {
                return Err(Error::Spec(format!(
                    "section order not contiguous at {} (expected {}, got {})",
                    section.section_id, expected, section.order
                )));
            }
            if section.section_id.is_empty() {
                return Err(Error::Spec("section_id missing".to_string()));
            }
            if section.title.is_empty() {
                return Err(Error::Spec(format!(
                    "title missing for section {}",
                    section.section_id
                )));
            }
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for section in &self.sections {
            for block in &section.blocks {
                let bid = block.block_id();
                if bid.is_empty() {
                    return Err(Error::Spec(format!(
                        "block_id missing in section {}",
                        section.section_id
                    )));
                }
                if seen.insert(bid, &section.section_id).is_some() {
                    return Err(Error::Spec(format!("duplicate block_id: {}", bid)));
                }
                if let Block::Figure {
                    figure_id,
                    caption,
                    image_rel,
                    anchor_section_id,
                    ..
                } = block
                {
                    for (key, value) in [
                        ("figure_id", figure_id),
                        ("caption", caption),
                        ("image_rel", image_rel),
                        ("anchor_section_id", anchor_section_id),
                    ] {
                        if value.is_empty() {
                            return Err(Error::Spec(format!("{} figure missing {}", bid, key)));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Spec generation metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Spec schema version
    #[serde(default)]
    pub spec_version: String,

    /// Content locale (e.g. "en", "zh-TW")
    #[serde(default)]
    pub locale: String,

    /// Target application URL
    #[serde(default)]
    pub url: String,

    /// Target host name (scheme and "www." stripped)
    #[serde(default)]
    pub host: String,

    /// Display name of the target application
    #[serde(default)]
    pub app_target: String,

    /// Generation timestamp
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,

    /// Generator mode that produced the spec (e.g. "rewrite", "off")
    #[serde(default)]
    pub generator_mode: String,
}

/// Record of spec synthesis decisions, carried for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    /// Synthesis rules that fired while building the spec
    #[serde(default)]
    pub rules_used: Vec<String>,

    /// Whether a rewrite pass ran over the generated text
    #[serde(default)]
    pub llm_rewrite_applied: bool,

    /// Figure ids that were captured via a degraded/fallback strategy
    #[serde(default)]
    pub fallbacks: Vec<String>,

    /// Figure ids dropped during reconciliation (missing scene or image)
    #[serde(default)]
    pub removed_figures: Vec<String>,
}

/// One titled section of the manual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Unique section identifier
    pub section_id: String,

    /// Section title (also the legacy-mode anchor text)
    pub title: String,

    /// Heading depth (1 = top level)
    #[serde(default = "default_level")]
    pub level: u8,

    /// 1-based position, contiguous across the document
    pub order: u32,

    /// Ordered content blocks
    #[serde(default)]
    pub blocks: Vec<Block>,
}

fn default_level() -> u8 {
    1
}

/// One typed unit of content inside a section.
///
/// Every variant carries a `block_id` unique across the *entire* document;
/// it is the identifier token-based reconciliation resolves, so it must never
/// collide (duplicate ids are prevented upstream; see
/// [`ManualSpec::validate`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A plain text paragraph
    Paragraph {
        /// Document-wide unique block id
        block_id: String,
        /// Paragraph text
        #[serde(default)]
        text: String,
    },

    /// A bulleted list
    BulletList {
        /// Document-wide unique block id
        block_id: String,
        /// List items in order
        #[serde(default)]
        items: Vec<String>,
    },

    /// A numbered list; always restarts at 1 when reconciled
    NumberedList {
        /// Document-wide unique block id
        block_id: String,
        /// List items in order
        #[serde(default)]
        items: Vec<String>,
    },

    /// A table; rows are padded/truncated to the column count on render
    Table {
        /// Document-wide unique block id
        block_id: String,
        /// Header cell values
        #[serde(default)]
        columns: Vec<String>,
        /// Data rows
        #[serde(default)]
        rows: Vec<Vec<String>>,
    },

    /// A captured screenshot with caption
    Figure {
        /// Document-wide unique block id
        block_id: String,
        /// Scene identifier resolved against the capture manifest
        figure_id: String,
        /// Caption text (without the "Figure N." prefix)
        #[serde(default)]
        caption: String,
        /// Image path relative to the document base directory
        #[serde(default)]
        image_rel: String,
        /// Section the figure belongs under
        #[serde(default)]
        anchor_section_id: String,
        /// Position among figures sharing the same anchor
        #[serde(default)]
        order: u32,
    },
}

impl Block {
    /// The block's document-wide unique identifier.
    pub fn block_id(&self) -> &str {
        match self {
            Block::Paragraph { block_id, .. }
            | Block::BulletList { block_id, .. }
            | Block::NumberedList { block_id, .. }
            | Block::Table { block_id, .. }
            | Block::Figure { block_id, .. } => block_id,
        }
    }

    /// Check if this is a figure block.
    pub fn is_figure(&self) -> bool {
        matches!(self, Block::Figure { .. })
    }
}

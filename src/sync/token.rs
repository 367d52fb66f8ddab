//! Token-based block reconciliation.
//!
//! Each placeholder paragraph whose full trimmed text is a
//! `MANUAL_BLOCK:<id>` token is replaced by the spec block naming it.
//! Replacement consumes the token, so a second run finds nothing to match
//! and reports zero content changes. A final scrub clears any paragraph
//! still carrying a token, unresolved markers never leak into output.

use std::path::{Path, PathBuf};

use crate::docx::document::{
    is_paragraph, make_paragraph, make_table, paragraph_text, set_paragraph_numbering,
    set_paragraph_text,
};
use crate::docx::{DocxDocument, ListKind, Numbering, XmlChild, XmlNode};
use crate::error::Result;
use crate::spec::{Block, ManualSpec};
use crate::sync::figure::FigureEmbedder;
use crate::sync::{block_token, contains_token, fig_token, Reconciler, SyncReport};

/// Replaces placeholder tokens with spec blocks.
pub struct TokenReconciler<'a> {
    spec: &'a ManualSpec,
    base_dir: PathBuf,
}

impl<'a> TokenReconciler<'a> {
    /// Create a reconciler for a spec, resolving figure images against
    /// `base_dir`.
    pub fn new(spec: &'a ManualSpec, base_dir: impl AsRef<Path>) -> Self {
        Self {
            spec,
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Replace every block token in the body. Figure tokens are left for
    /// the embedder pass.
    pub fn sync_blocks(&self, body: &mut XmlNode, numbering: &mut Numbering) -> SyncReport {
        let blocks = self.spec.block_map();
        let mut report = SyncReport::default();
        // One shared bullet instance per run; ordered lists each restart.
        let mut bullet_id: Option<String> = None;

        let mut i = 0;
        while i < body.children.len() {
            let text = match &body.children[i] {
                XmlChild::Element(p) if is_paragraph(p) => paragraph_text(p),
                _ => {
                    i += 1;
                    continue;
                }
            };
            let trimmed = text.trim();
            if fig_token(trimmed).is_some() {
                i += 1;
                continue;
            }
            let id = match block_token(trimmed) {
                Some(id) => id,
                None => {
                    i += 1;
                    continue;
                }
            };

            let block = blocks.get(id.as_str()).copied();
            match block {
                None => {
                    log::warn!("unknown block id in token: {}", id);
                    if let XmlChild::Element(p) = &mut body.children[i] {
                        set_paragraph_text(p, "");
                    }
                    report.skipped_blocks += 1;
                    report.changed += 1;
                    i += 1;
                }
                Some(Block::Paragraph { text, .. }) => {
                    if let XmlChild::Element(p) = &mut body.children[i] {
                        set_paragraph_text(p, text);
                    }
                    report.changed += 1;
                    i += 1;
                }
                Some(Block::BulletList { items, .. }) | Some(Block::NumberedList { items, .. }) => {
                    if items.is_empty() {
                        if let XmlChild::Element(p) = &mut body.children[i] {
                            set_paragraph_text(p, "");
                        }
                        report.changed += 1;
                        i += 1;
                        continue;
                    }
                    let numbered = matches!(block, Some(Block::NumberedList { .. }));
                    let num_id = if numbered {
                        numbering.allocate(ListKind::Decimal, true)
                    } else {
                        bullet_id
                            .get_or_insert_with(|| numbering.allocate(ListKind::Bullet, false))
                            .clone()
                    };

                    if let XmlChild::Element(p) = &mut body.children[i] {
                        set_paragraph_text(p, &items[0]);
                        set_paragraph_numbering(p, &num_id);
                    }
                    report.changed += 1;
                    for (offset, item) in items[1..].iter().enumerate() {
                        let mut p = make_paragraph(item);
                        set_paragraph_numbering(&mut p, &num_id);
                        body.insert(i + 1 + offset, p);
                        report.changed += 1;
                    }
                    i += items.len();
                }
                Some(Block::Table { columns, rows, .. }) => {
                    let columns = if columns.is_empty() {
                        default_columns()
                    } else {
                        columns.clone()
                    };
                    let table = make_table(&columns, rows);
                    body.remove(i);
                    body.insert(i, table);
                    report.changed += 1;
                    i += 1;
                }
                Some(Block::Figure { .. }) => {
                    // Placement happens in the figure pass via MANUAL_FIG.
                    if let XmlChild::Element(p) = &mut body.children[i] {
                        set_paragraph_text(p, "");
                    }
                    report.changed += 1;
                    i += 1;
                }
            }
        }
        report
    }
}

impl Reconciler for TokenReconciler<'_> {
    fn reconcile(&self, doc: &mut DocxDocument) -> Result<SyncReport> {
        let caption_style = doc.caption_style_id().to_string();
        let mut parts = doc.parts_mut()?;

        let mut report = self.sync_blocks(parts.body, parts.numbering);

        let embedder = FigureEmbedder::new(&self.base_dir, &caption_style);
        embedder.embed_tokens(&mut parts, &self.spec.figure_map(), &mut report)?;

        report.changed += scrub_tokens(parts.body);
        Ok(report)
    }
}

fn default_columns() -> Vec<String> {
    vec![
        "Column 1".to_string(),
        "Column 2".to_string(),
        "Column 3".to_string(),
    ]
}

/// Clear any paragraph still carrying a placeholder token, returning the
/// number cleared.
pub(crate) fn scrub_tokens(body: &mut XmlNode) -> usize {
    let mut cleared = 0;
    for node in body.elements_mut() {
        if is_paragraph(node) && contains_token(paragraph_text(node).trim()) {
            set_paragraph_text(node, "");
            cleared += 1;
        }
    }
    cleared
}

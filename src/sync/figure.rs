//! Screenshot embedding and caption placement.
//!
//! Figures are display-scaled to a fixed 6.2 inch width; the height comes
//! from the sniffed pixel aspect ratio with a 4:3 fallback. A missing or
//! unreadable image never aborts the run: the token is cleared, the skip is
//! counted, and reconciliation continues.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::docx::document::{
    clear_paragraph, make_paragraph, paragraph_has_drawing, paragraph_text, set_alignment_center,
    set_paragraph_style, set_paragraph_text,
};
use crate::docx::{
    detect_image_format, image_dimensions, make_inline_drawing, DocParts, XmlChild, XmlNode,
};
use crate::error::Result;
use crate::spec::Block;
use crate::sync::anchor::{section_end, HeadingIndex};
use crate::sync::{fig_token, SyncReport};

/// Display width of every embedded screenshot: 6.2 inches in EMU.
const DISPLAY_WIDTH_EMU: u64 = 5_669_280;

/// A figure to place in legacy mode: parse-ordered, anchored by heading.
#[derive(Debug, Clone)]
pub struct Shot {
    /// Image path relative to the media base directory
    pub image_rel: String,
    /// Caption text without the "Figure N." prefix
    pub caption: String,
    /// Heading title the figure belongs under
    pub anchor: String,
    /// Figure number in parse order, 1-based
    pub number: usize,
}

/// Embeds figures into the document body.
pub struct FigureEmbedder<'a> {
    base_dir: &'a Path,
    caption_style: &'a str,
}

impl<'a> FigureEmbedder<'a> {
    /// Create an embedder resolving images against `base_dir` and styling
    /// captions with `caption_style`.
    pub fn new(base_dir: &'a Path, caption_style: &'a str) -> Self {
        Self {
            base_dir,
            caption_style,
        }
    }

    /// Token mode: replace each `MANUAL_FIG:<id>` paragraph with a centered
    /// image followed by a styled caption. Figure numbers increase over
    /// successful embeds in document order.
    pub fn embed_tokens(
        &self,
        parts: &mut DocParts<'_>,
        figures: &HashMap<&str, &Block>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let mut number = 0usize;
        let mut i = 0;
        while i < parts.body.children.len() {
            let text = match &parts.body.children[i] {
                XmlChild::Element(p) if p.name == "w:p" => paragraph_text(p),
                _ => {
                    i += 1;
                    continue;
                }
            };
            let fig_id = match fig_token(text.trim()) {
                Some(id) => id,
                None => {
                    i += 1;
                    continue;
                }
            };

            let figure = figures.get(fig_id.as_str()).copied();
            let (caption, image_rel) = match figure {
                Some(Block::Figure {
                    caption, image_rel, ..
                }) => (caption.clone(), image_rel.clone()),
                _ => {
                    log::warn!("unknown figure id in token: {}", fig_id);
                    if let XmlChild::Element(p) = &mut parts.body.children[i] {
                        set_paragraph_text(p, "");
                    }
                    report.skipped_blocks += 1;
                    report.changed += 1;
                    i += 1;
                    continue;
                }
            };

            let data = match fs::read(self.image_path(&image_rel)) {
                Ok(data) => data,
                Err(err) => {
                    log::warn!("figure {} image unreadable: {}", fig_id, err);
                    if let XmlChild::Element(p) = &mut parts.body.children[i] {
                        set_paragraph_text(p, "");
                    }
                    report.skipped_blocks += 1;
                    report.changed += 1;
                    i += 1;
                    continue;
                }
            };

            let drawing = match self.store_image(parts, data, (number + 1) as u32) {
                Ok(drawing) => drawing,
                Err(err) => {
                    log::warn!("figure {} not embeddable: {}", fig_id, err);
                    if let XmlChild::Element(p) = &mut parts.body.children[i] {
                        set_paragraph_text(p, "");
                    }
                    report.skipped_blocks += 1;
                    report.changed += 1;
                    i += 1;
                    continue;
                }
            };
            number += 1;
            if let XmlChild::Element(p) = &mut parts.body.children[i] {
                clear_paragraph(p);
                set_alignment_center(p);
                p.push(XmlNode::new("w:r").with_child(drawing));
            }
            let cap = self.caption_paragraph(number, &caption);
            parts.body.insert(i + 1, cap);
            report.inserted_blocks += 1;
            report.changed += 1;
            i += 2;
        }
        Ok(())
    }

    /// Legacy mode: remove stale figure blocks, then append each shot at
    /// its anchor section's end. Repeated anchors chain after the previous
    /// shot's caption so figures stay in parse order.
    pub fn sync_anchored(
        &self,
        parts: &mut DocParts<'_>,
        shots: &[Shot],
        caption_hints: &[String],
        report: &mut SyncReport,
    ) -> Result<()> {
        let mut known: Vec<String> = Vec::new();
        for shot in shots {
            known.push(shot.caption.clone());
            known.push(format!("Figure {}. {}", shot.number, shot.caption));
        }
        report.removed_blocks += remove_stale_figures(parts.body, &known, caption_hints);

        // Insertion position per anchor, kept valid across insertions.
        let mut tail_by_anchor: HashMap<String, usize> = HashMap::new();

        for shot in shots {
            let data = match fs::read(self.image_path(&shot.image_rel)) {
                Ok(data) => data,
                Err(err) => {
                    log::warn!("shot {} image unreadable: {}", shot.number, err);
                    report.skipped_blocks += 1;
                    continue;
                }
            };

            let index = HeadingIndex::build(parts.body);
            let pos = match tail_by_anchor.get(&shot.anchor) {
                Some(tail) => *tail,
                None => match index.resolve_with_level(&shot.anchor) {
                    Some((start, level)) => section_end(parts.body, start, level),
                    None => {
                        log::warn!("no heading found for anchor {:?}", shot.anchor);
                        report.skipped_blocks += 1;
                        continue;
                    }
                },
            };

            let drawing = match self.store_image(parts, data, shot.number as u32) {
                Ok(drawing) => drawing,
                Err(err) => {
                    log::warn!("shot {} not embeddable: {}", shot.number, err);
                    report.skipped_blocks += 1;
                    continue;
                }
            };
            let mut img_para = XmlNode::new("w:p");
            set_alignment_center(&mut img_para);
            img_para.push(XmlNode::new("w:r").with_child(drawing));

            parts.body.insert(pos, img_para);
            parts
                .body
                .insert(pos + 1, self.caption_paragraph(shot.number, &shot.caption));
            report.inserted_blocks += 1;

            for tail in tail_by_anchor.values_mut() {
                if *tail >= pos {
                    *tail += 2;
                }
            }
            tail_by_anchor.insert(shot.anchor.clone(), pos + 2);
        }
        Ok(())
    }

    fn image_path(&self, image_rel: &str) -> PathBuf {
        self.base_dir.join(image_rel)
    }

    /// Register the image in the package and build its inline drawing.
    fn store_image(
        &self,
        parts: &mut DocParts<'_>,
        data: Vec<u8>,
        number: u32,
    ) -> Result<XmlNode> {
        let format = detect_image_format(&data)?;
        let (cx, cy) = scaled_extent(image_dimensions(&data));
        let rel_id = parts
            .package
            .add_image(data, format.extension(), format.content_type())?;
        let name = format!("Figure {}", number);
        Ok(make_inline_drawing(&rel_id, &name, cx, cy, number))
    }

    fn caption_paragraph(&self, number: usize, caption: &str) -> XmlNode {
        let mut p = make_paragraph(&format!("Figure {}. {}", number, caption));
        set_paragraph_style(&mut p, self.caption_style);
        set_alignment_center(&mut p);
        p
    }
}

/// Fixed display width with height scaled by pixel aspect ratio, 4:3 when
/// the header gives no dimensions.
fn scaled_extent(dimensions: Option<(u32, u32)>) -> (u64, u64) {
    let cy = match dimensions {
        Some((w, h)) if w > 0 => DISPLAY_WIDTH_EMU * h as u64 / w as u64,
        _ => DISPLAY_WIDTH_EMU * 3 / 4,
    };
    (DISPLAY_WIDTH_EMU, cy)
}

/// Remove previously inserted figure blocks: a caption-styled paragraph
/// whose text is a known caption (or carries a legacy hint) goes, together
/// with a bare drawing paragraph immediately before it.
fn remove_stale_figures(body: &mut XmlNode, known: &[String], hints: &[String]) -> usize {
    let mut removed = 0;
    let mut i = 0;
    while i < body.children.len() {
        let matches = match &body.children[i] {
            XmlChild::Element(p) if p.name == "w:p" => {
                let style = crate::docx::document::paragraph_style(p).unwrap_or("");
                let is_caption_style = style.to_lowercase().contains("caption");
                let text = paragraph_text(p);
                let text = text.trim();
                let is_known = known.iter().any(|c| c == text)
                    || hints.iter().any(|h| text.to_lowercase().contains(h.as_str()));
                is_caption_style && is_known
            }
            _ => false,
        };
        if !matches {
            i += 1;
            continue;
        }

        body.remove(i);
        removed += 1;
        if i > 0 {
            let drop_prev = match &body.children[i - 1] {
                XmlChild::Element(p) if p.name == "w:p" => {
                    paragraph_has_drawing(p) && paragraph_text(p).trim().is_empty()
                }
                _ => false,
            };
            if drop_prev {
                body.remove(i - 1);
                removed += 1;
                i -= 1;
            }
        }
    }
    removed
}

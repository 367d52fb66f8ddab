//! Loaded DOCX document and paragraph/table element helpers.

use std::path::Path;

use crate::docx::numbering::Numbering;
use crate::docx::package::DocxPackage;
use crate::docx::xml::XmlNode;
use crate::error::{Error, Result};

const DOCUMENT_PART: &str = "word/document.xml";
const NUMBERING_PART: &str = "word/numbering.xml";
const STYLES_PART: &str = "word/styles.xml";

/// A DOCX document opened for in-place reconciliation.
///
/// Holds the package, the parsed main document tree, and the numbering part.
/// All mutation happens in memory; [`DocxDocument::save`] re-serializes the
/// edited parts into the archive and writes it once.
#[derive(Debug)]
pub struct DocxDocument {
    package: DocxPackage,
    document: XmlNode,
    numbering: Numbering,
    numbering_existed: bool,
    caption_style: String,
}

/// Split mutable borrows of the pieces a reconciler edits together.
pub struct DocParts<'a> {
    /// The `w:body` element
    pub body: &'a mut XmlNode,
    /// The numbering allocator
    pub numbering: &'a mut Numbering,
    /// The package, for media/relationship registration
    pub package: &'a mut DocxPackage,
}

impl DocxDocument {
    /// Open a DOCX file.
    ///
    /// Fails with [`Error::MissingBody`] when the main document part has no
    /// `w:body`; reconciliation cannot proceed without one.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(DocxPackage::open(path)?)
    }

    /// Open a DOCX archive from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(DocxPackage::from_bytes(data)?)
    }

    fn from_package(package: DocxPackage) -> Result<Self> {
        let document = package.part_xml(DOCUMENT_PART)?;
        if document.child("w:body").is_none() {
            return Err(Error::MissingBody);
        }

        let numbering_existed = package.has_part(NUMBERING_PART);
        let numbering = if numbering_existed {
            Numbering::from_root(package.part_xml(NUMBERING_PART)?)
        } else {
            Numbering::empty()
        };

        let caption_style = detect_caption_style(&package);

        Ok(Self {
            package,
            document,
            numbering,
            numbering_existed,
            caption_style,
        })
    }

    /// The document body.
    pub fn body(&self) -> Result<&XmlNode> {
        self.document.child("w:body").ok_or(Error::MissingBody)
    }

    /// The document body, mutable.
    pub fn body_mut(&mut self) -> Result<&mut XmlNode> {
        self.document.child_mut("w:body").ok_or(Error::MissingBody)
    }

    /// Borrow body, numbering, and package together for reconciliation.
    pub fn parts_mut(&mut self) -> Result<DocParts<'_>> {
        let body = self
            .document
            .child_mut("w:body")
            .ok_or(Error::MissingBody)?;
        Ok(DocParts {
            body,
            numbering: &mut self.numbering,
            package: &mut self.package,
        })
    }

    /// The numbering allocator.
    pub fn numbering_mut(&mut self) -> &mut Numbering {
        &mut self.numbering
    }

    /// Style id used for figure captions, preferring an `ImageCaption`
    /// style already defined in the document.
    pub fn caption_style_id(&self) -> &str {
        &self.caption_style
    }

    /// Serialize the edited parts and write the archive to `path`.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush()?;
        self.package.save(path)
    }

    /// Serialize the edited parts and return the archive bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    fn flush(&mut self) -> Result<()> {
        self.package.set_part_xml(DOCUMENT_PART, &self.document);
        if self.numbering.is_dirty() {
            if !self.numbering_existed {
                self.package.register_numbering_part()?;
                self.numbering_existed = true;
            }
            self.package.set_part_xml(NUMBERING_PART, self.numbering.root());
        }
        Ok(())
    }
}

fn detect_caption_style(package: &DocxPackage) -> String {
    if let Ok(styles) = package.part_xml(STYLES_PART) {
        for wanted in ["ImageCaption", "Caption"] {
            let found = styles
                .children_named("w:style")
                .any(|s| s.attr("w:styleId") == Some(wanted));
            if found {
                return wanted.to_string();
            }
        }
    }
    "Caption".to_string()
}

// ---------------------------------------------------------------------------
// Paragraph helpers
// ---------------------------------------------------------------------------

/// Check if a body element is a paragraph.
pub fn is_paragraph(node: &XmlNode) -> bool {
    node.name == "w:p"
}

/// Check if a body element is a table.
pub fn is_table(node: &XmlNode) -> bool {
    node.name == "w:tbl"
}

/// Concatenated run text of a paragraph.
pub fn paragraph_text(p: &XmlNode) -> String {
    p.collect_text("w:t")
}

/// Build a run holding the given text, preserving significant whitespace.
pub fn make_run(text: &str) -> XmlNode {
    let mut t = XmlNode::new("w:t");
    if text.starts_with(' ') || text.ends_with(' ') || text.contains("  ") {
        t.set_attr("xml:space", "preserve");
    }
    t.push_text(text);
    XmlNode::new("w:r").with_child(t)
}

/// Replace a paragraph's content with a single run of text, keeping its
/// properties (`w:pPr`) untouched. Empty text leaves the paragraph with no
/// runs at all.
pub fn set_paragraph_text(p: &mut XmlNode, text: &str) {
    p.children.retain(|c| match c {
        crate::docx::xml::XmlChild::Element(n) => n.name == "w:pPr",
        crate::docx::xml::XmlChild::Text(_) => false,
    });
    if !text.is_empty() {
        p.push(make_run(text));
    }
}

/// Remove all content from a paragraph, including its properties.
pub fn clear_paragraph(p: &mut XmlNode) {
    p.children.clear();
}

/// The paragraph's style id, if any.
pub fn paragraph_style(p: &XmlNode) -> Option<&str> {
    p.child("w:pPr")?.child("w:pStyle")?.attr("w:val")
}

/// Set the paragraph's style id.
pub fn set_paragraph_style(p: &mut XmlNode, style: &str) {
    let ppr = p.ensure_child_front("w:pPr");
    if let Some(existing) = ppr.child_mut("w:pStyle") {
        existing.set_attr("w:val", style);
    } else {
        ppr.insert(0, XmlNode::new("w:pStyle").with_attr("w:val", style));
    }
}

/// Heading level encoded in the paragraph's style (`Heading1`, `Heading 2`,
/// ...), or `None` when the paragraph is not heading-styled.
pub fn heading_level(p: &XmlNode) -> Option<u8> {
    let style = paragraph_style(p)?;
    let rest = style.strip_prefix("Heading")?;
    rest.trim().parse().ok()
}

/// Check if the paragraph carries a heading style.
pub fn is_heading(p: &XmlNode) -> bool {
    heading_level(p).is_some()
}

/// Check if the paragraph belongs to a list (has a numbering reference).
pub fn is_list_paragraph(p: &XmlNode) -> bool {
    p.child("w:pPr")
        .map(|ppr| ppr.child("w:numPr").is_some())
        .unwrap_or(false)
}

/// The paragraph's numbering instance id, if it is a list paragraph.
pub fn numbering_id(p: &XmlNode) -> Option<&str> {
    p.child("w:pPr")?
        .child("w:numPr")?
        .child("w:numId")?
        .attr("w:val")
}

/// Attach a numbering reference (level 0) to a paragraph, replacing any
/// existing one.
pub fn set_paragraph_numbering(p: &mut XmlNode, num_id: &str) {
    let ppr = p.ensure_child_front("w:pPr");
    ppr.remove_children_named("w:numPr");
    let numpr = XmlNode::new("w:numPr")
        .with_child(XmlNode::new("w:ilvl").with_attr("w:val", "0"))
        .with_child(XmlNode::new("w:numId").with_attr("w:val", num_id));
    // numPr must follow pStyle when one is present
    let at = ppr.child_index("w:pStyle").map(|i| i + 1).unwrap_or(0);
    ppr.insert(at, numpr);
}

/// Center-align a paragraph.
pub fn set_alignment_center(p: &mut XmlNode) {
    let ppr = p.ensure_child_front("w:pPr");
    ppr.remove_children_named("w:jc");
    ppr.push(XmlNode::new("w:jc").with_attr("w:val", "center"));
}

/// Check if a paragraph contains an embedded drawing.
pub fn paragraph_has_drawing(p: &XmlNode) -> bool {
    p.has_descendant("w:drawing")
}

/// Build a plain paragraph holding the given text.
pub fn make_paragraph(text: &str) -> XmlNode {
    let mut p = XmlNode::new("w:p");
    if !text.is_empty() {
        p.push(make_run(text));
    }
    p
}

/// Build a heading paragraph at the given level.
pub fn make_heading(text: &str, level: u8) -> XmlNode {
    let mut p = make_paragraph(text);
    set_paragraph_style(&mut p, &format!("Heading{}", level));
    p
}

// ---------------------------------------------------------------------------
// Table helpers
// ---------------------------------------------------------------------------

/// Set a table cell's text, reusing its first paragraph when present.
pub fn set_cell_text(tc: &mut XmlNode, text: &str) {
    if let Some(p) = tc.child_mut("w:p") {
        set_paragraph_text(p, text);
    } else {
        tc.push(make_paragraph(text));
    }
}

/// Plain text of a table cell.
pub fn cell_text(tc: &XmlNode) -> String {
    tc.collect_text("w:t")
}

/// Build a bordered table with a header row and data rows, padding or
/// truncating each data row to the column count.
pub fn make_table(columns: &[String], rows: &[Vec<String>]) -> XmlNode {
    let mut tbl = XmlNode::new("w:tbl");

    let borders = XmlNode::new("w:tblBorders")
        .with_child(border("w:top"))
        .with_child(border("w:left"))
        .with_child(border("w:bottom"))
        .with_child(border("w:right"))
        .with_child(border("w:insideH"))
        .with_child(border("w:insideV"));
    let tblpr = XmlNode::new("w:tblPr")
        .with_child(
            XmlNode::new("w:tblW")
                .with_attr("w:w", "0")
                .with_attr("w:type", "auto"),
        )
        .with_child(borders);
    tbl.push(tblpr);

    let mut grid = XmlNode::new("w:tblGrid");
    for _ in columns {
        grid.push(XmlNode::new("w:gridCol"));
    }
    tbl.push(grid);

    tbl.push(make_table_row(columns, columns.len()));
    for row in rows {
        tbl.push(make_table_row(row, columns.len()));
    }
    tbl
}

fn make_table_row(values: &[String], width: usize) -> XmlNode {
    let mut tr = XmlNode::new("w:tr");
    for i in 0..width {
        let text = values.get(i).map(String::as_str).unwrap_or("");
        tr.push(XmlNode::new("w:tc").with_child(make_paragraph(text)));
    }
    tr
}

fn border(name: &str) -> XmlNode {
    XmlNode::new(name)
        .with_attr("w:val", "single")
        .with_attr("w:sz", "4")
        .with_attr("w:space", "0")
        .with_attr("w:color", "auto")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text_round_trip() {
        let mut p = make_paragraph("Hello");
        assert_eq!(paragraph_text(&p), "Hello");

        set_paragraph_text(&mut p, "Replaced  text ");
        assert_eq!(paragraph_text(&p), "Replaced  text ");
        // Significant whitespace must be marked preserved
        let t = p.descendant("w:t").unwrap();
        assert_eq!(t.attr("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_set_text_keeps_properties() {
        let mut p = make_heading("Scope", 1);
        set_paragraph_text(&mut p, "New title");
        assert_eq!(paragraph_style(&p), Some("Heading1"));
        assert_eq!(heading_level(&p), Some(1));
    }

    #[test]
    fn test_heading_level_with_space() {
        let mut p = make_paragraph("Title");
        set_paragraph_style(&mut p, "Heading 2");
        assert_eq!(heading_level(&p), Some(2));
    }

    #[test]
    fn test_numbering_reference() {
        let mut p = make_paragraph("item");
        assert!(!is_list_paragraph(&p));

        set_paragraph_numbering(&mut p, "42");
        assert!(is_list_paragraph(&p));
        assert_eq!(numbering_id(&p), Some("42"));

        // Replacing must not accumulate numPr elements
        set_paragraph_numbering(&mut p, "43");
        assert_eq!(numbering_id(&p), Some("43"));
        assert_eq!(
            p.child("w:pPr").unwrap().children_named("w:numPr").count(),
            1
        );
    }

    #[test]
    fn test_make_table_pads_and_truncates() {
        let columns = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let rows = vec![
            vec!["1".to_string()],
            vec![
                "1".to_string(),
                "2".to_string(),
                "3".to_string(),
                "4".to_string(),
            ],
        ];
        let tbl = make_table(&columns, &rows);

        let trs: Vec<&XmlNode> = tbl.children_named("w:tr").collect();
        assert_eq!(trs.len(), 3);
        for tr in &trs {
            assert_eq!(tr.children_named("w:tc").count(), 3);
        }

        let second_row_cells: Vec<String> =
            trs[1].children_named("w:tc").map(cell_text).collect();
        assert_eq!(second_row_cells, vec!["1", "", ""]);
        let third_row_cells: Vec<String> =
            trs[2].children_named("w:tc").map(cell_text).collect();
        assert_eq!(third_row_cells, vec!["1", "2", "3"]);
    }
}

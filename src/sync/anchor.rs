//! Anchor resolution over the document body.
//!
//! Legacy-mode reconciliation locates content by heading text. Positions are
//! plain child indices into the body, which go stale on every structural
//! mutation. The index must be rebuilt after each insertion or removal, so
//! it is cheap to construct and holds no references into the tree.

use crate::docx::document::{heading_level, is_paragraph, paragraph_text};
use crate::docx::{XmlChild, XmlNode};
use crate::sync::canonical::canonicalize;

/// Iterate body children as `(child index, element)` pairs.
///
/// Positions used by the reconcilers are always child indices, so they stay
/// valid for `insert`/`remove` calls on the body.
pub fn body_elements(body: &XmlNode) -> impl Iterator<Item = (usize, &XmlNode)> {
    body.children.iter().enumerate().filter_map(|(i, c)| match c {
        XmlChild::Element(n) => Some((i, n)),
        XmlChild::Text(_) => None,
    })
}

/// An index of heading-styled paragraphs by canonical title.
#[derive(Debug, Clone)]
pub struct HeadingIndex {
    entries: Vec<HeadingEntry>,
}

#[derive(Debug, Clone)]
struct HeadingEntry {
    canonical: String,
    position: usize,
    level: u8,
}

impl HeadingIndex {
    /// Scan the body and index every heading paragraph in document order.
    pub fn build(body: &XmlNode) -> Self {
        let mut entries = Vec::new();
        for (i, child) in body_elements(body) {
            if !is_paragraph(child) {
                continue;
            }
            let level = match heading_level(child) {
                Some(level) => level,
                None => continue,
            };
            let canonical = canonicalize(&paragraph_text(child));
            if canonical.is_empty() {
                continue;
            }
            entries.push(HeadingEntry {
                canonical,
                position: i,
                level,
            });
        }
        Self { entries }
    }

    /// Resolve a title to a body position.
    ///
    /// Exact canonical match wins; otherwise the first indexed heading whose
    /// canonical text contains the target (or is contained by it) is taken,
    /// in document order. Deliberately loose: similar titles may resolve to
    /// the wrong heading, and no error is raised; callers needing
    /// determinism should use token anchoring instead.
    pub fn resolve(&self, title: &str) -> Option<usize> {
        let target = canonicalize(title);
        if target.is_empty() {
            return None;
        }
        if let Some(entry) = self.entries.iter().find(|e| e.canonical == target) {
            return Some(entry.position);
        }
        self.entries
            .iter()
            .find(|e| e.canonical.contains(&target) || target.contains(&e.canonical))
            .map(|e| e.position)
    }

    /// Resolve a title and return its heading level too.
    pub fn resolve_with_level(&self, title: &str) -> Option<(usize, u8)> {
        let position = self.resolve(title)?;
        let level = self
            .entries
            .iter()
            .find(|e| e.position == position)
            .map(|e| e.level)?;
        Some((position, level))
    }

    /// Number of indexed headings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index found no headings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Position of the end of a section: the index of the next heading paragraph
/// with level `<=` the start level, or the body length when the section runs
/// to the end of the document. Insertions at the section end go immediately
/// before the returned index.
pub fn section_end(body: &XmlNode, start: usize, start_level: u8) -> usize {
    for (i, child) in body_elements(body) {
        if i <= start || !is_paragraph(child) {
            continue;
        }
        if let Some(level) = heading_level(child) {
            if level <= start_level {
                return i;
            }
        }
    }
    body.children.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::document::{make_heading, make_paragraph};

    fn body_with_headings() -> XmlNode {
        let mut body = XmlNode::new("w:body");
        body.push(make_heading("1. Scope", 1));
        body.push(make_paragraph("intro"));
        body.push(make_heading("4. Links and Buttons Mapping", 1));
        body.push(make_heading("4.1 Top Navigation", 2));
        body.push(make_paragraph("nav text"));
        body.push(make_heading("4.2 Left Navigation (Common Signed-out Items)", 2));
        body.push(make_heading("5. Example Task Flows", 1));
        body
    }

    #[test]
    fn test_exact_resolution_ignores_numbering() {
        let body = body_with_headings();
        let index = HeadingIndex::build(&body);
        assert_eq!(index.resolve("Scope"), Some(0));
        assert_eq!(index.resolve("Top Navigation"), Some(3));
    }

    #[test]
    fn test_fuzzy_substring_resolution() {
        let body = body_with_headings();
        let index = HeadingIndex::build(&body);
        // Shorter query contained in an indexed heading
        assert_eq!(index.resolve("Left Navigation"), Some(5));
        // Longer query containing an indexed heading
        assert_eq!(index.resolve("Example Task Flows (Desktop)"), Some(6));
    }

    #[test]
    fn test_unresolvable_title() {
        let body = body_with_headings();
        let index = HeadingIndex::build(&body);
        assert_eq!(index.resolve("Appendix"), None);
        assert_eq!(index.resolve(""), None);
    }

    #[test]
    fn test_section_end_boundaries() {
        let body = body_with_headings();
        // Top Navigation (level 2, index 3) ends at the next level <= 2
        // heading, which is Left Navigation at index 5.
        assert_eq!(section_end(&body, 3, 2), 5);
        // Links and Buttons Mapping (level 1, index 2) runs to Example Task
        // Flows at index 6, skipping its own subsections.
        assert_eq!(section_end(&body, 2, 1), 6);
        // The final section runs to the end of the body.
        assert_eq!(section_end(&body, 6, 1), 7);
    }

    #[test]
    fn test_index_skips_non_headings() {
        let body = body_with_headings();
        let index = HeadingIndex::build(&body);
        assert_eq!(index.len(), 5);
    }
}

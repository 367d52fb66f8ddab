//! Legacy anchor-based reconciliation.
//!
//! Older target documents carry no placeholder tokens, so everything is
//! located by heading text against a fixed layout vocabulary. Insertion
//! points and section boundaries are inferred, which makes this mode
//! best-effort: anchors that cannot be resolved are counted and skipped,
//! never fatal. The heading index is rebuilt after every structural
//! mutation because body positions go stale.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::docx::document::{
    make_heading, make_paragraph, make_table, paragraph_text, set_paragraph_numbering,
    set_paragraph_style,
};
use crate::docx::{DocxDocument, ListKind, Numbering, XmlChild, XmlNode};
use crate::error::Result;
use crate::sync::anchor::{body_elements, section_end, HeadingIndex};
use crate::sync::figure::{FigureEmbedder, Shot};
use crate::sync::latex::LatexSource;
use crate::sync::list_table::{find_list_run, find_table, reconcile_list_run, reconcile_table};
use crate::sync::{Reconciler, SyncReport};

/// Content kind for a section inserted when missing from the document.
#[derive(Debug, Clone)]
pub enum SectionContent {
    /// Bulleted items pulled from the LaTeX `itemize` of the same title
    BulletList,
    /// Ordered steps pulled from the LaTeX `enumerate` of the same title
    OrderedList,
    /// Table rows pulled from the LaTeX `longtable` of the same title
    Table,
    /// Fixed paragraph lines
    Static(Vec<String>),
}

/// A table subsection and its header row.
#[derive(Debug, Clone)]
pub struct TableSection {
    /// Heading title
    pub title: String,
    /// Header cell values written over the first row
    pub headers: Vec<String>,
}

/// A section the document is expected to have; inserted at the end of the
/// first resolvable anchor's section when absent.
#[derive(Debug, Clone)]
pub struct MissingSection {
    /// Heading title of the section to create
    pub title: String,
    /// Heading level of the created section
    pub level: u8,
    /// Anchor candidates in preference order
    pub anchors: Vec<String>,
    /// What goes under the heading
    pub content: SectionContent,
}

/// Canonical number and level for a known heading.
#[derive(Debug, Clone)]
pub struct HeadingNumber {
    /// Heading title (match target)
    pub title: String,
    /// Heading level to enforce
    pub level: u8,
    /// Section number text, e.g. "4.2"
    pub number: String,
}

/// The fixed heading vocabulary legacy mode reconciles against.
#[derive(Debug, Clone)]
pub struct LegacyLayout {
    /// Sections whose first list run is a bulleted list
    pub list_sections: Vec<String>,
    /// Subsections containing a mapping table
    pub table_sections: Vec<TableSection>,
    /// Subsections containing an ordered flow, each restarting at 1
    pub flow_sections: Vec<String>,
    /// Anchor per screenshot in LaTeX parse order
    pub figure_anchors: Vec<String>,
    /// Anchor for screenshots beyond the known list
    pub fallback_anchor: String,
    /// Canonical heading numbers enforced at the end of a run
    pub heading_numbers: Vec<HeadingNumber>,
    /// Sections inserted when absent
    pub missing_sections: Vec<MissingSection>,
    /// Sections whose body is replaced with fixed lines
    pub static_sections: Vec<(String, Vec<String>)>,
    /// Lowercase substrings identifying captions from earlier sync runs
    pub caption_hints: Vec<String>,
}

impl Default for LegacyLayout {
    fn default() -> Self {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let build_lines = owned(&[
            "Run this command in the same directory:",
            "latexmk -pdf main.tex",
            "Output: main.pdf",
        ]);

        Self {
            list_sections: owned(&["Scope", "Prerequisites", "Maintenance Notes"]),
            table_sections: vec![
                TableSection {
                    title: "Top Navigation".to_string(),
                    headers: owned(&["Control", "Type", "Function"]),
                },
                TableSection {
                    title: "Left Navigation (Common Signed-out Items)".to_string(),
                    headers: owned(&["Item", "Type", "Function"]),
                },
                TableSection {
                    title: "Home Feed Video Card".to_string(),
                    headers: owned(&["Area", "Type", "Function"]),
                },
            ],
            flow_sections: owned(&[
                "Flow A: Search for a Video",
                "Flow B: Open a Video Watch Page",
            ]),
            figure_anchors: owned(&[
                "Home Page Overview",
                "Top Navigation",
                "Left Navigation (Common Signed-out Items)",
                "Home Feed Video Card",
                "Flow A: Search for a Video",
                "Flow A: Search for a Video",
                "Flow B: Open a Video Watch Page",
                "Flow B: Open a Video Watch Page",
            ]),
            fallback_anchor: "Example Task Flows".to_string(),
            heading_numbers: vec![
                ("Scope", 1, "1"),
                ("Prerequisites", 1, "2"),
                ("Home Page Overview", 1, "3"),
                ("Links and Buttons Mapping", 1, "4"),
                ("Top Navigation", 2, "4.1"),
                ("Left Navigation (Common Signed-out Items)", 2, "4.2"),
                ("Home Feed Video Card", 2, "4.3"),
                ("Example Task Flows", 1, "5"),
                ("Flow A: Search for a Video", 2, "5.1"),
                ("Flow B: Open a Video Watch Page", 2, "5.2"),
                ("Maintenance Notes", 1, "6"),
                ("Build", 1, "7"),
            ]
            .into_iter()
            .map(|(title, level, number)| HeadingNumber {
                title: title.to_string(),
                level,
                number: number.to_string(),
            })
            .collect(),
            missing_sections: vec![
                MissingSection {
                    title: "Left Navigation (Common Signed-out Items)".to_string(),
                    level: 2,
                    anchors: owned(&["Top Navigation"]),
                    content: SectionContent::Table,
                },
                MissingSection {
                    title: "Home Feed Video Card".to_string(),
                    level: 2,
                    anchors: owned(&["Left Navigation (Common Signed-out Items)"]),
                    content: SectionContent::Table,
                },
                MissingSection {
                    title: "Flow B: Open a Video Watch Page".to_string(),
                    level: 2,
                    anchors: owned(&["Flow A: Search for a Video"]),
                    content: SectionContent::OrderedList,
                },
                MissingSection {
                    title: "Maintenance Notes".to_string(),
                    level: 1,
                    anchors: owned(&[
                        "Flow B: Open a Video Watch Page",
                        "Flow A: Search for a Video",
                        "Example Task Flows",
                    ]),
                    content: SectionContent::BulletList,
                },
                MissingSection {
                    title: "Build".to_string(),
                    level: 1,
                    anchors: owned(&[
                        "Maintenance Notes",
                        "Flow B: Open a Video Watch Page",
                        "Example Task Flows",
                    ]),
                    content: SectionContent::Static(build_lines.clone()),
                },
            ],
            static_sections: vec![("Build".to_string(), build_lines)],
            caption_hints: owned(&[
                "overview",
                "navigation controls",
                "left navigation panel",
                "interactive areas",
                "flow a-",
                "flow b-",
            ]),
        }
    }
}

/// Reconciles a token-free document against a LaTeX source and a layout
/// vocabulary.
pub struct LegacyReconciler<'a> {
    latex: &'a LatexSource,
    layout: &'a LegacyLayout,
    base_dir: PathBuf,
}

impl<'a> LegacyReconciler<'a> {
    /// Create a reconciler resolving screenshot images against `base_dir`.
    pub fn new(latex: &'a LatexSource, layout: &'a LegacyLayout, base_dir: impl AsRef<Path>) -> Self {
        Self {
            latex,
            layout,
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Screenshots paired with their layout anchors, in parse order.
    pub fn shots(&self) -> Vec<Shot> {
        self.latex
            .screenshots()
            .into_iter()
            .enumerate()
            .map(|(i, (image_rel, caption))| Shot {
                image_rel,
                caption,
                anchor: self
                    .layout
                    .figure_anchors
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| self.layout.fallback_anchor.clone()),
                number: i + 1,
            })
            .collect()
    }

    fn sync_lists(&self, body: &mut XmlNode, report: &mut SyncReport) {
        for title in &self.layout.list_sections {
            let items = self.latex.itemize(title);
            if items.is_empty() {
                continue;
            }
            let _ = sync_list_under(body, title, &items, report);
        }
    }

    fn sync_tables(&self, body: &mut XmlNode, report: &mut SyncReport) {
        for section in &self.layout.table_sections {
            let rows = self.latex.table(&section.title);
            if rows.is_empty() {
                continue;
            }
            let index = HeadingIndex::build(body);
            let (start, level) = match index.resolve_with_level(&section.title) {
                Some(found) => found,
                None => {
                    report.skipped_blocks += 1;
                    continue;
                }
            };
            let end = section_end(body, start, level);
            let table_at = match find_table(body, start, end) {
                Some(at) => at,
                None => {
                    report.skipped_blocks += 1;
                    continue;
                }
            };
            if let XmlChild::Element(tbl) = &mut body.children[table_at] {
                report.changed += reconcile_table(tbl, &rows, Some(&section.headers));
            }
        }
    }

    /// Flow sections are ordered lists that must each restart at 1. When
    /// two flows share a numbering instance the later one gets a fresh
    /// restarted instance; an unshared instance is patched in place.
    fn sync_flows(&self, body: &mut XmlNode, numbering: &mut Numbering, report: &mut SyncReport) {
        let mut claimed: HashSet<String> = HashSet::new();
        for title in &self.layout.flow_sections {
            let items = self.latex.enumerate(title);
            if items.is_empty() {
                continue;
            }
            let run = match sync_list_under(body, title, &items, report) {
                Some(run) => run,
                None => continue,
            };

            let (first, count) = run;
            let current = match &body.children[first] {
                XmlChild::Element(p) => crate::docx::document::numbering_id(p).map(str::to_string),
                _ => None,
            };
            match current {
                Some(id) if !claimed.contains(&id) => {
                    numbering.ensure_restart(&id);
                    claimed.insert(id);
                }
                _ => {
                    let fresh = numbering.allocate(ListKind::Decimal, true);
                    for at in first..first + count {
                        if let XmlChild::Element(p) = &mut body.children[at] {
                            set_paragraph_numbering(p, &fresh);
                        }
                    }
                    report.changed += count;
                    claimed.insert(fresh);
                }
            }
        }
    }

    fn insert_missing(
        &self,
        body: &mut XmlNode,
        numbering: &mut Numbering,
        report: &mut SyncReport,
    ) {
        for section in &self.layout.missing_sections {
            let index = HeadingIndex::build(body);
            if index.resolve(&section.title).is_some() {
                continue;
            }
            let anchor = section
                .anchors
                .iter()
                .find_map(|a| index.resolve_with_level(a));
            let (start, level) = match anchor {
                Some(found) => found,
                None => {
                    log::warn!("no anchor to insert section {:?}", section.title);
                    report.skipped_blocks += 1;
                    continue;
                }
            };
            let pos = section_end(body, start, level);

            let mut elems = vec![heading_like_template(body, &section.title, section.level)];
            match &section.content {
                SectionContent::BulletList => {
                    let num_id = numbering.allocate(ListKind::Bullet, false);
                    for item in self.latex.itemize(&section.title) {
                        elems.push(list_paragraph(&item, &num_id));
                    }
                }
                SectionContent::OrderedList => {
                    let num_id = numbering.allocate(ListKind::Decimal, true);
                    for item in self.latex.enumerate(&section.title) {
                        elems.push(list_paragraph(&item, &num_id));
                    }
                }
                SectionContent::Table => {
                    let headers = self
                        .layout
                        .table_sections
                        .iter()
                        .find(|t| t.title == section.title)
                        .map(|t| t.headers.clone())
                        .unwrap_or_default();
                    elems.push(make_table(&headers, &self.latex.table(&section.title)));
                }
                SectionContent::Static(lines) => {
                    for line in lines {
                        elems.push(make_paragraph(line));
                    }
                }
            }

            report.changed += elems.len();
            report.inserted_blocks += 1;
            for (offset, elem) in elems.into_iter().enumerate() {
                body.insert(pos + offset, elem);
            }
        }
    }

    fn rewrite_static(&self, body: &mut XmlNode, report: &mut SyncReport) {
        for (title, lines) in &self.layout.static_sections {
            let index = HeadingIndex::build(body);
            let (start, level) = match index.resolve_with_level(title) {
                Some(found) => found,
                None => continue,
            };
            let end = section_end(body, start, level);

            let current: Vec<String> = body_elements(body)
                .filter(|(i, n)| *i > start && *i < end && n.name == "w:p")
                .map(|(_, p)| paragraph_text(p))
                .collect();
            if current == *lines {
                continue;
            }

            for at in (start + 1..end).rev() {
                body.remove(at);
                report.changed += 1;
            }
            for (offset, line) in lines.iter().enumerate() {
                body.insert(start + 1 + offset, make_paragraph(line));
                report.changed += 1;
            }
        }
    }
}

impl Reconciler for LegacyReconciler<'_> {
    fn reconcile(&self, doc: &mut DocxDocument) -> Result<SyncReport> {
        let caption_style = doc.caption_style_id().to_string();
        let mut parts = doc.parts_mut()?;
        let mut report = SyncReport::default();

        self.sync_lists(parts.body, &mut report);
        self.sync_tables(parts.body, &mut report);
        self.sync_flows(parts.body, parts.numbering, &mut report);
        self.insert_missing(parts.body, parts.numbering, &mut report);
        self.rewrite_static(parts.body, &mut report);

        report.changed += normalize_manual_numbers(parts.body);
        report.changed += enforce_heading_numbers(parts.body, &self.layout.heading_numbers);

        let shots = self.shots();
        let embedder = FigureEmbedder::new(&self.base_dir, &caption_style);
        embedder.sync_anchored(&mut parts, &shots, &self.layout.caption_hints, &mut report)?;

        Ok(report)
    }
}

/// Reconcile the list run under a heading. Returns the run's final
/// `(first, len)` position, or `None` when heading or run is missing.
fn sync_list_under(
    body: &mut XmlNode,
    title: &str,
    items: &[String],
    report: &mut SyncReport,
) -> Option<(usize, usize)> {
    let index = HeadingIndex::build(body);
    let (start, level) = match index.resolve_with_level(title) {
        Some(found) => found,
        None => {
            log::debug!("heading not found: {:?}", title);
            report.skipped_blocks += 1;
            return None;
        }
    };
    let end = section_end(body, start, level);
    let (first, count) = match find_list_run(body, start, end) {
        Some(run) => run,
        None => {
            report.skipped_blocks += 1;
            return None;
        }
    };
    report.changed += reconcile_list_run(body, first, count, items);
    Some((first, items.len()))
}

fn list_paragraph(text: &str, num_id: &str) -> XmlNode {
    let mut p = make_paragraph(text);
    set_paragraph_numbering(&mut p, num_id);
    p
}

fn run_style(r: &XmlNode) -> Option<&str> {
    r.child("w:rPr")?.child("w:rStyle")?.attr("w:val")
}

/// Clone a heading paragraph of the right level as a template for a new
/// section heading, keeping its number run and tab but replacing the text.
/// Templates carrying a `SectionNumber` run are preferred; with no heading
/// of that level at all, a plain styled heading is built.
fn heading_like_template(body: &XmlNode, text: &str, level: u8) -> XmlNode {
    let style = format!("Heading{}", level);
    let candidates: Vec<&XmlNode> = body
        .elements()
        .filter(|p| {
            p.name == "w:p" && crate::docx::document::paragraph_style(p) == Some(style.as_str())
        })
        .collect();
    let template = candidates
        .iter()
        .find(|p| {
            p.children_named("w:r")
                .any(|r| run_style(r) == Some("SectionNumber"))
        })
        .or_else(|| candidates.first())
        .copied();

    let template = match template {
        Some(t) => t,
        None => return make_heading(text, level),
    };

    let mut p = template.clone();
    p.children.retain(|c| match c {
        XmlChild::Element(n) => {
            if n.name != "w:r" {
                return true;
            }
            run_style(n) == Some("SectionNumber") || n.child("w:tab").is_some()
        }
        XmlChild::Text(_) => false,
    });
    p.push(crate::docx::document::make_run(&format!(" {}", text)));
    p
}

/// Strip manually typed number prefixes from heading text runs, but only
/// in headings that carry an auto-number (`SectionNumber`) run; elsewhere
/// the typed number is the only number and must stay.
fn normalize_manual_numbers(body: &mut XmlNode) -> usize {
    let prefix = Regex::new(r"^\s*\d+(\.\d+)*\.?\s*").unwrap();
    let mut changed = 0;

    for p in body.elements_mut() {
        if p.name != "w:p" || !crate::docx::document::is_heading(p) {
            continue;
        }
        let mut saw_number_run = false;
        for r in p.elements_mut() {
            if r.name != "w:r" {
                continue;
            }
            if run_style(r) == Some("SectionNumber") {
                saw_number_run = true;
                continue;
            }
            let t = match r.child_mut("w:t") {
                Some(t) => t,
                None => continue,
            };
            let raw = t.text();
            if raw.is_empty() {
                continue;
            }
            if !saw_number_run {
                break;
            }
            let mut new = prefix.replace(&raw, "").to_string();
            if !new.is_empty() && !new.starts_with([' ', '\t']) {
                new.insert(0, ' ');
            }
            if new != raw {
                t.children.clear();
                t.push_text(new);
                changed += 1;
            }
            break;
        }
    }
    changed
}

/// Rewrite each known heading into the canonical
/// `[SectionNumber run][tab][title]` structure at its enforced level.
fn enforce_heading_numbers(body: &mut XmlNode, targets: &[HeadingNumber]) -> usize {
    let mut changed = 0;
    for target in targets {
        let index = HeadingIndex::build(body);
        let pos = match index.resolve(&target.title) {
            Some(pos) => pos,
            None => continue,
        };
        if let XmlChild::Element(p) = &mut body.children[pos] {
            let before = paragraph_text(p);
            set_heading_number_and_title(p, target.level, &target.number, &target.title);
            if paragraph_text(p) != before {
                changed += 1;
            }
        }
    }
    changed
}

fn set_heading_number_and_title(p: &mut XmlNode, level: u8, number: &str, title: &str) {
    set_paragraph_style(p, &format!("Heading{}", level));
    p.children.retain(|c| match c {
        XmlChild::Element(n) => n.name != "w:r",
        XmlChild::Text(_) => false,
    });

    let rpr = XmlNode::new("w:rPr")
        .with_child(XmlNode::new("w:rStyle").with_attr("w:val", "SectionNumber"));
    let mut t_num = XmlNode::new("w:t");
    t_num.push_text(number);
    p.push(XmlNode::new("w:r").with_child(rpr).with_child(t_num));

    p.push(XmlNode::new("w:r").with_child(XmlNode::new("w:tab")));

    let mut t_title = XmlNode::new("w:t");
    t_title.push_text(title);
    p.push(XmlNode::new("w:r").with_child(t_title));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::document::{is_list_paragraph, numbering_id};

    fn numbered_heading(number: &str, title: &str, level: u8) -> XmlNode {
        let mut p = XmlNode::new("w:p");
        set_heading_number_and_title(&mut p, level, number, title);
        p
    }

    fn list_item(text: &str, num_id: &str) -> XmlNode {
        list_paragraph(text, num_id)
    }

    fn sample_tex() -> LatexSource {
        LatexSource::new(
            r#"
\section{Scope}
\begin{itemize}
  \item Covers the home page.
  \item Signed-out only.
  \item Desktop layout.
\end{itemize}
\section{Prerequisites}
\begin{itemize}
  \item A desktop browser.
\end{itemize}
\subsection{Top Navigation}
\begin{longtable}{lll}
\toprule
Control & Type & Function \\
\midrule
\endhead
Search box & input & Query entry \\
Mic & button & Voice search \\
\bottomrule
\end{longtable}
\subsection{Flow A: Search for a Video}
\begin{enumerate}
  \item Open the page.
  \item Type a query.
\end{enumerate}
\subsection{Flow B: Open a Video Watch Page}
\begin{enumerate}
  \item Pick a card.
  \item Click the title.
\end{enumerate}
"#,
        )
    }

    #[test]
    fn test_sync_list_grows_and_overwrites() {
        let tex = sample_tex();
        let layout = LegacyLayout::default();
        let sync = LegacyReconciler::new(&tex, &layout, ".");

        let mut body = XmlNode::new("w:body");
        body.push(make_heading("1. Scope", 1));
        body.push(list_item("old item", "5"));
        body.push(make_heading("2. Prerequisites", 1));

        let mut report = SyncReport::default();
        sync.sync_lists(&mut body, &mut report);

        let texts: Vec<String> = body.elements().map(paragraph_text).collect();
        assert_eq!(
            texts,
            vec![
                "1. Scope",
                "Covers the home page.",
                "Signed-out only.",
                "Desktop layout.",
                "2. Prerequisites"
            ]
        );
        // Prerequisites has no list run in the document: counted, not fatal.
        assert_eq!(report.skipped_blocks, 1);
    }

    #[test]
    fn test_flows_get_distinct_restarted_instances() {
        let tex = sample_tex();
        let layout = LegacyLayout::default();
        let sync = LegacyReconciler::new(&tex, &layout, ".");

        // Both flows share numId 9, as a stale document would.
        let mut body = XmlNode::new("w:body");
        body.push(make_heading("5.1 Flow A: Search for a Video", 2));
        body.push(list_item("step", "9"));
        body.push(make_heading("5.2 Flow B: Open a Video Watch Page", 2));
        body.push(list_item("step", "9"));

        let mut numbering = Numbering::empty();
        let mut report = SyncReport::default();
        sync.sync_flows(&mut body, &mut numbering, &mut report);

        let ids: Vec<&str> = body.elements().filter_map(numbering_id).collect();
        assert_eq!(ids.len(), 4);
        // Flow A keeps its instance, flow B is re-pointed at a fresh one.
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], ids[3]);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn test_missing_section_inserted_with_template_heading() {
        let tex = sample_tex();
        let layout = LegacyLayout::default();
        let sync = LegacyReconciler::new(&tex, &layout, ".");

        let mut body = XmlNode::new("w:body");
        body.push(numbered_heading("5.1", "Flow A: Search for a Video", 2));
        body.push(list_item("Open the page.", "9"));

        let mut numbering = Numbering::empty();
        let mut report = SyncReport::default();
        sync.insert_missing(&mut body, &mut numbering, &mut report);

        let index = HeadingIndex::build(&body);
        let pos = index.resolve("Flow B: Open a Video Watch Page").unwrap();
        // The cloned heading keeps the SectionNumber run of its template.
        if let XmlChild::Element(p) = &body.children[pos] {
            assert!(p
                .children_named("w:r")
                .any(|r| run_style(r) == Some("SectionNumber")));
        } else {
            panic!("expected heading element");
        }
        // Its steps landed under it as list paragraphs.
        if let XmlChild::Element(p) = &body.children[pos + 1] {
            assert!(is_list_paragraph(p));
            assert_eq!(paragraph_text(p), "Pick a card.");
        } else {
            panic!("expected list element");
        }

        // A second pass finds the section and leaves it alone.
        let before = body.children.len();
        sync.insert_missing(&mut body, &mut numbering, &mut report);
        assert_eq!(body.children.len(), before);
    }

    #[test]
    fn test_normalize_strips_typed_numbers_only_with_number_run() {
        let mut body = XmlNode::new("w:body");
        // Auto-numbered heading with a typed prefix left over
        let mut auto = numbered_heading("4.1", "ignored", 2);
        // Overwrite the title run to simulate a manually typed "4.1 Title"
        if let Some(t) = auto
            .elements_mut()
            .filter(|r| r.name == "w:r" && run_style(r).is_none())
            .filter_map(|r| r.child_mut("w:t"))
            .last()
        {
            t.children.clear();
            t.push_text("4.1 Top Navigation");
        }
        body.push(auto);
        // Plainly styled heading: its typed number is the only number
        body.push(make_heading("2. Prerequisites", 1));

        assert_eq!(normalize_manual_numbers(&mut body), 1);
        let texts: Vec<String> = body.elements().map(paragraph_text).collect();
        assert_eq!(texts[0], "4.1 Top Navigation");
        assert_eq!(texts[1], "2. Prerequisites");
    }

    #[test]
    fn test_enforce_heading_numbers_is_idempotent() {
        let mut body = XmlNode::new("w:body");
        body.push(make_heading("Scope", 1));
        body.push(make_heading("Top Navigation", 2));

        let layout = LegacyLayout::default();
        let first = enforce_heading_numbers(&mut body, &layout.heading_numbers);
        assert!(first > 0);
        let second = enforce_heading_numbers(&mut body, &layout.heading_numbers);
        assert_eq!(second, 0);

        if let XmlChild::Element(p) = &body.children[0] {
            assert_eq!(paragraph_text(p), "1Scope");
            assert!(p
                .children_named("w:r")
                .any(|r| run_style(r) == Some("SectionNumber")));
        } else {
            panic!("expected heading element");
        }
    }

    #[test]
    fn test_rewrite_static_settles() {
        let tex = sample_tex();
        let layout = LegacyLayout::default();
        let sync = LegacyReconciler::new(&tex, &layout, ".");

        let mut body = XmlNode::new("w:body");
        body.push(make_heading("7. Build", 1));
        body.push(make_paragraph("stale build instructions"));

        let mut report = SyncReport::default();
        sync.rewrite_static(&mut body, &mut report);
        assert!(report.changed > 0);

        let texts: Vec<String> = body.elements().skip(1).map(paragraph_text).collect();
        assert_eq!(
            texts,
            vec![
                "Run this command in the same directory:",
                "latexmk -pdf main.tex",
                "Output: main.pdf"
            ]
        );

        let mut again = SyncReport::default();
        sync.rewrite_static(&mut body, &mut again);
        assert_eq!(again.changed, 0);
    }

    #[test]
    fn test_shots_pair_anchors_in_order() {
        let tex = LatexSource::new(
            r"\screenshotbox{figures/a.png}{First}{note}
              \screenshotbox{figures/b.png}{Second}{note}",
        );
        let layout = LegacyLayout::default();
        let sync = LegacyReconciler::new(&tex, &layout, ".");
        let shots = sync.shots();
        assert_eq!(shots.len(), 2);
        assert_eq!(shots[0].anchor, "Home Page Overview");
        assert_eq!(shots[0].number, 1);
        assert_eq!(shots[1].anchor, "Top Navigation");
    }
}

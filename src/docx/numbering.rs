//! List numbering definitions and allocation.
//!
//! The numbering part holds abstract definitions (glyph, format, indent) and
//! concrete instances referencing them. Two ordered lists that must each
//! start at 1 need two *distinct* concrete instances, because an instance
//! carries the restart point: sharing one would continue the count across
//! lists. [`Numbering::allocate`] enforces that by always minting a fresh
//! instance with a level-0 start override when a restart is requested.

use crate::docx::xml::XmlNode;

const NUMBERING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Kind of list a numbering definition renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Bulleted list
    Bullet,
    /// Ordered (decimal-numbered) list
    Decimal,
}

impl ListKind {
    /// The OOXML `w:numFmt` value for this kind.
    pub fn num_fmt(&self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet",
            ListKind::Decimal => "decimal",
        }
    }
}

/// The document's numbering part, wrapped for allocation.
#[derive(Debug, Clone)]
pub struct Numbering {
    root: XmlNode,
    dirty: bool,
}

impl Numbering {
    /// Wrap an existing numbering part root.
    pub fn from_root(root: XmlNode) -> Self {
        Self { root, dirty: false }
    }

    /// Create an empty numbering part for documents that have none.
    pub fn empty() -> Self {
        Self {
            root: XmlNode::new("w:numbering")
                .with_attr("xmlns:w", NUMBERING_NS),
            dirty: false,
        }
    }

    /// The part's root element.
    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    /// Whether any definition was added since load.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return a numbering instance id for the requested list kind.
    ///
    /// Reuses an existing abstract definition of the kind when one is
    /// usable; synthesizes one otherwise. With `restart == false` the first
    /// existing concrete instance of the abstract is returned (shared across
    /// bullet lists). With `restart == true` a fresh concrete instance with
    /// a level-0 start override of 1 is always minted, so every restarted
    /// list begins at 1 regardless of what precedes it.
    ///
    /// This never fails: missing definitions are created.
    pub fn allocate(&mut self, kind: ListKind, restart: bool) -> String {
        let abstract_id = match self.find_abstract(kind) {
            Some(id) => id,
            None => self.create_abstract(kind),
        };

        if !restart {
            let existing = self
                .root
                .children_named("w:num")
                .find(|num| {
                    num.child("w:abstractNumId")
                        .and_then(|a| a.attr("w:val"))
                        .map(|v| v == abstract_id)
                        .unwrap_or(false)
                })
                .and_then(|num| num.attr("w:numId"))
                .map(str::to_string);
            if let Some(id) = existing {
                return id;
            }
        }

        self.create_instance(&abstract_id, restart)
    }

    /// Patch an existing concrete instance so its level-0 count restarts
    /// at 1. Returns whether the part was modified; unknown ids are left
    /// alone. Already-overridden instances are untouched, so repeated runs
    /// settle.
    pub fn ensure_restart(&mut self, num_id: &str) -> bool {
        let num = self
            .root
            .elements_mut()
            .find(|n| n.name == "w:num" && n.attr("w:numId") == Some(num_id));
        let num = match num {
            Some(n) => n,
            None => return false,
        };

        let mut changed = false;
        let has_override = num
            .children_named("w:lvlOverride")
            .any(|o| o.attr("w:ilvl") == Some("0"));
        if !has_override {
            num.push(XmlNode::new("w:lvlOverride").with_attr("w:ilvl", "0"));
            changed = true;
        }
        let over = num
            .elements_mut()
            .find(|o| o.name == "w:lvlOverride" && o.attr("w:ilvl") == Some("0"));
        let over = match over {
            Some(o) => o,
            None => return changed,
        };

        match over.child_mut("w:startOverride") {
            Some(start) => {
                if start.attr("w:val") != Some("1") {
                    start.set_attr("w:val", "1");
                    changed = true;
                }
            }
            None => {
                over.push(XmlNode::new("w:startOverride").with_attr("w:val", "1"));
                changed = true;
            }
        }
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Find a reusable abstract definition id for the given kind.
    ///
    /// Bulleted abstracts whose level-0 glyph text is blank are skipped:
    /// some generators emit invisible bullet markers, and reusing one yields
    /// lists with no visible bullet at all.
    fn find_abstract(&self, kind: ListKind) -> Option<String> {
        for absn in self.root.children_named("w:abstractNum") {
            let id = match absn.attr("w:abstractNumId") {
                Some(id) => id,
                None => continue,
            };
            let lvl0 = absn
                .children_named("w:lvl")
                .find(|lvl| lvl.attr("w:ilvl") == Some("0"));
            let lvl0 = match lvl0 {
                Some(lvl) => lvl,
                None => continue,
            };
            let fmt = lvl0.child("w:numFmt").and_then(|f| f.attr("w:val"));
            if fmt != Some(kind.num_fmt()) {
                continue;
            }
            if kind == ListKind::Bullet {
                let glyph = lvl0
                    .child("w:lvlText")
                    .and_then(|t| t.attr("w:val"))
                    .unwrap_or("");
                if glyph.trim().is_empty() {
                    continue;
                }
            }
            return Some(id.to_string());
        }
        None
    }

    /// Synthesize a single-level abstract definition for the kind.
    fn create_abstract(&mut self, kind: ListKind) -> String {
        let new_id = (self.max_attr("w:abstractNum", "w:abstractNumId", 1999) + 1).to_string();

        let mut lvl = XmlNode::new("w:lvl").with_attr("w:ilvl", "0");
        lvl.push(XmlNode::new("w:start").with_attr("w:val", "1"));
        lvl.push(XmlNode::new("w:numFmt").with_attr("w:val", kind.num_fmt()));
        let glyph = match kind {
            ListKind::Decimal => "%1.",
            ListKind::Bullet => "\u{2022}",
        };
        lvl.push(XmlNode::new("w:lvlText").with_attr("w:val", glyph));
        if kind == ListKind::Bullet {
            let rfonts = XmlNode::new("w:rFonts")
                .with_attr("w:ascii", "Symbol")
                .with_attr("w:hAnsi", "Symbol");
            lvl.push(XmlNode::new("w:rPr").with_child(rfonts));
        }
        lvl.push(XmlNode::new("w:lvlJc").with_attr("w:val", "left"));
        let ind = XmlNode::new("w:ind")
            .with_attr("w:left", "720")
            .with_attr("w:hanging", "360");
        lvl.push(XmlNode::new("w:pPr").with_child(ind));

        let absn = XmlNode::new("w:abstractNum")
            .with_attr("w:abstractNumId", new_id.clone())
            .with_child(XmlNode::new("w:multiLevelType").with_attr("w:val", "singleLevel"))
            .with_child(lvl);

        // Abstract definitions must precede concrete instances in the part.
        let at = self
            .root
            .child_index("w:num")
            .unwrap_or(self.root.children.len());
        self.root.insert(at, absn);
        self.dirty = true;
        new_id
    }

    /// Mint a concrete instance referencing an abstract definition.
    fn create_instance(&mut self, abstract_id: &str, restart: bool) -> String {
        let new_id = (self.max_attr("w:num", "w:numId", 999) + 1).to_string();

        let mut num = XmlNode::new("w:num").with_attr("w:numId", new_id.clone());
        num.push(XmlNode::new("w:abstractNumId").with_attr("w:val", abstract_id));
        if restart {
            let over = XmlNode::new("w:lvlOverride")
                .with_attr("w:ilvl", "0")
                .with_child(XmlNode::new("w:startOverride").with_attr("w:val", "1"));
            num.push(over);
        }
        self.root.push(num);
        self.dirty = true;
        new_id
    }

    fn max_attr(&self, element: &str, attr: &str, default: u32) -> u32 {
        self.root
            .children_named(element)
            .filter_map(|n| n.attr(attr))
            .filter_map(|v| v.parse::<u32>().ok())
            .max()
            .unwrap_or(default)
    }
}

//! Generic OOXML element tree.
//!
//! The reconcilers mutate an existing styled document in place, so every
//! element and attribute they do not understand must survive a load/save
//! round trip untouched. A small generic tree gives that guarantee: nodes
//! keep their qualified names (`w:p`, `w:pPr`, ...) and attributes verbatim,
//! and only the parts the engine edits ever change.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

/// A child of an XML element: a nested element or a text node.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    /// A nested element
    Element(XmlNode),
    /// A text node (unescaped)
    Text(String),
}

/// An XML element with qualified name, attributes, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    /// Qualified element name (e.g. `w:p`)
    pub name: String,
    /// Attributes in document order, qualified names verbatim
    pub attrs: Vec<(String, String)>,
    /// Child elements and text nodes in document order
    pub children: Vec<XmlChild>,
}

impl XmlNode {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.push(child);
        self
    }

    /// Get an attribute value by qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.attrs.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// Append a child element.
    pub fn push(&mut self, child: XmlNode) {
        self.children.push(XmlChild::Element(child));
    }

    /// Append a text node.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlChild::Text(text.into()));
    }

    /// Insert a child element at the given child index.
    pub fn insert(&mut self, index: usize, child: XmlNode) {
        self.children.insert(index, XmlChild::Element(child));
    }

    /// Remove the child at the given index.
    pub fn remove(&mut self, index: usize) -> XmlChild {
        self.children.remove(index)
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.elements().find(|n| n.name == name)
    }

    /// Mutable first child element with the given name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlNode> {
        self.elements_mut().find(|n| n.name == name)
    }

    /// Index of the first child element with the given name.
    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| match c {
            XmlChild::Element(n) => n.name == name,
            XmlChild::Text(_) => false,
        })
    }

    /// Iterate child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|c| match c {
            XmlChild::Element(n) => Some(n),
            XmlChild::Text(_) => None,
        })
    }

    /// Iterate child elements mutably.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlNode> {
        self.children.iter_mut().filter_map(|c| match c {
            XmlChild::Element(n) => Some(n),
            XmlChild::Text(_) => None,
        })
    }

    /// Iterate child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.elements().filter(move |n| n.name == name)
    }

    /// Get or create the first child element with the given name,
    /// inserting it at the front when absent.
    ///
    /// OOXML property containers (`w:pPr`, `w:rPr`) must precede content
    /// children, which front insertion preserves.
    pub fn ensure_child_front(&mut self, name: &str) -> &mut XmlNode {
        if self.child_index(name).is_none() {
            self.insert(0, XmlNode::new(name));
        }
        self.child_mut(name).expect("child just ensured")
    }

    /// Remove every child element with the given name.
    pub fn remove_children_named(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| match c {
            XmlChild::Element(n) => n.name != name,
            XmlChild::Text(_) => true,
        });
        before - self.children.len()
    }

    /// First descendant element with the given name, depth-first.
    pub fn descendant(&self, name: &str) -> Option<&XmlNode> {
        for el in self.elements() {
            if el.name == name {
                return Some(el);
            }
            if let Some(found) = el.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Check whether any descendant element has the given name.
    pub fn has_descendant(&self, name: &str) -> bool {
        self.descendant(name).is_some()
    }

    /// Concatenated text content of all descendant elements with the given
    /// name (e.g. `w:t` for paragraph text).
    pub fn collect_text(&self, name: &str) -> String {
        let mut out = String::new();
        self.collect_text_into(name, &mut out);
        out
    }

    fn collect_text_into(&self, name: &str, out: &mut String) {
        for el in self.elements() {
            if el.name == name {
                for child in &el.children {
                    if let XmlChild::Text(t) = child {
                        out.push_str(t);
                    }
                }
            }
            el.collect_text_into(name, out);
        }
    }

    /// Direct text content of this element.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlChild::Text(t) => Some(t.as_str()),
                XmlChild::Element(_) => None,
            })
            .collect()
    }

    /// Parse an XML document and return its root element.
    pub fn parse(xml: &str) -> Result<XmlNode> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let node = node_from_event(&e)?;
                    stack.push(node);
                }
                Ok(Event::Empty(e)) => {
                    let node = node_from_event(&e)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::End(_)) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Xml(e.to_string()))?
                        .into_owned();
                    if let Some(parent) = stack.last_mut() {
                        if !text.is_empty() {
                            parent.push_text(text);
                        }
                    }
                }
                Ok(Event::CData(t)) => {
                    let text = String::from_utf8_lossy(&t).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(text);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // declaration, comments, processing instructions
                Err(e) => return Err(Error::Xml(e.to_string())),
            }
        }

        root.ok_or_else(|| Error::Xml("no root element".to_string()))
    }

    /// Serialize this element (with the standard OOXML declaration) to a
    /// UTF-8 document string.
    pub fn to_document_string(&self) -> String {
        let mut out =
            String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n");
        self.write_into(&mut out);
        out
    }

    /// Serialize this element alone, without a declaration.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlChild::Element(n) => n.write_into(out),
                XmlChild::Text(t) => out.push_str(&escape(t.as_str())),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn node_from_event(e: &quick_xml::events::BytesStart<'_>) -> Result<XmlNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut node = XmlNode::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(e.to_string()))?
            .into_owned();
        node.attrs.push((key, value));
    }
    Ok(node)
}

fn attach(stack: &mut Vec<XmlNode>, root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(Error::Xml("multiple root elements".to_string()));
    }
    Ok(())
}

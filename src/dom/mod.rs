//! Owned HTML tree.
//!
//! `tl` gives us a fast, borrowed parse of the source text. Documents need to
//! outlive their source string and be mutated (ids assigned, markers removed,
//! editor assets injected), so the parse is converted into this owned tree.
//!
//! Text nodes keep their markup form: entities stay encoded exactly as they
//! appeared in the source, and serialization writes them back verbatim.

mod normalize;
mod parse;
mod serialize;

pub use parse::parse_document;

use crate::utils::html::{escape, is_raw_text_element};

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text in markup form (already escaped).
    Text(String),
    Comment(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((key.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let index = self
            .attrs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))?;
        Some(self.attrs.remove(index).1)
    }

    /// The `id` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    /// Append plain text, escaping it unless this is a raw text element.
    pub fn push_text(&mut self, text: &str) {
        let text = if is_raw_text_element(&self.name) {
            text.to_string()
        } else {
            escape(text).into_owned()
        };
        self.children.push(Node::Text(text));
    }

    pub fn push_element(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child element named `name`.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Depth-first search for an element with the given id (self included).
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find_by_id(id))
    }

    /// Remove the first descendant with the given id, returning it.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Element> {
        let index = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.id() == Some(id)));
        if let Some(index) = index
            && let Node::Element(element) = self.children.remove(index)
        {
            return Some(element);
        }

        self.children.iter_mut().find_map(|node| match node {
            Node::Element(e) => e.remove_by_id(id),
            _ => None,
        })
    }

    /// Visit every descendant element (not self) in document order.
    pub fn for_each_descendant_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        for node in &mut self.children {
            if let Node::Element(child) = node {
                f(child);
                child.for_each_descendant_mut(f);
            }
        }
    }

    /// Visit every descendant element (not self) in document order.
    pub fn for_each_descendant(&self, f: &mut impl FnMut(&Element)) {
        for child in self.child_elements() {
            f(child);
            child.for_each_descendant(f);
        }
    }

    /// Serialize this element and its subtree.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        serialize::write_element(&mut out, self);
        out
    }

    /// Serialize the children of this element.
    #[cfg(test)]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            serialize::write_node(&mut out, node);
        }
        out
    }
}

/// A parsed document, always shaped `html > (head, body)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Attributes of the `<html>` element.
    pub html_attrs: Vec<(String, String)>,
    pub head: Element,
    pub body: Element,
}

impl Document {
    /// Split a root `<html>` element into head and body.
    ///
    /// Missing sections are created empty; any other direct children of the
    /// root are moved into the body.
    pub fn from_root(root: Element) -> Self {
        let mut head = None;
        let mut body = None;
        let mut stray = Vec::new();

        for node in root.children {
            match node {
                Node::Element(e) if e.name == "head" && head.is_none() => head = Some(e),
                Node::Element(e) if e.name == "body" && body.is_none() => body = Some(e),
                Node::Text(t) if t.trim().is_empty() => {}
                other => stray.push(other),
            }
        }

        let mut body = body.unwrap_or_else(|| Element::new("body"));
        body.children.extend(stray);

        Self {
            html_attrs: root.attrs,
            head: head.unwrap_or_else(|| Element::new("head")),
            body,
        }
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<&Element> {
        self.head
            .find_by_id(id)
            .or_else(|| self.body.find_by_id(id))
    }

    pub fn remove_element_by_id(&mut self, id: &str) -> Option<Element> {
        self.head
            .remove_by_id(id)
            .or_else(|| self.body.remove_by_id(id))
    }

    /// `outerHTML` of the document element.
    pub fn outer_html(&self) -> String {
        let mut out = String::from("<html");
        serialize::write_attrs(&mut out, &self.html_attrs);
        out.push('>');
        serialize::write_element(&mut out, &self.head);
        serialize::write_element(&mut out, &self.body);
        out.push_str("</html>");
        out
    }

    /// Full page with doctype, as served to a browser.
    pub fn to_page(&self) -> String {
        format!("<!DOCTYPE html>{}", self.outer_html())
    }
}

//! Markup → owned tree, shaped the way a browser's DOMParser would.

use super::normalize::{RAW_MARKER, normalize};
use super::{Document, Element, Node};
use crate::utils::html::escape;

/// Parse a full page or a fragment into a document.
///
/// Always succeeds: `html`, `head` and `body` are synthesized when the source
/// lacks them, and input `tl` rejects outright becomes text in the body.
pub fn parse_document(input: &str) -> Document {
    let normalized = normalize(input);
    let nodes = match tl::parse(&normalized.markup, tl::ParserOptions::default()) {
        Ok(dom) => {
            let parser = dom.parser();
            dom.children()
                .iter()
                .filter_map(|handle| convert(*handle, parser, &normalized.raw_bodies))
                .collect()
        }
        Err(e) => {
            crate::debug!("parse"; "parse failure, falling back to text content: {:?}", e);
            vec![Node::Text(escape(input).into_owned())]
        }
    };

    Document::from_root(into_root(nodes))
}

/// Convert a tl node handle (and its subtree) into an owned node.
fn convert(handle: tl::NodeHandle, parser: &tl::Parser, raw_bodies: &[String]) -> Option<Node> {
    match handle.get(parser)? {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_ascii_lowercase();
            if name.starts_with('!') {
                return None; // <!DOCTYPE ...>
            }

            let mut element = Element::new(name);
            for (key, value) in tag.attributes().iter() {
                let value = value.map(|v| v.to_string()).unwrap_or_default();
                element.attrs.push((key.to_ascii_lowercase(), value));
            }

            let raw = element
                .remove_attr(RAW_MARKER)
                .and_then(|index| index.parse::<usize>().ok())
                .and_then(|index| raw_bodies.get(index));
            if let Some(body) = raw {
                if !body.is_empty() {
                    element.children.push(Node::Text(body.clone()));
                }
                return Some(Node::Element(element));
            }

            element.children = tag
                .children()
                .top()
                .iter()
                .filter_map(|child| convert(*child, parser, raw_bodies))
                .collect();

            Some(Node::Element(element))
        }
        tl::Node::Raw(bytes) => Some(Node::Text(bytes.as_utf8_str().into_owned())),
        tl::Node::Comment(bytes) => {
            let raw: &str = &bytes.as_utf8_str();
            let body = raw
                .strip_prefix("<!--")
                .and_then(|s| s.strip_suffix("-->"))
                .unwrap_or(raw);
            if body.trim_start().to_ascii_lowercase().starts_with("doctype") {
                return None;
            }
            Some(Node::Comment(body.to_string()))
        }
    }
}

/// Gather top-level nodes under a single `<html>` root.
fn into_root(nodes: Vec<Node>) -> Element {
    let mut root = None;
    let mut rest = Vec::new();

    for node in nodes {
        match node {
            Node::Element(e) if e.name == "html" && root.is_none() => root = Some(e),
            Node::Text(t) if t.trim().is_empty() => {}
            // Comments outside <html> have no place in documentElement
            Node::Comment(_) => {}
            other => rest.push(other),
        }
    }

    let mut root = root.unwrap_or_else(|| Element::new("html"));
    root.children.extend(rest);
    hoist_metadata(&mut root);
    root
}

/// Leading metadata elements outside `<head>` belong in it.
fn hoist_metadata(root: &mut Element) {
    let leading = root
        .children
        .iter()
        .take_while(|node| match node {
            Node::Element(e) => is_metadata_element(&e.name),
            Node::Text(t) => t.trim().is_empty(),
            Node::Comment(_) => true,
        })
        .count();
    if leading == 0 {
        return;
    }

    let moved: Vec<Node> = root
        .children
        .drain(..leading)
        .filter(|node| matches!(node, Node::Element(_)))
        .collect();

    match root.child_mut("head") {
        Some(head) => {
            head.children.splice(0..0, moved);
        }
        None => {
            let mut head = Element::new("head");
            head.children = moved;
            root.children.insert(0, Node::Element(head));
        }
    }
}

fn is_metadata_element(name: &str) -> bool {
    matches!(
        name,
        "title" | "meta" | "link" | "style" | "base" | "script" | "noscript"
    )
}

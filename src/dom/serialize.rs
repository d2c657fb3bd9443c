use super::{Element, Node};
use crate::utils::html::is_void_element;

pub(super) fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(e) => write_element(out, e),
        Node::Text(text) => out.push_str(text),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

pub(super) fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    write_attrs(out, &element.attrs);
    out.push('>');

    if is_void_element(&element.name) {
        return;
    }

    for child in &element.children {
        write_node(out, child);
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// Attribute values are kept in source form; only the quote is re-escaped.
pub(super) fn write_attrs(out: &mut String, attrs: &[(String, String)]) {
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
}

//! Tag-level pass that runs before `tl`.
//!
//! `tl` parses whatever nesting the source spells out. Browsers do more: a
//! `<script>` body is opaque text, and `<li>`, `<p>`, `<td>` and friends close
//! themselves when a sibling starts. This pass rewrites the source so that the
//! structure `tl` sees is the one a browser would build:
//!
//! - raw text bodies (`script`, `style`, `textarea`, `title`) are lifted out
//!   and replaced by an empty element carrying [`RAW_MARKER`]
//! - optional end tags are written out, and stray end tags are dropped
//! - a `<tr>` directly inside `<table>` gets its `<tbody>`

use std::fmt::Write;

use crate::utils::html::{is_escapable_raw_text_element, is_raw_text_element, is_void_element};

/// Attribute holding the index of a lifted raw text body.
pub(super) const RAW_MARKER: &str = "data-livepage-raw";

pub(super) struct Normalized {
    pub markup: String,
    pub raw_bodies: Vec<String>,
}

pub(super) fn normalize(src: &str) -> Normalized {
    Normalizer {
        src,
        lower: src.to_ascii_lowercase(),
        pos: 0,
        out: String::with_capacity(src.len() + 32),
        open: Vec::new(),
        raw_bodies: Vec::new(),
    }
    .run()
}

struct Normalizer<'a> {
    src: &'a str,
    /// ASCII-lowercased copy of `src`; byte offsets are shared.
    lower: String,
    pos: usize,
    out: String,
    open: Vec<String>,
    raw_bodies: Vec<String>,
}

impl Normalizer<'_> {
    fn run(mut self) -> Normalized {
        let src = self.src;
        while self.pos < src.len() {
            let rest = &src[self.pos..];
            let Some(lt) = rest.find('<') else {
                self.out.push_str(rest);
                break;
            };
            self.out.push_str(&rest[..lt]);
            self.pos += lt;
            self.markup();
        }
        self.close_to(0);

        Normalized {
            markup: self.out,
            raw_bodies: self.raw_bodies,
        }
    }

    /// Consume one construct starting at `<`.
    fn markup(&mut self) {
        let src = self.src;
        let rest = &src[self.pos..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            let end = comment.find("-->").map_or(rest.len(), |i| i + 7);
            self.copy(end);
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            self.copy(end);
        } else if rest.starts_with("</") && name_len(&rest[2..]) > 0 {
            self.end_tag();
        } else if name_len(&rest[1..]) > 0 {
            self.start_tag();
        } else {
            self.out.push_str("&lt;");
            self.pos += 1;
        }
    }

    fn copy(&mut self, len: usize) {
        self.out.push_str(&self.src[self.pos..self.pos + len]);
        self.pos += len;
    }

    fn start_tag(&mut self) {
        let src = self.src;
        let rest = &src[self.pos..];
        let Some(gt) = tag_end(rest) else {
            // `<name` running to the end of input is text
            self.out.push_str("&lt;");
            self.pos += 1;
            return;
        };

        let len = name_len(&rest[1..]);
        let name = rest[1..1 + len].to_ascii_lowercase();
        let attrs = &rest[1 + len..gt];
        self.pos += gt + 1;

        self.close_implied(&name);

        if is_raw_text_element(&name) || is_escapable_raw_text_element(&name) {
            let attrs = attrs.strip_suffix('/').unwrap_or(attrs);
            let body = self.take_raw_body(&name);
            let index = self.raw_bodies.len();
            let _ = write!(self.out, "<{name}{attrs} {RAW_MARKER}=\"{index}\"></{name}>");
            self.raw_bodies.push(body);
            return;
        }

        if is_void_element(&name) {
            let _ = write!(self.out, "<{name}{attrs}>");
            return;
        }

        // `<div/>` opens a div in HTML
        let attrs = attrs.strip_suffix('/').unwrap_or(attrs);
        let _ = write!(self.out, "<{name}{attrs}>");
        self.open.push(name);
    }

    fn end_tag(&mut self) {
        let src = self.src;
        let rest = &src[self.pos..];
        let name = rest[2..2 + name_len(&rest[2..])].to_ascii_lowercase();
        self.pos += tag_end(rest).map_or(rest.len(), |i| i + 1);

        if let Some(depth) = self.open.iter().rposition(|open| *open == name) {
            self.close_to(depth);
        }
    }

    /// Body of a raw text element up to its end tag, which is consumed.
    /// An unterminated body runs to the end of input.
    fn take_raw_body(&mut self, name: &str) -> String {
        let src = self.src;
        let close = format!("</{name}");
        let mut from = self.pos;

        while let Some(i) = self.lower[from..].find(close.as_str()) {
            let at = from + i;
            let next = self.lower.as_bytes().get(at + close.len());
            if matches!(next, None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')) {
                let body = src[self.pos..at].to_string();
                let after = &src[at..];
                self.pos = at + after.find('>').map_or(after.len(), |i| i + 1);
                return body;
            }
            from = at + close.len();
        }

        let body = src[self.pos..].to_string();
        self.pos = src.len();
        body
    }

    /// End the elements that a start tag of `name` implicitly closes.
    fn close_implied(&mut self, name: &str) {
        match name {
            "li" => self.close_nearest(&["li"], |e| !is_special(e) || matches!(e, "address" | "div" | "p")),
            "dd" | "dt" => self.close_nearest(&["dd", "dt"], |e| {
                !is_special(e) || matches!(e, "address" | "div" | "p")
            }),
            "option" => self.close_top("option"),
            "optgroup" => {
                self.close_top("option");
                self.close_top("optgroup");
            }
            "td" | "th" => self.close_nearest(&["td", "th"], |e| !is_special(e)),
            "tr" => {
                self.close_nearest(&["tr"], |e| !is_special(e) || matches!(e, "td" | "th"));
                if self.open.last().is_some_and(|top| top == "table") {
                    self.out.push_str("<tbody>");
                    self.open.push("tbody".to_string());
                }
            }
            "thead" | "tbody" | "tfoot" => self.close_nearest(&["thead", "tbody", "tfoot"], |e| {
                !is_special(e) || matches!(e, "tr" | "td" | "th")
            }),
            "body" => self.close_nearest(&["head"], |_| true),
            _ => {}
        }

        if closes_paragraph(name) {
            self.close_nearest(&["p"], |e| !is_button_scope_boundary(e));
        }
    }

    /// Walk down from the current element; close through the first one named
    /// in `targets`, giving up at the first element `passable` rejects.
    fn close_nearest(&mut self, targets: &[&str], passable: impl Fn(&str) -> bool) {
        for depth in (0..self.open.len()).rev() {
            let open = self.open[depth].as_str();
            if targets.contains(&open) {
                self.close_to(depth);
                return;
            }
            if !passable(open) {
                return;
            }
        }
    }

    fn close_top(&mut self, name: &str) {
        if self.open.last().is_some_and(|top| top == name) {
            self.close_to(self.open.len() - 1);
        }
    }

    /// Write end tags for every element from `depth` up.
    fn close_to(&mut self, depth: usize) {
        for name in self.open.drain(depth..).rev() {
            let _ = write!(self.out, "</{name}>");
        }
    }
}

fn name_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
        .count()
}

/// Offset of the `>` ending the tag at the start of `tag`, skipping quoted
/// attribute values.
fn tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in tag.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Start tags that end an open `<p>`.
fn closes_paragraph(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "center"
            | "details"
            | "dialog"
            | "dir"
            | "div"
            | "dl"
            | "dd"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "li"
            | "listing"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "search"
            | "section"
            | "summary"
            | "table"
            | "ul"
            | "xmp"
    )
}

fn is_button_scope_boundary(name: &str) -> bool {
    matches!(
        name,
        "applet" | "button" | "caption" | "html" | "marquee" | "object" | "table" | "td" | "template" | "th"
    )
}

/// Elements with their own parsing rules; implied closes do not reach past them.
fn is_special(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "applet"
            | "article"
            | "aside"
            | "blockquote"
            | "body"
            | "button"
            | "caption"
            | "center"
            | "colgroup"
            | "dd"
            | "details"
            | "dir"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "head"
            | "header"
            | "hgroup"
            | "html"
            | "iframe"
            | "li"
            | "listing"
            | "main"
            | "marquee"
            | "menu"
            | "nav"
            | "noscript"
            | "object"
            | "ol"
            | "p"
            | "pre"
            | "search"
            | "section"
            | "select"
            | "summary"
            | "table"
            | "tbody"
            | "td"
            | "template"
            | "tfoot"
            | "th"
            | "thead"
            | "tr"
            | "ul"
            | "xmp"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(src: &str) -> String {
        normalize(src).markup
    }

    #[test]
    fn test_list_items_close_each_other() {
        assert_eq!(
            markup("<ul><li>a<li>b</ul>"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_nested_list_is_not_closed() {
        assert_eq!(
            markup("<ul><li>a<ul><li>b</ul><li>c</ul>"),
            "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>"
        );
    }

    #[test]
    fn test_block_closes_paragraph() {
        assert_eq!(markup("<p>one<p>two"), "<p>one</p><p>two</p>");
        assert_eq!(
            markup("<p>intro<span>x<div>y</div>"),
            "<p>intro<span>x</span></p><div>y</div>"
        );
    }

    #[test]
    fn test_table_rows_and_cells() {
        assert_eq!(
            markup("<table><tr><td>a<td>b<tr><td>c</table>"),
            "<table><tbody><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_options_close_each_other() {
        assert_eq!(
            markup("<select><option>a<option>b</select>"),
            "<select><option>a</option><option>b</option></select>"
        );
    }

    #[test]
    fn test_stray_end_tag_is_dropped() {
        assert_eq!(markup("<div>a</span></div>"), "<div>a</div>");
    }

    #[test]
    fn test_raw_text_is_lifted() {
        let normalized = normalize("<script type=\"module\">if (a < b) {}</SCRIPT ><p>z</p>");
        assert_eq!(
            normalized.markup,
            format!("<script type=\"module\" {RAW_MARKER}=\"0\"></script><p>z</p>")
        );
        assert_eq!(normalized.raw_bodies, vec!["if (a < b) {}".to_string()]);
    }

    #[test]
    fn test_raw_text_ignores_lookalike_end_tag() {
        let normalized = normalize("<script>let s = '</scripts>';</script>");
        assert_eq!(normalized.raw_bodies, vec!["let s = '</scripts>';".to_string()]);
    }

    #[test]
    fn test_unterminated_raw_text_runs_to_end() {
        let normalized = normalize("<style>p { color: red }");
        assert_eq!(normalized.raw_bodies, vec!["p { color: red }".to_string()]);
    }

    #[test]
    fn test_comments_and_bare_angle_brackets() {
        assert_eq!(markup("<!-- <li> --><p>1 < 2</p>"), "<!-- <li> --><p>1 &lt; 2</p>");
    }

    #[test]
    fn test_quoted_gt_in_attribute() {
        assert_eq!(
            markup("<div title=\"a>b\"><li>x</div>"),
            "<div title=\"a>b\"><li>x</li></div>"
        );
    }

    #[test]
    fn test_body_closes_head() {
        assert_eq!(
            markup("<html><head><meta charset=\"utf-8\"><body><p>x"),
            "<html><head><meta charset=\"utf-8\"></head><body><p>x</p></body></html>"
        );
    }
}

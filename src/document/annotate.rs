//! Derived parse stage: markup → annotated document.

use uuid::Uuid;

use crate::dom::{Document, parse_document};

/// Prefix of every generated element id.
pub const ID_PREFIX: &str = "PageEditorId-";

/// Present while an element of the page is being edited in place.
pub const EDITING_AREA_ID: &str = "pageEditorEditingArea";
/// Editor script injected by the edit-mode render.
pub const EDITOR_SCRIPT_ID: &str = "pageEditorscript";
/// Editor stylesheet injected by the edit-mode render.
pub const EDITOR_STYLE_ID: &str = "pageEditorStyle";

/// Parse `raw` and give every body element without an id a generated one.
///
/// When the editing area is present the editor assets are removed, so a saved
/// mid-edit page does not carry a stale editor script into the live view.
pub fn annotate(raw: &str) -> Document {
    let mut doc = parse_document(raw);

    doc.body.for_each_descendant_mut(&mut |element| {
        if element.id().is_none() {
            element.set_attr("id", &generate_id());
        }
    });

    if doc.get_element_by_id(EDITING_AREA_ID).is_some() {
        doc.remove_element_by_id(EDITOR_SCRIPT_ID);
        doc.remove_element_by_id(EDITOR_STYLE_ID);
    }

    doc
}

pub fn generate_id() -> String {
    format!("{ID_PREFIX}{}", Uuid::new_v4())
}

pub fn is_generated_id(id: &str) -> bool {
    id.starts_with(ID_PREFIX)
}

/// Remove every generated id, leaving author ids untouched.
pub fn strip_generated_ids(doc: &mut Document) {
    let mut strip = |element: &mut crate::dom::Element| {
        if element.id().is_some_and(is_generated_id) {
            element.remove_attr("id");
        }
    };
    doc.head.for_each_descendant_mut(&mut strip);
    doc.body.for_each_descendant_mut(&mut strip);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn looks_generated(id: &str) -> bool {
        let Some(suffix) = id.strip_prefix(ID_PREFIX) else {
            return false;
        };
        suffix.len() == 36
            && suffix
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c) || c == '-')
    }

    #[test]
    fn test_fragment_gets_generated_id() {
        let doc = annotate("<div>hi</div>");
        let div = doc.body.child_elements().next().unwrap();
        assert_eq!(div.name, "div");
        assert!(looks_generated(div.id().unwrap()), "{:?}", div.id());
    }

    #[test]
    fn test_ids_unique_and_existing_kept() {
        let doc = annotate(
            r#"<body><main id="main"><p>a</p><p>b</p><ul><li>1</li><li id="two">2</li></ul></main></body>"#,
        );

        let mut seen = FxHashSet::default();
        let mut generated = 0;
        doc.body.for_each_descendant(&mut |e| {
            let id = e.id().expect("every body element has an id");
            assert!(seen.insert(id.to_string()), "duplicate id {id}");
            if is_generated_id(id) {
                generated += 1;
            }
        });

        assert_eq!(generated, 4);
        assert!(doc.get_element_by_id("main").is_some());
        assert!(doc.get_element_by_id("two").is_some());
    }

    #[test]
    fn test_head_and_body_element_untouched() {
        let doc = annotate("<html><head><title>t</title></head><body><p>x</p></body></html>");
        assert_eq!(doc.head.inner_html(), "<title>t</title>");
        assert_eq!(doc.body.attr("id"), None);
    }

    #[test]
    fn test_empty_body_generates_nothing() {
        let doc = annotate("<html><head></head><body></body></html>");
        assert_eq!(doc.body.child_elements().count(), 0);
    }

    #[test]
    fn test_editing_area_removes_editor_assets() {
        let src = format!(
            r#"<html><head><script id="{EDITOR_SCRIPT_ID}">x()</script><style id="{EDITOR_STYLE_ID}">p{{}}</style></head><body><textarea id="{EDITING_AREA_ID}"></textarea></body></html>"#
        );
        let doc = annotate(&src);
        assert!(doc.get_element_by_id(EDITOR_SCRIPT_ID).is_none());
        assert!(doc.get_element_by_id(EDITOR_STYLE_ID).is_none());
        assert!(doc.get_element_by_id(EDITING_AREA_ID).is_some());
    }

    #[test]
    fn test_editor_assets_kept_outside_edit_mode() {
        let src = format!(r#"<head><script id="{EDITOR_SCRIPT_ID}"></script></head><body></body>"#);
        let doc = annotate(&src);
        assert!(doc.get_element_by_id(EDITOR_SCRIPT_ID).is_some());
    }

    #[test]
    fn test_strip_generated_ids() {
        let mut doc = annotate(r#"<p id="keep">a</p><p>b</p>"#);
        strip_generated_ids(&mut doc);
        assert_eq!(doc.body.inner_html(), r#"<p id="keep">a</p><p>b</p>"#);
    }
}

//! Edit-mode rendering: a document snapshot with the editor assets injected.

use super::annotate::{EDITOR_SCRIPT_ID, EDITOR_STYLE_ID};
use crate::core::DocumentName;
use crate::dom::{Document, Element};

const EDITOR_STYLE: &str = ".highlight { background-color: red}";

/// Full page for `GET /edit/:page`.
///
/// Works on a copy; the shared snapshot is never mutated.
pub fn render_edit_page(name: &DocumentName, snapshot: &Document) -> String {
    let mut doc = snapshot.clone();

    let mut script = Element::new("script").with_attr("id", EDITOR_SCRIPT_ID);
    script.push_text(&editor_script(name));
    doc.head.push_element(script);

    let mut style = Element::new("style").with_attr("id", EDITOR_STYLE_ID);
    style.push_text(EDITOR_STYLE);
    doc.head.push_element(style);

    doc.to_page()
}

/// Highlights the hovered element; a click posts its id back for editing.
fn editor_script(name: &DocumentName) -> String {
    let target = serde_json::to_string(&format!("/edit/{name}"))
        .unwrap_or_else(|_| "\"/edit/\"".to_string());

    format!(
        r#"let prev = null;

function onClick(event) {{
  event.target.removeEventListener('click', onClick);
  fetch({target}, {{
    headers: {{
      'Content-Type': 'application/json'
    }},
    method: 'post',
    body: JSON.stringify({{ elementId: event.target.id }})
  }});
}}

function onMouseover(event) {{
  const editingArea = document.getElementById('pageEditorEditingArea');

  if (event.target === document.body || (prev && prev === event.target)) {{
    return;
  }}

  if (prev) {{
    prev.classList.remove('highlight');
    prev.removeEventListener('click', onClick);
    prev = null;
  }}

  if (event.target && !editingArea) {{
    prev = event.target;
    prev.classList.add('highlight');
    prev.addEventListener('click', onClick);
  }}
}}

document.addEventListener('DOMContentLoaded', function () {{
  document.body.addEventListener('mouseover', onMouseover, false);
}})"#
    )
}

//! Datastar server-sent events.
//!
//! ```text
//! event: datastar-merge-fragments
//! data: selector #form
//! data: mergeMode after
//! data: fragments <section id="answer">...</section>
//!
//! ```

use std::fmt::Write;

/// Response head for an event stream, written before the first event.
pub const STREAM_HEAD: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/event-stream\r\n\
Cache-Control: no-cache\r\n\
Connection: keep-alive\r\n\
\r\n";

/// SSE comment used to detect dead connections.
pub const HEARTBEAT: &str = ": keepalive\n\n";

const MERGE_EVENT: &str = "datastar-merge-fragments";
const REMOVE_EVENT: &str = "datastar-remove-fragments";

/// How a merged fragment is applied to the page.
#[allow(dead_code)] // full protocol set; the server itself uses morph and after
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    #[default]
    Morph,
    Inner,
    Outer,
    Prepend,
    Append,
    Before,
    After,
    UpsertAttributes,
}

impl MergeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morph => "morph",
            Self::Inner => "inner",
            Self::Outer => "outer",
            Self::Prepend => "prepend",
            Self::Append => "append",
            Self::Before => "before",
            Self::After => "after",
            Self::UpsertAttributes => "upsertAttributes",
        }
    }
}

/// One push to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Merge {
        markup: String,
        mode: MergeMode,
        selector: Option<String>,
    },
    Remove {
        selector: String,
    },
}

impl Fragment {
    /// Morph `markup` into the page, matched by element id.
    pub fn merge(markup: impl Into<String>) -> Self {
        Self::Merge {
            markup: markup.into(),
            mode: MergeMode::default(),
            selector: None,
        }
    }

    pub fn merge_at(markup: impl Into<String>, mode: MergeMode, selector: impl Into<String>) -> Self {
        Self::Merge {
            markup: markup.into(),
            mode,
            selector: Some(selector.into()),
        }
    }

    pub fn remove(selector: impl Into<String>) -> Self {
        Self::Remove {
            selector: selector.into(),
        }
    }

    /// Encode as one SSE event, terminated by a blank line.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Merge {
                markup,
                mode,
                selector,
            } => {
                writeln!(out, "event: {MERGE_EVENT}").ok();
                if let Some(selector) = selector {
                    writeln!(out, "data: selector {selector}").ok();
                }
                if *mode != MergeMode::Morph {
                    writeln!(out, "data: mergeMode {}", mode.as_str()).ok();
                }
                // An SSE data line ends at CR, LF or CRLF
                let markup = markup.replace("\r\n", "\n").replace('\r', "\n");
                for line in markup.lines() {
                    writeln!(out, "data: fragments {line}").ok();
                }
            }
            Self::Remove { selector } => {
                writeln!(out, "event: {REMOVE_EVENT}").ok();
                writeln!(out, "data: selector {selector}").ok();
            }
        }
        out.push('\n');
        out
    }
}

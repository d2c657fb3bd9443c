//! Document names.

use std::fmt;
use std::path::{Path, PathBuf};

use super::LiveError;

/// Key of a watched document: a file name inside the page directory.
///
/// Validated on construction, so a name can always be joined onto the page
/// directory without escaping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentName(String);

impl DocumentName {
    /// Validate a raw (already percent-decoded) name.
    pub fn parse(raw: &str) -> Result<Self, LiveError> {
        if raw.is_empty() {
            return Err(LiveError::malformed("empty document name"));
        }
        if raw == "." || raw == ".." {
            return Err(LiveError::malformed(format!("invalid document name `{raw}`")));
        }
        if raw.contains(['/', '\\', '\0']) {
            return Err(LiveError::malformed(format!(
                "document name `{raw}` must not contain path separators"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Decode a URL path segment, then validate it.
    pub fn from_segment(segment: &str) -> Result<Self, LiveError> {
        let decoded = percent_encoding::percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| LiveError::malformed("document name is not valid UTF-8"))?;
        Self::parse(&decoded)
    }

    /// Recover a name from a path inside `dir`.
    pub fn from_path(dir: &Path, path: &Path) -> Option<Self> {
        if path.parent()? != dir {
            return None;
        }
        Self::parse(path.file_name()?.to_str()?).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of this document inside `dir`.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.0)
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for raw in ["a.html", "index.htm", "notes", ".hidden.html", "with space.html"] {
            assert_eq!(DocumentName::parse(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_rejects_traversal_and_separators() {
        for raw in ["", ".", "..", "../etc/passwd", "a/b.html", "a\\b.html", "a\0b"] {
            assert!(
                matches!(DocumentName::parse(raw), Err(LiveError::MalformedSignal(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_from_segment_decodes() {
        let name = DocumentName::from_segment("my%20page.html").unwrap();
        assert_eq!(name.as_str(), "my page.html");

        // Encoded separator is still rejected after decoding
        assert!(DocumentName::from_segment("..%2Fsecret").is_err());
    }

    #[test]
    fn test_from_path() {
        let dir = Path::new("/srv/page");
        assert_eq!(
            DocumentName::from_path(dir, Path::new("/srv/page/a.html")),
            Some(DocumentName::parse("a.html").unwrap())
        );
        assert_eq!(DocumentName::from_path(dir, Path::new("/srv/page/sub/a.html")), None);
        assert_eq!(DocumentName::from_path(dir, Path::new("/srv/other/a.html")), None);
    }

    #[test]
    fn test_path_in() {
        let name = DocumentName::parse("a.html").unwrap();
        assert_eq!(name.path_in(Path::new("page")), PathBuf::from("page/a.html"));
    }
}

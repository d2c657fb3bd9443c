//! URL to filesystem path resolution for `/page/*`.

use std::path::{Path, PathBuf};

/// Resolve a path below `serve_root`, handling index.html for directories.
///
/// Anything that escapes `serve_root`, symlinks included, resolves to `None`.
pub fn resolve_path(rest: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(rest);
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let canonical = serve_root.join(&clean).canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

/// Decode, strip the query string, trim slashes.
fn normalize_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default()
        .trim_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolves_files_and_index() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), "p{}").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/index.html"), "<p>").unwrap();

        let css = resolve_path("a.css?v=2", dir.path()).unwrap();
        assert!(css.ends_with("a.css"));
        let index = resolve_path("sub/", dir.path()).unwrap();
        assert!(index.ends_with("sub/index.html"));
        assert!(resolve_path("missing.js", dir.path()).is_none());
    }

    #[test]
    fn test_rejects_escape() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("page");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.txt"), "x").unwrap();

        assert!(resolve_path("../secret.txt", &root).is_none());
        assert!(resolve_path("%2E%2E/secret.txt", &root).is_none());
    }

    #[test]
    fn test_decodes_spaces() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("my page.html"), "").unwrap();
        assert!(resolve_path("my%20page.html", dir.path()).is_some());
    }
}

//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// ```text
/// /home/user/site/page/       ← start
/// /home/user/site/livepage.toml  ← found
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("page/sub");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("livepage.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("livepage.toml")).unwrap();
        assert_eq!(found, temp.path().join("livepage.toml"));
    }

    #[test]
    fn test_find_config_missing() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            find_config_file(temp.path(), Path::new("no-such-livepage.toml")),
            None
        );
    }

    #[test]
    fn test_find_config_absolute() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        assert_eq!(find_config_file(Path::new("/"), &path), None);

        std::fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(Path::new("/"), &path), Some(path));
    }
}

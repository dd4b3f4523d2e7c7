//! Where Curtain keeps its files on disk.

use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "Curtain";
const CONFIG_FILE: &str = "config.yaml";
const LOG_FILE: &str = "curtain.log";

/// `base/Curtain`, or `None` when the platform has no such base directory.
fn app_dir(base: Option<PathBuf>) -> Option<PathBuf> {
    base.map(|dir| dir.join(APP_DIR))
}

/// Default config file, read by [`Config::load`](crate::Config::load) when no path is given.
pub fn default_config_path() -> Option<PathBuf> {
    app_dir(dirs::config_dir()).map(|dir| dir.join(CONFIG_FILE))
}

/// Log file the CLI writes to when `--log-file` is not passed.
pub fn log_file_path() -> Option<PathBuf> {
    app_dir(dirs::data_local_dir()).map(|dir| dir.join(LOG_FILE))
}

/// Creates the directory holding `file` if it does not exist yet.
pub fn ensure_parent_dir(file: &Path) -> io::Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_dir_layout() {
        let base = PathBuf::from("base");
        assert_eq!(app_dir(Some(base)), Some(PathBuf::from("base").join("Curtain")));
        assert_eq!(app_dir(None), None);
    }

    #[test]
    fn test_default_paths_use_app_dir() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("Curtain/config.yaml"));
        }
        if let Some(path) = log_file_path() {
            assert!(path.ends_with("Curtain/curtain.log"));
        }
    }

    #[test]
    fn test_ensure_parent_dir() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("nested").join("curtain.log");

        ensure_parent_dir(&file).unwrap();
        assert!(root.path().join("nested").is_dir());

        ensure_parent_dir(Path::new("curtain.log")).unwrap();
    }
}

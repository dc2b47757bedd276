//! Filesystem locations a single build operates on.

use std::path::{Path, PathBuf};

use crate::asset_paths::normalize_path;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::error::{BuildError, BuildResult};

/// Absolute paths resolved from the command-line inputs.
#[derive(Debug, Clone)]
pub struct BuildContext {
  /// Entry HTML file.
  pub entry_file: PathBuf,
  /// Directory containing the entry file; the root of the source tree.
  pub base_dir: PathBuf,
  /// Builder configuration file.
  pub config_file: PathBuf,
}

impl BuildContext {
  /// Resolve the entry and configuration paths, checking both exist.
  ///
  /// Without an explicit configuration file, `builder_config.json` next to the entry
  /// file is used.
  pub fn new(entry_file: &Path, config_file: Option<&Path>) -> BuildResult<Self> {
    let entry_file = absolute(entry_file)?;
    if !entry_file.is_file() {
      return Err(BuildError::EntryFileMissing { path: entry_file });
    }

    let base_dir = entry_file
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("/"));

    let config_file = match config_file {
      Some(path) => absolute(path)?,
      None => base_dir.join(DEFAULT_CONFIG_FILE),
    };
    if !config_file.is_file() {
      return Err(BuildError::ConfigMissing { path: config_file });
    }

    Ok(Self {
      entry_file,
      base_dir,
      config_file,
    })
  }

  /// Build directory for a configured directory name.
  pub fn build_dir(&self, build_dir_name: &str) -> PathBuf {
    normalize_path(&self.base_dir.join(build_dir_name))
  }

  /// File name of the entry HTML.
  pub fn entry_file_name(&self) -> &std::ffi::OsStr {
    self.entry_file.file_name().unwrap_or_default()
  }
}

fn absolute(path: &Path) -> BuildResult<PathBuf> {
  std::path::absolute(path)
    .map(|path| normalize_path(&path))
    .map_err(BuildError::io("resolve", path))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn defaults_config_next_to_entry_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{}").unwrap();

    let context = BuildContext::new(&dir.path().join("./index.html"), None).unwrap();
    assert_eq!(context.base_dir, dir.path());
    assert_eq!(context.config_file, dir.path().join(DEFAULT_CONFIG_FILE));
    assert_eq!(context.entry_file_name(), "index.html");
    assert_eq!(context.build_dir("build"), dir.path().join("build"));
  }

  #[test]
  fn reports_missing_entry_before_config() {
    let dir = tempdir().unwrap();
    let err = BuildContext::new(&dir.path().join("index.html"), None).unwrap_err();
    assert!(matches!(err, BuildError::EntryFileMissing { .. }));
  }

  #[test]
  fn reports_missing_config() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "").unwrap();
    let err = BuildContext::new(&dir.path().join("index.html"), Some(Path::new("/nonexistent/c.json")))
      .unwrap_err();
    assert!(matches!(err, BuildError::ConfigMissing { .. }));
  }
}

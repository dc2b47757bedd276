//! Error taxonomy shared by every build phase.

use std::path::PathBuf;

use thiserror::Error;

/// Generic build result type used across the crate.
pub type BuildResult<T> = Result<T, BuildError>;

/// Fatal conditions that abort a build.
///
/// An empty pattern resolution is deliberately absent: it only produces a warning.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The builder configuration file does not exist.
  #[error("builder config file not found at {}", path.display())]
  ConfigMissing {
    /// Path that was looked up.
    path: PathBuf,
  },
  /// The entry HTML file does not exist.
  #[error("entry html file not found at {}", path.display())]
  EntryFileMissing {
    /// Path that was looked up.
    path: PathBuf,
  },
  /// The configuration file is not valid JSON for the expected schema.
  #[error("failed to parse {}: {source}", path.display())]
  ConfigParse {
    /// Path of the configuration file.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
  /// A configuration key holds a value outside its allowed domain.
  #[error("invalid value for config key `{key}`: {message}")]
  InvalidConfig {
    /// Offending configuration key.
    key: &'static str,
    /// Human readable description of the problem.
    message: String,
  },
  /// A merge destination that is neither a `.js` nor a `.css` file.
  #[error("merge destination `{destination}` must end in .js or .css")]
  UnsupportedMergeExtension {
    /// Destination as written in the configuration.
    destination: String,
  },
  /// One source file claimed by two different merge groups.
  #[error("{} is merged into both `{first}` and `{second}`", path.display())]
  MergeConflict {
    /// The contested source file.
    path: PathBuf,
    /// Destination of the group that claimed the file first.
    first: String,
    /// Destination of the group that tried to claim it again.
    second: String,
  },
  /// A standalone file would land on the path of a merge bundle.
  #[error("{} would overwrite bundle `{bundle}` in the build directory", path.display())]
  BundleOverwrite {
    /// Source file whose output collides with the bundle.
    path: PathBuf,
    /// Destination of the bundle, as configured.
    bundle: String,
  },
  /// The minifier rejected a source file.
  #[error("failed to minify {}: {message}", path.display())]
  Minification {
    /// File that could not be minified.
    path: PathBuf,
    /// Diagnostic reported by the minifier.
    message: String,
  },
  /// A read, write, copy or directory operation failed.
  #[error("failed to {action} {}: {source}", path.display())]
  Io {
    /// Short verb phrase describing the operation.
    action: &'static str,
    /// Path the operation was applied to.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Directory traversal failed.
  #[error("failed to walk source tree: {0}")]
  Walk(#[from] walkdir::Error),
}

impl BuildError {
  /// Attach the failing action and path to an I/O error.
  pub fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| Self::Io {
      action,
      path,
      source,
    }
  }

  /// Whether the error concerns the command-line inputs rather than the build itself.
  pub fn is_usage_error(&self) -> bool {
    matches!(self, Self::ConfigMissing { .. } | Self::EntryFileMissing { .. })
  }
}

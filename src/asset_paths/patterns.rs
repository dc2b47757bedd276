use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{BuildError, BuildResult};

/// A configured source pattern.
///
/// `dir/*` selects the direct children of `dir`, `dir/**` every descendant; anything
/// else names a single file. Paths are always relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// A single file, included whatever its extension.
    Literal(String),
    /// Direct children of a directory.
    Shallow(String),
    /// All descendants of a directory, at any depth.
    Deep(String),
}

impl Pattern {
    /// Classify a raw pattern by its trailing wildcard marker.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(dir) = raw.strip_suffix("**").and_then(directory_prefix) {
            return Self::Deep(dir.to_string());
        }
        if let Some(dir) = raw.strip_suffix('*').and_then(directory_prefix) {
            return Self::Shallow(dir.to_string());
        }
        Self::Literal(raw.to_string())
    }

    /// The path fragment without its wildcard marker.
    pub fn fragment(&self) -> &str {
        match self {
            Self::Literal(path) | Self::Shallow(path) | Self::Deep(path) => path,
        }
    }
}

/// Wildcards only count when they follow a separator or form the whole pattern.
fn directory_prefix(prefix: &str) -> Option<&str> {
    if prefix.is_empty() {
        return Some("");
    }
    let trimmed = prefix.trim_end_matches(['/', '\\']);
    (trimmed.len() != prefix.len()).then_some(trimmed)
}

/// Expand `patterns` against `base` into absolute file paths.
///
/// `extension` restricts glob matches to one extension (`None` accepts every file);
/// literal patterns bypass the filter. Results keep pattern order and are not
/// de-duplicated. Glob matches are ordered lexicographically by full path so bundle
/// contents never depend on the filesystem's directory order.
pub fn resolve(base: &Path, patterns: &[Pattern], extension: Option<&str>) -> BuildResult<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let target = normalize_path(&base.join(pattern.fragment().trim_start_matches(['/', '\\'])));
        let matched = match pattern {
            Pattern::Literal(_) => vec![target.clone()],
            Pattern::Shallow(_) => list_children(&target, extension)?,
            Pattern::Deep(_) => list_descendants(&target, extension)?,
        };

        if matched.is_empty() {
            warn!(pattern = ?pattern, dir = %target.display(), "pattern matched no files");
        }
        results.extend(matched);
    }

    Ok(results)
}

fn list_children(dir: &Path, extension: Option<&str>) -> BuildResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(BuildError::io("read directory", dir)(err)),
    };

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(BuildError::io("read directory", dir))?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && path.is_file() && matches_extension(&path, extension) {
            matches.push(path);
        }
    }

    sort_by_full_path(&mut matches);
    Ok(matches)
}

fn list_descendants(dir: &Path, extension: Option<&str>) -> BuildResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).follow_links(true) {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && matches_extension(path, extension) {
            matches.push(path.to_path_buf());
        }
    }

    sort_by_full_path(&mut matches);
    Ok(matches)
}

fn matches_extension(path: &Path, extension: Option<&str>) -> bool {
    match extension {
        None => true,
        Some(ext) => path.extension().is_some_and(|actual| actual == ext),
    }
}

fn sort_by_full_path(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

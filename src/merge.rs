//! Bundle production: concatenating minified sources into merge artifacts.
//!
//! Members are written back to back with no separator. A script that does not end in a
//! statement terminator will run into the next one, so such members are reported with
//! a warning.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::asset_paths::{is_minified_name, normalize_path, resolve};
use crate::config::MergeTarget;
use crate::error::{BuildError, BuildResult};
use crate::minify::Minify;
use crate::models::{ExcludeSet, Language, MergeGroup, MergeSet};

/// Produce every configured bundle under `build_dir`, in configuration order.
///
/// Excluded files are dropped from the member lists. A file claimed by two bundles is a
/// [`BuildError::MergeConflict`].
pub fn merge<M: Minify>(
  targets: &[MergeTarget],
  base_dir: &Path,
  build_dir: &Path,
  excludes: &ExcludeSet,
  minifier: &M,
  obfuscate: bool,
) -> BuildResult<MergeSet> {
  let mut merged = MergeSet::default();

  for target in targets {
    info!(destination = target.destination(), "merging files");
    let members = collect_members(target, base_dir, excludes)?;
    if members.is_empty() {
      warn!(destination = target.destination(), "no files to merge, writing an empty bundle");
    }

    let group = MergeGroup::new(target.destination(), target.language(), members);
    merged
      .push(group)
      .map_err(|(path, first)| BuildError::MergeConflict {
        path,
        first,
        second: target.destination().to_string(),
      })?;

    if let Some(group) = merged.groups().last() {
      let output = normalize_path(&build_dir.join(group.destination.trim_start_matches(['/', '\\'])));
      write_bundle(group, &output, minifier, obfuscate)?;
      info!(
        destination = %group.destination,
        files = group.members.len(),
        "finished merging"
      );
    }
  }

  Ok(merged)
}

fn collect_members(
  target: &MergeTarget,
  base_dir: &Path,
  excludes: &ExcludeSet,
) -> BuildResult<Vec<PathBuf>> {
  let resolved = resolve(base_dir, target.patterns(), target.language().extension())?;
  let mut seen = HashSet::new();

  Ok(
    resolved
      .into_iter()
      .filter(|path| {
        if excludes.contains(path) {
          debug!(path = %path.display(), "excluded from merge");
          return false;
        }
        seen.insert(path.clone())
      })
      .collect(),
  )
}

fn write_bundle<M: Minify>(
  group: &MergeGroup,
  output: &Path,
  minifier: &M,
  obfuscate: bool,
) -> BuildResult<()> {
  if let Some(parent) = output.parent() {
    fs::create_dir_all(parent).map_err(BuildError::io("create directory", parent))?;
  }

  let file = File::create(output).map_err(BuildError::io("create", output))?;
  let mut writer = BufWriter::new(file);

  for (index, member) in group.members.iter().enumerate() {
    debug!(path = %member.display(), "processing file");
    let text = minified_member(member, group.language, minifier, obfuscate)?;

    let has_next = index + 1 < group.members.len();
    if group.language == Language::Js && has_next && !ends_with_terminator(&text) {
      warn!(
        path = %member.display(),
        destination = %group.destination,
        "script does not end with `;` or `}}` and is concatenated without a separator"
      );
    }

    writer
      .write_all(text.as_bytes())
      .map_err(BuildError::io("write", output))?;
  }

  writer.flush().map_err(BuildError::io("write", output))
}

/// Read a member, minifying it unless it already follows the `.min` convention.
pub(crate) fn minified_member<M: Minify>(
  path: &Path,
  language: Language,
  minifier: &M,
  obfuscate: bool,
) -> BuildResult<String> {
  let content = fs::read_to_string(path).map_err(BuildError::io("read", path))?;
  if is_minified_name(path) {
    debug!(path = %path.display(), "already minified");
    return Ok(content);
  }

  minifier
    .minify(&content, language, obfuscate)
    .map_err(|err| BuildError::Minification {
      path: path.to_path_buf(),
      message: err.to_string(),
    })
}

fn ends_with_terminator(text: &str) -> bool {
  let trimmed = text.trim_end();
  trimmed.is_empty() || trimmed.ends_with(';') || trimmed.ends_with('}')
}

//! Data structures produced while preparing a build directory.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Asset language inferred from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
  /// JavaScript (`.js`).
  Js,
  /// Cascading style sheets (`.css`).
  Css,
  /// Anything else; never minified or merged.
  Other,
}

impl Language {
  /// Classify a bare extension (without the leading dot).
  pub fn from_extension(ext: &str) -> Self {
    match ext {
      "js" => Self::Js,
      "css" => Self::Css,
      _ => Self::Other,
    }
  }

  /// Classify a path by its final extension.
  pub fn from_path(path: &Path) -> Self {
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .map_or(Self::Other, Self::from_extension)
  }

  /// Extension associated with the language, if any.
  pub fn extension(self) -> Option<&'static str> {
    match self {
      Self::Js => Some("js"),
      Self::Css => Some("css"),
      Self::Other => None,
    }
  }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Js => "js",
      Self::Css => "css",
      Self::Other => "other",
    })
  }
}

/// Whether a bundle tag has already been written into the rewritten HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupState {
  /// No tag references the bundle yet.
  #[default]
  Pending,
  /// The first referencing tag was redirected to the bundle.
  Added,
}

/// A merge artifact and the source files it consumed.
#[derive(Debug, Clone)]
pub struct MergeGroup {
  /// Destination as configured, relative to the build directory.
  pub destination: String,
  /// Language of the bundle, inferred from the destination extension.
  pub language: Language,
  /// Absolute source paths in concatenation order, without duplicates.
  pub members: Vec<PathBuf>,
  /// Tag bookkeeping owned by the HTML rewrite pass.
  pub state: GroupState,
}

impl MergeGroup {
  /// Create a pending group.
  pub fn new(destination: impl Into<String>, language: Language, members: Vec<PathBuf>) -> Self {
    Self {
      destination: destination.into(),
      language,
      members,
      state: GroupState::Pending,
    }
  }

  /// Transition `Pending -> Added`, returning `true` only for the first call.
  pub fn mark_added(&mut self) -> bool {
    match self.state {
      GroupState::Pending => {
        self.state = GroupState::Added;
        true
      }
      GroupState::Added => false,
    }
  }
}

/// Every merge group of a build together with a member lookup table.
#[derive(Debug, Clone, Default)]
pub struct MergeSet {
  groups: Vec<MergeGroup>,
  owners: HashMap<PathBuf, usize>,
}

impl MergeSet {
  /// Append a group, indexing its members.
  ///
  /// Returns the destination of the group that already owns a member when the
  /// new group overlaps an existing one; the set is left untouched in that case.
  pub fn push(&mut self, group: MergeGroup) -> Result<(), (PathBuf, String)> {
    if let Some((path, owner)) = group
      .members
      .iter()
      .find_map(|member| self.owners.get(member).map(|owner| (member, *owner)))
    {
      return Err((path.clone(), self.groups[owner].destination.clone()));
    }

    let index = self.groups.len();
    for member in &group.members {
      self.owners.insert(member.clone(), index);
    }
    self.groups.push(group);
    Ok(())
  }

  /// Groups in configuration order.
  pub fn groups(&self) -> &[MergeGroup] {
    &self.groups
  }

  /// Whether a source file was consumed by any group.
  pub fn contains(&self, path: &Path) -> bool {
    self.owners.contains_key(path)
  }

  /// Mutable access to the group owning `path`.
  pub fn group_of_mut(&mut self, path: &Path) -> Option<&mut MergeGroup> {
    let index = *self.owners.get(path)?;
    self.groups.get_mut(index)
  }

  /// Total number of merged source files.
  pub fn member_count(&self) -> usize {
    self.owners.len()
  }

  /// Number of groups.
  pub fn len(&self) -> usize {
    self.groups.len()
  }

  /// Whether no group was configured.
  pub fn is_empty(&self) -> bool {
    self.groups.is_empty()
  }
}

/// Resolved exclusion patterns: files never merged, minified or copied.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
  paths: HashSet<PathBuf>,
}

impl ExcludeSet {
  /// Whether `path` was matched by an exclude pattern.
  pub fn contains(&self, path: &Path) -> bool {
    self.paths.contains(path)
  }

  /// Number of excluded files.
  pub fn len(&self) -> usize {
    self.paths.len()
  }

  /// Whether nothing is excluded.
  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }
}

impl FromIterator<PathBuf> for ExcludeSet {
  fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
    Self {
      paths: iter.into_iter().collect(),
    }
  }
}

/// How the tree walk treated a discovered file. Variants are checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileClassification {
  /// Consumed by a merge group.
  MergedMember,
  /// Matched by an exclude pattern.
  Excluded,
  /// A `name.min.ext` sibling exists next to the file.
  SkippedMinExists,
  /// Written as a standalone minified sibling.
  Minified,
  /// Copied verbatim.
  Copied,
}

/// Outcome counters of the tree walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
  /// Files consumed by merge groups.
  pub merged: usize,
  /// Excluded files.
  pub excluded: usize,
  /// Files skipped because a minified sibling already exists.
  pub skipped: usize,
  /// Files minified standalone.
  pub minified: usize,
  /// Files copied verbatim.
  pub copied: usize,
}

impl WalkSummary {
  /// Count one classified file.
  pub fn record(&mut self, classification: FileClassification) {
    let counter = match classification {
      FileClassification::MergedMember => &mut self.merged,
      FileClassification::Excluded => &mut self.excluded,
      FileClassification::SkippedMinExists => &mut self.skipped,
      FileClassification::Minified => &mut self.minified,
      FileClassification::Copied => &mut self.copied,
    };
    *counter += 1;
  }
}

/// Summary of a completed build.
#[derive(Debug, Clone)]
pub struct BuildReport {
  /// Directory the artifacts were written to.
  pub build_dir: PathBuf,
  /// Rewritten entry HTML inside the build directory.
  pub html_file: PathBuf,
  /// Number of merge artifacts produced.
  pub merge_groups: usize,
  /// Number of source files consumed by merge artifacts.
  pub merged_files: usize,
  /// Tree walk counters.
  pub walk: WalkSummary,
}

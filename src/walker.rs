//! Source tree walk materialising every file that is not part of a bundle.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use same_file::is_same_file;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::asset_paths::{is_minified_name, minified_sibling, minified_sibling_name, normalize_path};
use crate::error::{BuildError, BuildResult};
use crate::merge::minified_member;
use crate::minify::Minify;
use crate::models::{ExcludeSet, FileClassification, Language, MergeSet, WalkSummary};

/// Inputs of the tree walk.
#[derive(Debug, Clone, Copy)]
pub struct TreeWalk<'a> {
  /// Root of the source tree.
  pub base_dir: &'a Path,
  /// Output directory; never descended into.
  pub build_dir: &'a Path,
  /// Builder configuration file; never copied.
  pub config_file: Option<&'a Path>,
  /// Files already consumed by bundles.
  pub merged: &'a MergeSet,
  /// Files matched by exclude patterns.
  pub excludes: &'a ExcludeSet,
  /// Languages minified standalone.
  pub minify_languages: &'a BTreeSet<Language>,
  /// Whether JavaScript minification renames identifiers.
  pub obfuscate: bool,
}

impl TreeWalk<'_> {
  /// Decide what happens to a single source file.
  pub fn classify(&self, path: &Path) -> FileClassification {
    if self.merged.contains(path) {
      FileClassification::MergedMember
    } else {
      classify_standalone(path, self.excludes, self.minify_languages)
    }
  }

  /// Walk the source tree, writing minified or copied files into the build directory.
  ///
  /// Directories in the build tree are only created once a file lands in them. Symlinks
  /// are followed, so linked files are materialised as regular files.
  pub fn run<M: Minify>(&self, minifier: &M) -> BuildResult<WalkSummary> {
    let mut summary = WalkSummary::default();
    let bundles: BTreeMap<PathBuf, &str> = self
      .merged
      .groups()
      .iter()
      .map(|group| {
        let output = self.build_dir.join(group.destination.trim_start_matches(['/', '\\']));
        (normalize_path(&output), group.destination.as_str())
      })
      .collect();
    let walker = WalkDir::new(self.base_dir)
      .follow_links(true)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| !self.is_skipped(entry.path()));

    for entry in walker {
      let entry = entry?;
      if !entry.file_type().is_file() {
        continue;
      }

      let path = entry.path();
      let classification = self.classify(path);
      summary.record(classification);

      let file_name = match classification {
        FileClassification::Minified => minified_sibling_name(&file_name_of(path)),
        FileClassification::Copied => file_name_of(path),
        skipped => {
          debug!(path = %path.display(), ?skipped, "not written");
          continue;
        }
      };

      let output = self.output_path(path, &file_name);
      if let Some(bundle) = bundles.get(&output) {
        return Err(BuildError::BundleOverwrite {
          path: path.to_path_buf(),
          bundle: (*bundle).to_string(),
        });
      }

      match classification {
        FileClassification::Minified => self.write_minified(path, &output, minifier)?,
        _ => self.copy(path, &output)?,
      }
    }

    Ok(summary)
  }

  fn is_skipped(&self, path: &Path) -> bool {
    if path == self.build_dir {
      return true;
    }

    self.config_file.is_some_and(|config| {
      path.file_name() == config.file_name() && is_same_file(path, config).unwrap_or(false)
    })
  }

  fn output_path(&self, path: &Path, file_name: &str) -> PathBuf {
    let relative = path.strip_prefix(self.base_dir).unwrap_or(path);
    let dir = match relative.parent() {
      Some(parent) => self.build_dir.join(parent),
      None => self.build_dir.to_path_buf(),
    };
    normalize_path(&dir.join(file_name))
  }

  fn write_minified<M: Minify>(&self, path: &Path, output: &Path, minifier: &M) -> BuildResult<()> {
    info!(path = %path.display(), "minifying");
    let text = minified_member(path, Language::from_path(path), minifier, self.obfuscate)?;
    create_parent(output)?;
    fs::write(output, text).map_err(BuildError::io("write", output))
  }

  fn copy(&self, path: &Path, output: &Path) -> BuildResult<()> {
    info!(path = %path.display(), "copying");
    create_parent(output)?;
    fs::copy(path, output).map_err(BuildError::io("copy", path))?;

    let metadata = fs::metadata(path).map_err(BuildError::io("read metadata of", path))?;
    filetime::set_file_times(
      output,
      FileTime::from_last_access_time(&metadata),
      FileTime::from_last_modification_time(&metadata),
    )
    .map_err(BuildError::io("set timestamps of", output))
  }
}

/// Classification of a file that belongs to no bundle.
pub(crate) fn classify_standalone(
  path: &Path,
  excludes: &ExcludeSet,
  minify_languages: &BTreeSet<Language>,
) -> FileClassification {
  if excludes.contains(path) {
    FileClassification::Excluded
  } else if minified_sibling(path).exists() {
    FileClassification::SkippedMinExists
  } else if minify_languages.contains(&Language::from_path(path)) && !is_minified_name(path) {
    FileClassification::Minified
  } else {
    FileClassification::Copied
  }
}

fn file_name_of(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}

fn create_parent(output: &Path) -> BuildResult<()> {
  match output.parent() {
    Some(dir) => fs::create_dir_all(dir).map_err(BuildError::io("create directory", dir)),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::minify::MinifyError;
  use crate::models::MergeGroup;
  use tempfile::tempdir;

  struct Squash;

  impl Minify for Squash {
    fn minify(&self, source: &str, _language: Language, _obfuscate: bool) -> Result<String, MinifyError> {
      Ok(source.split_whitespace().collect())
    }
  }

  fn touch(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
  }

  fn languages(values: &[Language]) -> BTreeSet<Language> {
    values.iter().copied().collect()
  }

  #[test]
  fn classifies_in_priority_order() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    let merged_file = touch(base, "js/merged.js", "m");
    let excluded_file = touch(base, "js/secret.js", "s");
    let built = touch(base, "js/lib.js", "l");
    touch(base, "js/lib.min.js", "l");
    let plain = touch(base, "js/app.js", "a");
    let image = touch(base, "img/logo.png", "png");

    let mut merged = MergeSet::default();
    merged
      .push(MergeGroup::new("bundle.js", Language::Js, vec![merged_file.clone()]))
      .unwrap();
    let excludes = ExcludeSet::from_iter([excluded_file.clone(), merged_file.clone()]);
    let minify = languages(&[Language::Js]);
    let walk = TreeWalk {
      base_dir: base,
      build_dir: &base.join("build"),
      config_file: None,
      merged: &merged,
      excludes: &excludes,
      minify_languages: &minify,
      obfuscate: false,
    };

    assert_eq!(walk.classify(&merged_file), FileClassification::MergedMember);
    assert_eq!(walk.classify(&excluded_file), FileClassification::Excluded);
    assert_eq!(walk.classify(&built), FileClassification::SkippedMinExists);
    assert_eq!(walk.classify(&base.join("js/lib.min.js")), FileClassification::Copied);
    assert_eq!(walk.classify(&plain), FileClassification::Minified);
    assert_eq!(walk.classify(&image), FileClassification::Copied);
  }

  #[test]
  fn mirrors_tree_into_build_directory() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    let build = base.join("build");
    let config = touch(base, "builder_config.json", "{}");
    touch(base, "index.html", "<html></html>");
    touch(base, "css/site.css", "body { color: red; }");
    touch(base, "js/lib.js", "lib()");
    touch(base, "js/lib.min.js", "lib()");
    touch(base, "build/stale.txt", "stale");
    let merged_file = touch(base, "js/part.js", "part()");
    touch(base, "empty/only.js", "only()");

    let mut merged = MergeSet::default();
    merged
      .push(MergeGroup::new("bundle.js", Language::Js, vec![merged_file]))
      .unwrap();
    let excludes = ExcludeSet::from_iter([base.join("empty/only.js")]);
    let minify = languages(&[Language::Css]);

    let summary = TreeWalk {
      base_dir: base,
      build_dir: &build,
      config_file: Some(&config),
      merged: &merged,
      excludes: &excludes,
      minify_languages: &minify,
      obfuscate: false,
    }
    .run(&Squash)
    .unwrap();

    assert_eq!(fs::read_to_string(build.join("css/site.min.css")).unwrap(), "body{color:red;}");
    assert!(!build.join("css/site.css").exists());
    assert!(build.join("index.html").exists());
    assert!(build.join("js/lib.min.js").exists());
    assert!(!build.join("js/lib.js").exists());
    assert!(!build.join("js/part.js").exists());
    assert!(!build.join("builder_config.json").exists());
    assert!(!build.join("build").exists());
    assert!(!build.join("empty").exists());

    assert_eq!(summary, WalkSummary {
      merged: 1,
      excluded: 1,
      skipped: 1,
      minified: 1,
      copied: 2,
    });
  }

  #[test]
  fn copies_preserve_modification_time() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    let build = base.join("build");
    let source = touch(base, "fonts/a.woff", "font");
    let stamp = FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&source, stamp).unwrap();

    TreeWalk {
      base_dir: base,
      build_dir: &build,
      config_file: None,
      merged: &MergeSet::default(),
      excludes: &ExcludeSet::default(),
      minify_languages: &BTreeSet::new(),
      obfuscate: false,
    }
    .run(&Squash)
    .unwrap();

    let copied = fs::metadata(build.join("fonts/a.woff")).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&copied), stamp);
  }

  #[test]
  fn refuses_to_overwrite_bundles() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    let build = base.join("build");
    let member = touch(base, "js/a.js", "a()");
    touch(base, "app.js", "LEGACY();");
    fs::create_dir_all(&build).unwrap();
    fs::write(build.join("app.js"), "a()").unwrap();

    let mut merged = MergeSet::default();
    merged
      .push(MergeGroup::new("app.js", Language::Js, vec![member]))
      .unwrap();
    let minify = languages(&[Language::Css]);

    let err = TreeWalk {
      base_dir: base,
      build_dir: &build,
      config_file: None,
      merged: &merged,
      excludes: &ExcludeSet::default(),
      minify_languages: &minify,
      obfuscate: false,
    }
    .run(&Squash)
    .unwrap_err();

    assert!(
      matches!(err, BuildError::BundleOverwrite { ref path, ref bundle } if *path == base.join("app.js") && bundle == "app.js")
    );
    assert_eq!(fs::read_to_string(build.join("app.js")).unwrap(), "a()");
  }

  #[cfg(unix)]
  #[test]
  fn follows_symlinked_files() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("site");
    let build = base.join("build");
    let target = touch(dir.path(), "shared/logo.svg", "<svg/>");
    fs::create_dir_all(base.join("img")).unwrap();
    std::os::unix::fs::symlink(&target, base.join("img/logo.svg")).unwrap();

    let summary = TreeWalk {
      base_dir: &base,
      build_dir: &build,
      config_file: None,
      merged: &MergeSet::default(),
      excludes: &ExcludeSet::default(),
      minify_languages: &BTreeSet::new(),
      obfuscate: false,
    }
    .run(&Squash)
    .unwrap();

    assert_eq!(summary.copied, 1);
    assert_eq!(fs::read_to_string(build.join("img/logo.svg")).unwrap(), "<svg/>");
  }
}

//! Build orchestrator sequencing merge, tree walk and HTML rewrite.

use std::fs;

use tracing::info;

use crate::asset_paths::resolve;
use crate::config::BuildConfig;
use crate::error::{BuildError, BuildResult};
use crate::html::{HtmlDocument, HtmlRewriter};
use crate::merge::merge;
use crate::minify::{Minify, NativeMinifier};
use crate::models::{BuildReport, ExcludeSet};
use crate::project::BuildContext;
use crate::walker::TreeWalk;

/// High-level helper producing a build directory for one entry page.
pub struct HtmlBuilder<'a, M = NativeMinifier> {
  context: &'a BuildContext,
  config: &'a BuildConfig,
  minifier: M,
}

impl<'a> HtmlBuilder<'a> {
  /// Create a builder using the oxc / lightningcss minifier.
  pub fn new(context: &'a BuildContext, config: &'a BuildConfig) -> Self {
    Self::with_minifier(context, config, NativeMinifier)
  }
}

impl<'a, M: Minify> HtmlBuilder<'a, M> {
  /// Create a builder with a custom minifier.
  pub fn with_minifier(context: &'a BuildContext, config: &'a BuildConfig, minifier: M) -> Self {
    Self {
      context,
      config,
      minifier,
    }
  }

  /// Run every phase in order. The first failure aborts the build; files written so far
  /// stay in place and are overwritten by the next build.
  pub fn build(&self) -> BuildResult<BuildReport> {
    let base_dir = &self.context.base_dir;
    let build_dir = self.context.build_dir(&self.config.build_dir_name);
    fs::create_dir_all(&build_dir).map_err(BuildError::io("create directory", &build_dir))?;
    info!(build_dir = %build_dir.display(), "building");

    let excludes: ExcludeSet = resolve(base_dir, &self.config.exclude_patterns, None)?
      .into_iter()
      .collect();

    let mut merged = merge(
      &self.config.merge_targets,
      base_dir,
      &build_dir,
      &excludes,
      &self.minifier,
      self.config.obfuscate,
    )?;

    let walk = TreeWalk {
      base_dir,
      build_dir: &build_dir,
      config_file: Some(&self.context.config_file),
      merged: &merged,
      excludes: &excludes,
      minify_languages: &self.config.minify_languages,
      obfuscate: self.config.obfuscate,
    }
    .run(&self.minifier)?;

    info!("updating html file");
    let entry = &self.context.entry_file;
    let markup = fs::read_to_string(entry).map_err(BuildError::io("read", entry))?;
    let mut document = HtmlDocument::parse(markup);
    HtmlRewriter::new(base_dir, &excludes, &self.config.minify_languages).rewrite(&mut document, &mut merged);

    let html_file = build_dir.join(self.context.entry_file_name());
    fs::write(&html_file, document.as_str()).map_err(BuildError::io("write", &html_file))?;

    Ok(BuildReport {
      build_dir,
      html_file,
      merge_groups: merged.len(),
      merged_files: merged.member_count(),
      walk,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::RawConfig;
  use crate::minify::MinifyError;
  use crate::models::Language;
  use chrono::Local;
  use std::path::Path;
  use tempfile::tempdir;

  struct Identity;

  impl Minify for Identity {
    fn minify(&self, source: &str, _language: Language, _obfuscate: bool) -> Result<String, MinifyError> {
      Ok(source.trim().to_string())
    }
  }

  fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn builds_entry_page_with_bundles() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    write(base, "builder_config.json", r#"{"merge": {"bundle.js": ["js/*"]}, "exclude": ["drafts/**"]}"#);
    write(
      base,
      "index.html",
      "<html>\n<head>\n<script src=\"js/a.js\"></script>\n<script src=\"js/b.js\"></script>\n</head>\n</html>\n",
    );
    write(base, "js/a.js", "a();");
    write(base, "js/b.js", "b();");
    write(base, "drafts/note.txt", "draft");

    let context = BuildContext::new(&base.join("index.html"), None).unwrap();
    let raw = RawConfig::from_path(&context.config_file).unwrap();
    let config = BuildConfig::from_raw(raw, Local::now()).unwrap();
    let report = HtmlBuilder::with_minifier(&context, &config, Identity).build().unwrap();

    assert_eq!(report.build_dir, base.join("build"));
    assert_eq!(report.merge_groups, 1);
    assert_eq!(report.merged_files, 2);
    assert_eq!(fs::read_to_string(base.join("build/bundle.js")).unwrap(), "a();b();");
    assert!(!base.join("build/drafts").exists());
    assert!(!base.join("build/js").exists());

    let html = fs::read_to_string(&report.html_file).unwrap();
    assert_eq!(
      html,
      "<html>\n<head>\n<script type=\"text/javascript\" src=\"bundle.js\"></script>\n</head>\n</html>\n"
    );
  }

  #[test]
  fn unsupported_minifier_input_aborts_before_rewrite() {
    struct Failing;
    impl Minify for Failing {
      fn minify(&self, _source: &str, language: Language, _obfuscate: bool) -> Result<String, MinifyError> {
        Err(MinifyError::Unsupported(language))
      }
    }

    let dir = tempdir().unwrap();
    let base = dir.path();
    write(base, "builder_config.json", "{}");
    write(base, "index.html", "<script src=\"app.js\"></script>");
    write(base, "app.js", "app();");

    let context = BuildContext::new(&base.join("index.html"), None).unwrap();
    let config = BuildConfig::from_raw(RawConfig::default(), Local::now()).unwrap();
    let err = HtmlBuilder::with_minifier(&context, &config, Failing).build().unwrap_err();

    assert!(matches!(err, BuildError::Minification { ref path, .. } if *path == base.join("app.js")));
    assert!(base.join("build").is_dir());
    assert!(!base.join("build/index.html").exists());
  }
}

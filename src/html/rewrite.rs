//! Redirect the entry page's asset tags at bundles and minified siblings.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::asset_paths::{
  is_minified_name, minified_sibling, minified_sibling_name, normalize_path, should_ignore_asset_reference, to_url_path,
};
use crate::html::document::{Edit, HtmlDocument, Tag, TagKind};
use crate::models::{ExcludeSet, FileClassification, Language, MergeSet};
use crate::walker::classify_standalone;

/// Rewrites `<script>` and stylesheet `<link>` tags of the entry page.
#[derive(Debug, Clone, Copy)]
pub struct HtmlRewriter<'a> {
  base_dir: &'a Path,
  excludes: &'a ExcludeSet,
  minify_languages: &'a BTreeSet<Language>,
}

impl<'a> HtmlRewriter<'a> {
  /// Create a rewriter resolving references against `base_dir`.
  pub fn new(base_dir: &'a Path, excludes: &'a ExcludeSet, minify_languages: &'a BTreeSet<Language>) -> Self {
    Self {
      base_dir,
      excludes,
      minify_languages,
    }
  }

  /// Rewrite scripts, then stylesheets.
  ///
  /// The first tag referencing a member of a bundle is replaced by a tag loading the
  /// bundle; later references to the same bundle are removed. References to standalone
  /// sources are pointed at their minified sibling when that sibling is part of the build.
  pub fn rewrite(&self, document: &mut HtmlDocument, merged: &mut MergeSet) {
    for kind in [TagKind::Script, TagKind::Link] {
      let edits: Vec<Edit> = document
        .tags(kind)
        .iter()
        .filter_map(|tag| self.decide(tag, merged))
        .collect();
      debug!(?kind, edits = edits.len(), "rewriting tags");
      document.apply(edits);
    }
  }

  fn decide(&self, tag: &Tag, merged: &mut MergeSet) -> Option<Edit> {
    if tag.kind == TagKind::Link && !is_stylesheet(tag) {
      return None;
    }

    let attribute = tag.attribute(tag.kind.reference_attribute())?;
    let reference = attribute.value.as_deref()?.trim();
    if reference.is_empty() || should_ignore_asset_reference(reference) {
      return None;
    }

    let (path_part, suffix) = split_reference(reference);
    let source = normalize_path(&self.base_dir.join(path_part.trim_start_matches('/')));

    if let Some(group) = merged.group_of_mut(&source) {
      return Some(if group.mark_added() {
        debug!(reference, bundle = %group.destination, "redirecting to bundle");
        Edit::Replace {
          span: tag.span.clone(),
          markup: tag.kind.markup(&to_url_path(Path::new(&group.destination))),
        }
      } else {
        debug!(reference, bundle = %group.destination, "bundle already referenced");
        Edit::Remove {
          span: tag.span.clone(),
        }
      });
    }

    if is_minified_name(&source) || !self.minified_sibling_is_built(&source, tag.kind.language(), merged) {
      return None;
    }

    let value = format!("{}{suffix}", minified_reference(path_part));
    debug!(reference, minified = %value, "pointing at minified file");
    Some(Edit::SetAttribute {
      attribute: attribute.clone(),
      value,
    })
  }

  /// The sibling ends up in the build when the walk minifies an existing source, or
  /// when it already exists next to it and is copied as is.
  fn minified_sibling_is_built(&self, source: &Path, language: Language, merged: &MergeSet) -> bool {
    if Language::from_path(source) != language {
      return false;
    }

    match classify_standalone(source, self.excludes, self.minify_languages) {
      FileClassification::Minified => source.is_file(),
      _ => {
        let sibling = minified_sibling(source);
        sibling.is_file()
          && !merged.contains(&sibling)
          && classify_standalone(&sibling, self.excludes, self.minify_languages) == FileClassification::Copied
      }
    }
  }
}

fn is_stylesheet(tag: &Tag) -> bool {
  let rel_stylesheet = tag
    .value("rel")
    .is_some_and(|rel| rel.split_ascii_whitespace().any(|token| token.eq_ignore_ascii_case("stylesheet")));
  let screen_media = tag
    .value("media")
    .is_some_and(|media| matches!(media.trim().to_ascii_lowercase().as_str(), "all" | "screen"));
  rel_stylesheet || screen_media
}

/// Split `js/app.js?v=2#x` into the path and the untouched query/fragment.
fn split_reference(reference: &str) -> (&str, &str) {
  match reference.find(['?', '#']) {
    Some(index) => reference.split_at(index),
    None => (reference, ""),
  }
}

/// Rename the file part of a reference, keeping its directory spelling.
fn minified_reference(path: &str) -> String {
  match path.rfind('/') {
    Some(index) => format!("{}{}", &path[..=index], minified_sibling_name(&path[index + 1..])),
    None => minified_sibling_name(path),
  }
}

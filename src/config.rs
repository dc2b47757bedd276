//! Builder configuration: the raw JSON schema and its validated form.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::asset_paths::Pattern;
use crate::error::{BuildError, BuildResult};
use crate::models::Language;

/// Configuration file looked up next to the entry HTML when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "builder_config.json";

/// The `minify` key accepts a single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MinifySetting {
  /// `"minify": "js"`
  One(String),
  /// `"minify": ["js", "css"]`
  Many(Vec<String>),
}

impl Default for MinifySetting {
  fn default() -> Self {
    Self::One("all".into())
  }
}

/// Configuration exactly as stored in `builder_config.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawConfig {
  /// Build directory name, relative to the entry file's directory.
  pub build_path: String,
  /// Whether to suffix the build directory with the build time.
  pub time_stamp: bool,
  /// Patterns of files that are never merged, minified or copied.
  pub exclude: Vec<String>,
  /// Bundle destinations mapped to their source patterns, in declaration order.
  pub merge: IndexMap<String, Vec<String>>,
  /// Languages minified when copied standalone.
  pub minify: MinifySetting,
  /// Whether JavaScript minification also renames identifiers.
  pub obfuscate: bool,
}

impl Default for RawConfig {
  fn default() -> Self {
    Self {
      build_path: "build".into(),
      time_stamp: false,
      exclude: Vec::new(),
      merge: IndexMap::new(),
      minify: MinifySetting::default(),
      obfuscate: false,
    }
  }
}

impl RawConfig {
  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> BuildResult<Self> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(err) if err.kind() == ErrorKind::NotFound => {
        return Err(BuildError::ConfigMissing {
          path: path.to_path_buf(),
        });
      }
      Err(err) => return Err(BuildError::io("read", path)(err)),
    };

    serde_json::from_str(&content).map_err(|source| BuildError::ConfigParse {
      path: path.to_path_buf(),
      source,
    })
  }
}

/// One bundle to produce.
#[derive(Debug, Clone)]
pub struct MergeTarget {
  destination: String,
  language: Language,
  patterns: Vec<Pattern>,
}

impl MergeTarget {
  /// Validate a destination and parse its source patterns.
  pub fn new(destination: impl Into<String>, patterns: &[String]) -> BuildResult<Self> {
    let destination = destination.into();
    let language = Language::from_path(Path::new(&destination));
    if language == Language::Other {
      return Err(BuildError::UnsupportedMergeExtension { destination });
    }

    Ok(Self {
      destination,
      language,
      patterns: patterns.iter().map(|raw| Pattern::parse(raw)).collect(),
    })
  }

  /// Destination relative to the build directory.
  pub fn destination(&self) -> &str {
    &self.destination
  }

  /// Bundle language; never [`Language::Other`].
  pub fn language(&self) -> Language {
    self.language
  }

  /// Source patterns in configured order.
  pub fn patterns(&self) -> &[Pattern] {
    &self.patterns
  }
}

/// Validated, immutable build configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Build directory name, timestamp suffix included.
  pub build_dir_name: String,
  /// Exclusion patterns.
  pub exclude_patterns: Vec<Pattern>,
  /// Bundles in configuration order.
  pub merge_targets: Vec<MergeTarget>,
  /// Languages minified when copied standalone.
  pub minify_languages: BTreeSet<Language>,
  /// Whether JavaScript minification renames identifiers.
  pub obfuscate: bool,
}

impl BuildConfig {
  /// Load and validate a configuration file.
  pub fn load(path: &Path) -> BuildResult<Self> {
    Self::from_raw(RawConfig::from_path(path)?, Local::now())
  }

  /// Normalise the raw configuration once. `now` feeds the optional timestamp suffix.
  pub fn from_raw(raw: RawConfig, now: DateTime<Local>) -> BuildResult<Self> {
    let build_path = raw.build_path.trim().trim_end_matches(['/', '\\']);
    if build_path.is_empty() {
      return Err(BuildError::InvalidConfig {
        key: "buildPath",
        message: "must name a directory".into(),
      });
    }

    let build_dir_name = if raw.time_stamp {
      format!("{build_path}{}", timestamp_suffix(now))
    } else {
      build_path.to_string()
    };

    let merge_targets = raw
      .merge
      .iter()
      .map(|(destination, patterns)| MergeTarget::new(destination.as_str(), patterns))
      .collect::<BuildResult<Vec<_>>>()?;

    Ok(Self {
      build_dir_name,
      exclude_patterns: raw.exclude.iter().map(|raw| Pattern::parse(raw)).collect(),
      merge_targets,
      minify_languages: parse_minify_languages(&raw.minify)?,
      obfuscate: raw.obfuscate,
    })
  }

  /// Whether standalone files of `language` are minified.
  pub fn minifies(&self, language: Language) -> bool {
    self.minify_languages.contains(&language)
  }
}

/// Suffix of the form `_2024-03-09_1709985600`.
pub fn timestamp_suffix(now: DateTime<Local>) -> String {
  format!("_{}_{}", now.format("%Y-%m-%d"), now.timestamp())
}

fn parse_minify_languages(setting: &MinifySetting) -> BuildResult<BTreeSet<Language>> {
  let values = match setting {
    MinifySetting::One(value) => std::slice::from_ref(value),
    MinifySetting::Many(values) => values.as_slice(),
  };

  let mut languages = BTreeSet::new();
  for value in values {
    match value.trim().to_ascii_lowercase().as_str() {
      "all" => {
        languages.insert(Language::Js);
        languages.insert(Language::Css);
      }
      "js" => {
        languages.insert(Language::Js);
      }
      "css" => {
        languages.insert(Language::Css);
      }
      "" => {}
      other => {
        return Err(BuildError::InvalidConfig {
          key: "minify",
          message: format!("unknown value `{other}`, expected one of all, js, css"),
        });
      }
    }
  }
  Ok(languages)
}

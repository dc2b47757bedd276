//! Minimal HTML tag model: query asset tags, then replace, remove or retarget them.
//!
//! Only the markup that is edited changes; everything else, indentation included, is
//! serialised byte for byte so rewritten pages diff cleanly against their source.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::Language;

fn script_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?is)<script\b([^>]*)>.*?</script\s*>").expect("invalid script regex"))
}

fn link_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?is)<link\b([^>]*)>").expect("invalid link regex"))
}

fn comment_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("invalid comment regex"))
}

fn attribute_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
      .expect("invalid attribute regex")
  })
}

/// Tag categories that reference assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
  /// `<script src="…"></script>`
  Script,
  /// `<link href="…">`
  Link,
}

impl TagKind {
  /// Attribute holding the asset reference.
  pub fn reference_attribute(self) -> &'static str {
    match self {
      Self::Script => "src",
      Self::Link => "href",
    }
  }

  /// Language of the assets this tag loads.
  pub fn language(self) -> Language {
    match self {
      Self::Script => Language::Js,
      Self::Link => Language::Css,
    }
  }

  /// Markup of a fresh tag loading `url`.
  pub fn markup(self, url: &str) -> String {
    let url = escape_attribute(url);
    match self {
      Self::Script => format!(r#"<script type="text/javascript" src="{url}"></script>"#),
      Self::Link => format!(r#"<link rel="stylesheet" type="text/css" href="{url}">"#),
    }
  }

  fn pattern(self) -> &'static Regex {
    match self {
      Self::Script => script_pattern(),
      Self::Link => link_pattern(),
    }
  }
}

/// A parsed attribute and where its value sits in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
  /// Lower-cased attribute name.
  pub name: String,
  /// Raw value, `None` for bare attributes such as `defer`.
  pub value: Option<String>,
  /// Byte range of the value (without quotes) in the document.
  pub value_span: Option<Range<usize>>,
  /// Whether the value was written without quotes.
  pub unquoted: bool,
}

/// An asset tag found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
  /// Category of the tag.
  pub kind: TagKind,
  /// Byte range of the whole element, closing tag included.
  pub span: Range<usize>,
  /// Attributes in source order.
  pub attributes: Vec<Attribute>,
}

impl Tag {
  /// First attribute named `name`.
  pub fn attribute(&self, name: &str) -> Option<&Attribute> {
    self.attributes.iter().find(|attribute| attribute.name == name)
  }

  /// Value of the first attribute named `name`.
  pub fn value(&self, name: &str) -> Option<&str> {
    self.attribute(name).and_then(|attribute| attribute.value.as_deref())
  }
}

/// A pending change to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
  /// Replace a whole element with new markup.
  Replace {
    /// Element span.
    span: Range<usize>,
    /// Replacement markup.
    markup: String,
  },
  /// Drop an element; a line left blank by the removal goes with it.
  Remove {
    /// Element span.
    span: Range<usize>,
  },
  /// Overwrite an attribute value.
  SetAttribute {
    /// The attribute to change.
    attribute: Attribute,
    /// New raw value.
    value: String,
  },
}

/// An HTML document held as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
  source: String,
}

impl HtmlDocument {
  /// Wrap the markup of a page.
  pub fn parse(source: impl Into<String>) -> Self {
    Self {
      source: source.into(),
    }
  }

  /// Tags of one category in document order. Tags inside comments are not reported.
  ///
  /// Only the text between comments is searched, so a commented-out opening tag never
  /// swallows markup that follows the comment.
  pub fn tags(&self, kind: TagKind) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut start = 0;
    for comment in comment_pattern().find_iter(&self.source) {
      self.collect_tags(kind, start..comment.start(), &mut tags);
      start = comment.end();
    }
    self.collect_tags(kind, start..self.source.len(), &mut tags);
    tags
  }

  fn collect_tags(&self, kind: TagKind, segment: Range<usize>, tags: &mut Vec<Tag>) {
    let offset = segment.start;
    for captures in kind.pattern().captures_iter(&self.source[segment]) {
      let Some(element) = captures.get(0) else {
        continue;
      };
      let attributes = captures
        .get(1)
        .map(|raw| parse_attributes(raw.as_str(), offset + raw.start()))
        .unwrap_or_default();
      tags.push(Tag {
        kind,
        span: offset + element.start()..offset + element.end(),
        attributes,
      });
    }
  }

  /// Apply non-overlapping edits computed against the current text.
  pub fn apply(&mut self, mut edits: Vec<Edit>) {
    edits.sort_by_key(|edit| std::cmp::Reverse(edit_start(edit)));

    for edit in edits {
      match edit {
        Edit::Replace { span, markup } => self.source.replace_range(span, &markup),
        Edit::Remove { span } => {
          let span = self.widen_to_blank_line(span);
          self.source.replace_range(span, "");
        }
        Edit::SetAttribute { attribute, value } => {
          let Some(span) = attribute.value_span else {
            continue;
          };
          let replacement = if attribute.unquoted {
            format!("\"{}\"", escape_attribute(&value))
          } else {
            value
          };
          self.source.replace_range(span, &replacement);
        }
      }
    }
  }

  /// Serialised markup.
  pub fn as_str(&self) -> &str {
    &self.source
  }

  /// Consume the document, returning its markup.
  pub fn into_string(self) -> String {
    self.source
  }

  fn widen_to_blank_line(&self, span: Range<usize>) -> Range<usize> {
    let line_start = self.source[..span.start].rfind('\n').map_or(0, |index| index + 1);
    let line_end = self.source[span.end..]
      .find('\n')
      .map_or(self.source.len(), |index| span.end + index + 1);

    let before_blank = self.source[line_start..span.start].trim().is_empty();
    let after_blank = self.source[span.end..line_end].trim().is_empty();
    if before_blank && after_blank {
      line_start..line_end
    } else {
      span
    }
  }
}

fn edit_start(edit: &Edit) -> usize {
  match edit {
    Edit::Replace { span, .. } | Edit::Remove { span } => span.start,
    Edit::SetAttribute { attribute, .. } => attribute.value_span.as_ref().map_or(0, |span| span.start),
  }
}

fn parse_attributes(raw: &str, offset: usize) -> Vec<Attribute> {
  attribute_pattern()
    .captures_iter(raw)
    .filter_map(|captures| {
      let name = captures.get(1)?.as_str().to_ascii_lowercase();
      let value = captures.get(2).or_else(|| captures.get(3)).or_else(|| captures.get(4));
      Some(Attribute {
        name,
        value: value.map(|found| found.as_str().to_string()),
        value_span: value.map(|found| offset + found.start()..offset + found.end()),
        unquoted: captures.get(4).is_some(),
      })
    })
    .collect()
}

fn escape_attribute(value: &str) -> String {
  value.replace('&', "&amp;").replace('"', "&quot;")
}

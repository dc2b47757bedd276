//! Asset minification for JS and CSS sources.
//!
//! The build phases only see the [`Minify`] trait; [`NativeMinifier`] backs it with oxc for
//! JavaScript and lightningcss for CSS.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use thiserror::Error;

use crate::models::Language;

/// Reasons a source could not be minified.
#[derive(Debug, Error)]
pub enum MinifyError {
  /// The source failed to parse or print.
  #[error("{language} syntax error: {message}")]
  Syntax {
    /// Language the source was parsed as.
    language: Language,
    /// Parser diagnostics.
    message: String,
  },
  /// No minifier exists for the language.
  #[error("no minifier available for {0} sources")]
  Unsupported(Language),
}

/// Capability turning JS/CSS text into its minified form.
pub trait Minify {
  /// Minify `source`. `obfuscate` additionally renames local identifiers in JavaScript.
  fn minify(&self, source: &str, language: Language, obfuscate: bool) -> Result<String, MinifyError>;
}

/// Default minifier built on oxc and lightningcss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMinifier;

impl Minify for NativeMinifier {
  fn minify(&self, source: &str, language: Language, obfuscate: bool) -> Result<String, MinifyError> {
    match language {
      Language::Js => minify_js(source, obfuscate),
      Language::Css => minify_css(source),
      Language::Other => Err(MinifyError::Unsupported(language)),
    }
  }
}

/// Minify a classic (non-module) script. Top-level names are never mangled since they are
/// shared with the other scripts of the page.
pub fn minify_js(source: &str, obfuscate: bool) -> Result<String, MinifyError> {
  let allocator = Allocator::default();
  let source_type = SourceType::cjs().with_script(true);
  let ret = Parser::new(&allocator, source, source_type).parse();
  if ret.panicked || !ret.errors.is_empty() {
    return Err(MinifyError::Syntax {
      language: Language::Js,
      message: ret
        .errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; "),
    });
  }

  let mut program = ret.program;
  let options = MinifierOptions {
    mangle: obfuscate.then(MangleOptions::default),
    compress: Some(CompressOptions::smallest()),
  };
  let ret = Minifier::new(options).minify(&allocator, &mut program);
  let code = Codegen::new()
    .with_options(CodegenOptions {
      minify: true,
      comments: CommentOptions::disabled(),
      ..CodegenOptions::default()
    })
    .with_scoping(ret.scoping)
    .build(&program)
    .code;
  Ok(code)
}

/// Minify a stylesheet.
pub fn minify_css(source: &str) -> Result<String, MinifyError> {
  let syntax_error = |message: String| MinifyError::Syntax {
    language: Language::Css,
    message,
  };

  let stylesheet =
    StyleSheet::parse(source, ParserOptions::default()).map_err(|err| syntax_error(err.to_string()))?;
  let result = stylesheet
    .to_css(PrinterOptions {
      minify: true,
      ..PrinterOptions::default()
    })
    .map_err(|err| syntax_error(err.to_string()))?;
  Ok(result.code)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn minifies_css() {
    let css = minify_css("body {\n  color: red;\n  margin: 0px;\n}\n").unwrap();
    assert!(css.len() < 30);
    assert!(css.contains("body{"));
  }

  #[test]
  fn minifies_js_and_keeps_globals() {
    let js = minify_js("function greet(name) {\n  var message = 'hi ' + name;\n  console.log(message);\n}\n", true)
      .unwrap();
    assert!(js.contains("greet"));
    assert!(!js.contains("\n  "));
  }

  #[test]
  fn rejects_malformed_js() {
    let err = minify_js("function (", false).unwrap_err();
    assert!(matches!(err, MinifyError::Syntax { language: Language::Js, .. }));
  }

  #[test]
  fn refuses_other_languages() {
    let err = NativeMinifier.minify("x", Language::Other, false).unwrap_err();
    assert!(matches!(err, MinifyError::Unsupported(Language::Other)));
  }
}

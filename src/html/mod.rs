//! Entry page handling: a small tag model over the page markup and the rewrite pass
//! that points asset tags at the build outputs.

mod document;
mod rewrite;

pub use document::{Attribute, Edit, HtmlDocument, Tag, TagKind};
pub use rewrite::HtmlRewriter;

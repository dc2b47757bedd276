//! Helpers for resolving and normalising asset paths.
//!
//! Pattern expansion, minified sibling naming and reference filtering live in focused
//! submodules so that the merge phase, the tree walk and the HTML rewrite share one
//! definition of each rule.

mod filters;
mod naming;
mod patterns;

pub use filters::should_ignore_asset_reference;
pub use naming::{is_minified_name, minified_sibling, minified_sibling_name, to_url_path};
pub use patterns::{Pattern, normalize_path, resolve};

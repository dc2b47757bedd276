#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod config;
pub mod error;
pub mod html;
pub mod merge;
pub mod minify;
pub mod models;
pub mod project;
pub mod walker;

pub use builder::HtmlBuilder;
pub use config::{BuildConfig, RawConfig};
pub use error::{BuildError, BuildResult};
pub use minify::{Minify, NativeMinifier};
pub use models::BuildReport;
pub use project::BuildContext;

//! Command-line entry point: parse arguments, initialise logging, run one build.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use html_builder::{BuildConfig, BuildContext, BuildError, BuildReport, HtmlBuilder};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Merge, minify and rewrite the assets of an HTML page into a build directory.
#[derive(Debug, Parser)]
#[command(name = "html-builder", version, about)]
struct Cli {
  /// HTML entry file to process.
  input_file: Option<PathBuf>,

  /// HTML entry file to process (alternative to the positional argument).
  #[arg(short = 'i', long = "input", value_name = "FILE")]
  input_flag: Option<PathBuf>,

  /// Builder config file. Defaults to builder_config.json next to the entry file.
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  config_file: Option<PathBuf>,

  /// Log every file decision.
  #[arg(short, long, conflicts_with = "quiet")]
  verbose: bool,

  /// Only log errors.
  #[arg(short, long)]
  quiet: bool,

  /// Disable colored log output.
  #[arg(long)]
  no_color: bool,
}

impl Cli {
  fn entry_file(&self) -> Option<&Path> {
    self.input_file.as_deref().or(self.input_flag.as_deref())
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logger(cli.verbose, cli.quiet, cli.no_color);

  let Some(entry_file) = cli.entry_file() else {
    eprintln!("Please provide an html file as input file.");
    print_usage();
    return ExitCode::FAILURE;
  };

  match run(entry_file, cli.config_file.as_deref()) {
    Ok(report) => {
      info!(
        build_dir = %report.build_dir.display(),
        bundles = report.merge_groups,
        merged = report.merged_files,
        minified = report.walk.minified,
        copied = report.walk.copied,
        skipped = report.walk.skipped,
        "done"
      );
      ExitCode::SUCCESS
    }
    Err(err) => {
      let usage_error = err
        .downcast_ref::<BuildError>()
        .is_some_and(BuildError::is_usage_error);
      eprintln!("error: {err:#}");
      if usage_error {
        print_usage();
      }
      ExitCode::FAILURE
    }
  }
}

fn run(entry_file: &Path, config_file: Option<&Path>) -> Result<BuildReport> {
  let context = BuildContext::new(entry_file, config_file)?;
  let config = BuildConfig::load(&context.config_file)
    .with_context(|| format!("invalid builder config {}", context.config_file.display()))?;
  let report = HtmlBuilder::new(&context, &config)
    .build()
    .with_context(|| format!("build of {} failed", context.entry_file.display()))?;
  Ok(report)
}

fn print_usage() {
  let mut command = Cli::command();
  eprintln!("{}", command.render_help());
}

/// Initialise the tracing subscriber. `RUST_LOG` wins over the default level unless
/// `--verbose` or `--quiet` is given.
fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
  let filter = if verbose {
    EnvFilter::new("html_builder=debug")
  } else if quiet {
    EnvFilter::new("html_builder=error")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("html_builder=info"))
  };

  let fmt_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_ansi(!no_color)
    .compact();

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt_layer)
    .init();
}

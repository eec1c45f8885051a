mod options;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use reexport_core::plugin::{
  PluginContext, PluginLogger, PluginOptions, ProcessContext, StylesheetPlugin,
};
use reexport_core::types::StylesheetAsset;
use reexport_filesystem::{FileSystemRef, OsFileSystem};
use reexport_plugin_extractor::ReexportExtractorPlugin;

use options::build_options;

/// Extract `var(--...)` declarations from a batch of stylesheets into one
/// consolidated output stylesheet.
#[derive(Debug, Parser)]
#[command(name = "reexport", version)]
pub struct ReexportCommand {
  /// Input stylesheets, processed in order as one batch
  #[arg(required = true)]
  pub inputs: Vec<PathBuf>,
  /// Output directory; repeat the flag for multiple destinations
  #[arg(long)]
  pub dist: Vec<PathBuf>,
  /// Base name of the output file [default: "output"]
  #[arg(long)]
  pub filename: Option<String>,
  /// Output file extension without the leading dot [default: "css"]
  #[arg(long)]
  pub ext: Option<String>,
  /// Custom property name to extract; repeat the flag to whitelist several
  #[arg(long = "whitelist")]
  pub whitelist: Vec<String>,
  /// Stylesheet path to skip entirely
  #[arg(long = "exclude")]
  pub exclude: Vec<PathBuf>,
  /// JSON config file carrying the same keys as the options object;
  /// command line flags take precedence
  #[arg(long)]
  pub config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let args = ReexportCommand::parse();
  let file_system: FileSystemRef = Arc::new(OsFileSystem);
  let cwd = file_system
    .cwd()
    .context("failed to resolve the current working directory")?;

  let (options, inputs) = build_options(&args, &file_system, &cwd)?;

  let ctx = PluginContext {
    file_system: file_system.clone(),
    logger: PluginLogger::default(),
    options: Arc::new(PluginOptions {
      project_root: cwd.clone(),
    }),
  };
  let mut plugin = ReexportExtractorPlugin::new(&ctx, Some(&options))?;

  for input in &inputs {
    let asset = read_stylesheet(&file_system, input)?;
    plugin.process(asset, ProcessContext::default())?;
    tracing::info!("processed {}", input.display());
  }

  Ok(())
}

fn read_stylesheet(file_system: &FileSystemRef, input: &Path) -> anyhow::Result<StylesheetAsset> {
  let css = file_system
    .read_to_string(input)
    .with_context(|| format!("failed to read {}", input.display()))?;
  let root =
    reexport_css::parse(&css).with_context(|| format!("failed to parse {}", input.display()))?;

  Ok(StylesheetAsset {
    file_path: input.to_path_buf(),
    root,
  })
}

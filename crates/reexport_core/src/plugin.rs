use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use reexport_filesystem::FileSystemRef;

use crate::types::StylesheetAsset;

/// Everything a plugin needs from its host at construction time.
pub struct PluginContext {
  pub file_system: FileSystemRef,
  pub logger: PluginLogger,
  pub options: Arc<PluginOptions>,
}

#[derive(Default)]
pub struct PluginLogger {}

#[derive(Debug, Default)]
pub struct PluginOptions {
  /// Directory relative configuration paths resolve against.
  pub project_root: PathBuf,
}

/// Opaque per-invocation handle accepted alongside each stylesheet. Plugins
/// take it without reading it; hosts can thread their own bookkeeping
/// through later without changing the call contract.
#[derive(Debug, Default)]
pub struct ProcessContext {}

/// Process stylesheets one at a time, accumulating batch state on the plugin.
///
/// `process` takes `&mut self` because a batch plugin mutates shared
/// accumulation state; the driver must invoke it strictly sequentially and
/// never interleave two batches on one instance.
pub trait StylesheetPlugin: Debug {
  fn process(&mut self, asset: StylesheetAsset, ctx: ProcessContext) -> Result<(), anyhow::Error>;
}

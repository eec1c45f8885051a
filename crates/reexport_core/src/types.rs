use std::path::PathBuf;

use reexport_css::Root;

/// One parsed input stylesheet handed to a plugin.
#[derive(Clone, Debug)]
pub struct StylesheetAsset {
  /// Absolute path of the source file; matched against exclusion lists.
  pub file_path: PathBuf,
  /// Parsed stylesheet tree, declarations in document order.
  pub root: Root,
}

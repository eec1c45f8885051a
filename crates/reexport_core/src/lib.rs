pub mod config_loader;
pub mod plugin;
pub mod types;

pub use config_loader::{ConfigFile, ConfigFileError, ConfigLoader, ConfigLoaderRef};
pub use plugin::{PluginContext, PluginLogger, PluginOptions, ProcessContext, StylesheetPlugin};
pub use types::StylesheetAsset;

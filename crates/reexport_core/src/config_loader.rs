use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

use reexport_filesystem::FileSystemRef;

pub type ConfigLoaderRef = Arc<ConfigLoader>;

/// Loads JSON configuration files through the file-system abstraction.
#[derive(Debug)]
pub struct ConfigLoader {
  pub fs: FileSystemRef,
  pub search_path: PathBuf,
}

#[derive(Debug, PartialEq)]
pub struct ConfigFile<T> {
  pub contents: T,
  pub path: PathBuf,
  pub raw: String,
}

#[derive(Debug, Error)]
pub enum ConfigFileError {
  #[error("Unable to locate {file_name} config file from {search_path}")]
  NotFound {
    file_name: String,
    search_path: String,
  },
  #[error("Error reading {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("Error parsing {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_json::Error,
  },
}

impl ConfigLoader {
  pub fn load_json_config<Config: DeserializeOwned>(
    &self,
    file_name: &str,
  ) -> Result<ConfigFile<Config>, ConfigFileError> {
    let path = self.search_path.join(file_name);
    if !self.fs.is_file(&path) {
      return Err(ConfigFileError::NotFound {
        file_name: file_name.to_string(),
        search_path: self.search_path.display().to_string(),
      });
    }

    let raw = self
      .fs
      .read_to_string(&path)
      .map_err(|source| ConfigFileError::Io {
        path: path.display().to_string(),
        source,
      })?;

    let contents =
      serde_json::from_str::<Config>(&raw).map_err(|source| ConfigFileError::Parse {
        path: path.display().to_string(),
        source,
      })?;

    Ok(ConfigFile {
      contents,
      path,
      raw,
    })
  }
}

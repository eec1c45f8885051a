use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Options object is required")]
  MissingOptions,
  #[error("`whitelist` must be a list of custom property names")]
  MalformedWhitelist,
  #[error("Invalid options object: {0}")]
  InvalidOptions(#[from] serde_json::Error),
}

/// One-or-many output directories, as the options object allows both
/// `"dist": "./theme"` and `"dist": ["./a", "./b"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DistConfig {
  Single(String),
  Many(Vec<String>),
}

/// The options object as supplied by the host, prior to validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtractorConfig {
  pub dist: Option<DistConfig>,
  pub filename: Option<String>,
  pub ext: Option<String>,
  pub whitelist: Option<serde_json::Value>,
  pub total_count: Option<usize>,
  pub exclude_files: Option<Vec<PathBuf>>,
}

/// Validated batch configuration.
#[derive(Debug)]
pub struct ExtractorConfig {
  /// Output directories, resolved against the project root.
  pub dist: Vec<PathBuf>,
  pub filename: String,
  pub ext: String,
  /// Custom-property name patterns; `None` extracts every reference.
  pub whitelist: Option<Vec<String>>,
  /// Number of non-excluded inputs expected before the flush fires. When
  /// absent the batch never auto-flushes and the driver flushes explicitly.
  pub total_count: Option<usize>,
  /// Absolute source paths skipped entirely, without counting toward
  /// `total_count`.
  pub exclude_files: Vec<PathBuf>,
}

impl ExtractorConfig {
  pub fn from_options(
    options: Option<&serde_json::Value>,
    project_root: &Path,
  ) -> Result<Self, ConfigError> {
    let Some(options) = options else {
      return Err(ConfigError::MissingOptions);
    };
    let raw: RawExtractorConfig = serde_json::from_value(options.clone())?;
    Self::from_raw(raw, project_root)
  }

  pub fn from_raw(raw: RawExtractorConfig, project_root: &Path) -> Result<Self, ConfigError> {
    let dist = match raw.dist {
      None => vec!["./".to_string()],
      Some(DistConfig::Single(dist)) => vec![dist],
      Some(DistConfig::Many(dist)) => dist,
    };
    let dist = dist
      .iter()
      .map(|entry| resolve(project_root, Path::new(entry)))
      .collect();

    let whitelist = match raw.whitelist {
      None => None,
      Some(serde_json::Value::Array(entries)) => {
        let mut names = Vec::with_capacity(entries.len());
        for entry in entries {
          match entry {
            serde_json::Value::String(name) => names.push(name),
            _ => return Err(ConfigError::MalformedWhitelist),
          }
        }
        Some(names)
      }
      Some(_) => return Err(ConfigError::MalformedWhitelist),
    };

    Ok(ExtractorConfig {
      dist,
      filename: raw.filename.unwrap_or_else(|| "output".to_string()),
      ext: raw.ext.unwrap_or_else(|| "css".to_string()),
      whitelist,
      total_count: raw.total_count,
      exclude_files: raw.exclude_files.unwrap_or_default(),
    })
  }

  pub fn output_file_name(&self) -> String {
    format!("{}.{}", self.filename, self.ext)
  }
}

fn resolve(project_root: &Path, path: &Path) -> PathBuf {
  let joined = project_root.join(path);
  let mut result = PathBuf::new();
  for component in joined.components() {
    match component {
      Component::ParentDir => {
        result.pop();
      }
      Component::CurDir => {}
      other => result.push(other),
    }
  }
  result
}

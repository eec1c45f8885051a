//! Assembly of the plugin options object from config file and flags.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use reexport_core::config_loader::ConfigLoader;
use reexport_filesystem::FileSystemRef;
use serde_json::json;

use crate::ReexportCommand;

/// Build the options object handed to the plugin, plus the absolutized
/// input list. `totalCount` is always set to the number of non-excluded
/// inputs — excluded files never count toward the flush total.
pub fn build_options(
  args: &ReexportCommand,
  file_system: &FileSystemRef,
  cwd: &Path,
) -> anyhow::Result<(serde_json::Value, Vec<PathBuf>)> {
  let mut options = match &args.config {
    Some(config_path) => load_config_object(file_system, cwd, config_path)?,
    None => serde_json::Map::new(),
  };

  if !args.dist.is_empty() {
    let dist: Vec<String> = args
      .dist
      .iter()
      .map(|path| path.display().to_string())
      .collect();
    options.insert("dist".into(), json!(dist));
  }
  if let Some(filename) = &args.filename {
    options.insert("filename".into(), json!(filename));
  }
  if let Some(ext) = &args.ext {
    options.insert("ext".into(), json!(ext));
  }
  if !args.whitelist.is_empty() {
    options.insert("whitelist".into(), json!(args.whitelist));
  }
  if !args.exclude.is_empty() {
    let exclude: Vec<String> = args
      .exclude
      .iter()
      .map(|path| absolutize(cwd, path).display().to_string())
      .collect();
    options.insert("excludeFiles".into(), json!(exclude));
  }

  let exclude_files: Vec<PathBuf> = options
    .get("excludeFiles")
    .and_then(|value| serde_json::from_value(value.clone()).ok())
    .unwrap_or_default();

  let inputs: Vec<PathBuf> = args
    .inputs
    .iter()
    .map(|path| absolutize(cwd, path))
    .collect();
  let total_count = inputs
    .iter()
    .filter(|path| !exclude_files.contains(path))
    .count();
  options.insert("totalCount".into(), json!(total_count));

  Ok((serde_json::Value::Object(options), inputs))
}

fn load_config_object(
  file_system: &FileSystemRef,
  cwd: &Path,
  config_path: &Path,
) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
  let path = absolutize(cwd, config_path);
  let file_name = path
    .file_name()
    .and_then(|name| name.to_str())
    .context("--config must point to a file")?
    .to_string();
  let search_path = path
    .parent()
    .map(Path::to_path_buf)
    .unwrap_or_else(|| cwd.to_path_buf());

  let loader = ConfigLoader {
    fs: file_system.clone(),
    search_path,
  };
  let config = loader.load_json_config::<serde_json::Value>(&file_name)?;

  match config.contents {
    serde_json::Value::Object(map) => Ok(map),
    _ => anyhow::bail!("config file {} must contain a JSON object", path.display()),
  }
}

/// Resolve a path against `cwd` and normalize `.` and `..` segments without
/// touching the file system.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    cwd.join(path)
  };

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

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use clap::Parser;
  use pretty_assertions::assert_eq;
  use reexport_filesystem::InMemoryFileSystem;

  use super::*;

  fn parse_args(argv: &[&str]) -> ReexportCommand {
    ReexportCommand::parse_from(argv)
  }

  #[test]
  fn absolutize_resolves_relative_segments() {
    assert_eq!(
      absolutize(Path::new("/project"), Path::new("./styles/../main.css")),
      PathBuf::from("/project/main.css")
    );
    assert_eq!(
      absolutize(Path::new("/project"), Path::new("/abs/main.css")),
      PathBuf::from("/abs/main.css")
    );
  }

  #[test]
  fn total_count_skips_excluded_inputs() {
    let args = parse_args(&[
      "reexport",
      "a.css",
      "vendor.css",
      "--exclude",
      "vendor.css",
    ]);
    let file_system: FileSystemRef = Arc::new(InMemoryFileSystem::default());

    let (options, inputs) = build_options(&args, &file_system, Path::new("/project")).unwrap();
    assert_eq!(options["totalCount"], 1);
    assert_eq!(
      inputs,
      vec![
        PathBuf::from("/project/a.css"),
        PathBuf::from("/project/vendor.css"),
      ]
    );
    assert_eq!(options["excludeFiles"], json!(["/project/vendor.css"]));
  }

  #[test]
  fn flags_override_config_file_values() {
    let file_system = Arc::new(InMemoryFileSystem::default());
    file_system.write_file(
      Path::new("/project/reexport.config.json"),
      String::from(r#"{ "filename": "from-config", "ext": "scss" }"#),
    );
    let args = parse_args(&[
      "reexport",
      "a.css",
      "--config",
      "reexport.config.json",
      "--filename",
      "from-flags",
    ]);
    let file_system: FileSystemRef = file_system;

    let (options, _) = build_options(&args, &file_system, Path::new("/project")).unwrap();
    assert_eq!(options["filename"], "from-flags");
    assert_eq!(options["ext"], "scss");
  }
}

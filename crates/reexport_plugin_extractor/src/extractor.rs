use anyhow::Error;
use reexport_core::plugin::{PluginContext, ProcessContext, StylesheetPlugin};
use reexport_core::types::StylesheetAsset;
use reexport_filesystem::FileSystemRef;

use crate::extractor_config::{ConfigError, ExtractorConfig};
use crate::filter::QualificationFilter;
use crate::session::{write_outputs, ExtractionSession, FlushError};

/// Batch plugin extracting custom-property declarations from every input
/// stylesheet into one consolidated output.
///
/// Construct one instance per batch: the output tree, deduplication index
/// and grouping cursors all live on the instance and survive across inputs
/// until the flush.
#[derive(Debug)]
pub struct ReexportExtractorPlugin {
  config: ExtractorConfig,
  filter: QualificationFilter,
  session: ExtractionSession,
  file_system: FileSystemRef,
}

impl ReexportExtractorPlugin {
  /// Validates the options object and compiles the whitelist before any
  /// input is processed. Configuration problems abort the batch here.
  pub fn new(ctx: &PluginContext, options: Option<&serde_json::Value>) -> Result<Self, ConfigError> {
    let config = ExtractorConfig::from_options(options, &ctx.options.project_root)?;
    let filter = QualificationFilter::new(config.whitelist.as_deref())?;

    Ok(ReexportExtractorPlugin {
      config,
      filter,
      session: ExtractionSession::new(),
      file_system: ctx.file_system.clone(),
    })
  }

  pub fn config(&self) -> &ExtractorConfig {
    &self.config
  }

  /// Serialized form of everything accumulated so far.
  pub fn output(&self) -> String {
    self.session.serialize()
  }

  /// Serialize the accumulated tree once and write it to every configured
  /// output path. Called automatically when `totalCount` is reached; hosts
  /// without a known input count call it themselves after the last input.
  pub fn flush(&self) -> Result<(), FlushError> {
    let content = self.session.serialize();
    write_outputs(&self.file_system, &self.config, &content)
  }
}

impl StylesheetPlugin for ReexportExtractorPlugin {
  #[tracing::instrument(
    level = "debug",
    skip_all,
    fields(plugin = "ReexportExtractorPlugin")
  )]
  fn process(&mut self, asset: StylesheetAsset, _ctx: ProcessContext) -> Result<(), Error> {
    if self.config.exclude_files.contains(&asset.file_path) {
      // Excluded inputs skip the walk and do not count toward totalCount.
      tracing::debug!("skipping excluded stylesheet {}", asset.file_path.display());
      return Ok(());
    }

    let appended = self.session.walk(&asset.root, &self.filter);
    let processed = self.session.finish_input();
    tracing::debug!(
      "extracted {appended} declaration(s) from {}",
      asset.file_path.display()
    );

    if Some(processed) == self.config.total_count {
      self.flush()?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::path::{Path, PathBuf};
  use std::sync::Arc;

  use pretty_assertions::assert_eq;
  use reexport_core::plugin::{PluginLogger, PluginOptions};
  use reexport_filesystem::{FileSystem, InMemoryFileSystem};
  use serde_json::json;

  use super::*;

  fn create_plugin(
    options: serde_json::Value,
  ) -> (ReexportExtractorPlugin, Arc<InMemoryFileSystem>) {
    let file_system = Arc::new(InMemoryFileSystem::default());
    let plugin = ReexportExtractorPlugin::new(
      &PluginContext {
        file_system: file_system.clone(),
        logger: PluginLogger::default(),
        options: Arc::new(PluginOptions {
          project_root: PathBuf::from("/project"),
        }),
      },
      Some(&options),
    )
    .unwrap();
    (plugin, file_system)
  }

  fn asset(path: &str, css: &str) -> StylesheetAsset {
    StylesheetAsset {
      file_path: PathBuf::from(path),
      root: reexport_css::parse(css).unwrap(),
    }
  }

  fn process(plugin: &mut ReexportExtractorPlugin, path: &str, css: &str) {
    plugin
      .process(asset(path, css), ProcessContext::default())
      .unwrap();
  }

  #[test]
  fn requires_an_options_object() {
    let file_system: FileSystemRef = Arc::new(InMemoryFileSystem::default());
    let error = ReexportExtractorPlugin::new(
      &PluginContext {
        file_system,
        logger: PluginLogger::default(),
        options: Arc::new(PluginOptions::default()),
      },
      None,
    )
    .unwrap_err();
    assert_eq!(error.to_string(), "Options object is required");
  }

  #[test]
  fn rejects_a_malformed_whitelist() {
    let file_system: FileSystemRef = Arc::new(InMemoryFileSystem::default());
    let error = ReexportExtractorPlugin::new(
      &PluginContext {
        file_system,
        logger: PluginLogger::default(),
        options: Arc::new(PluginOptions::default()),
      },
      Some(&json!({ "whitelist": "--c1" })),
    )
    .unwrap_err();
    assert!(matches!(error, ConfigError::MalformedWhitelist));
  }

  #[test]
  fn extracts_only_custom_property_references() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      ".btn { color: var(--c1); font-size: 12px; }",
    );

    assert_eq!(plugin.output(), ".btn {\n  color: var(--c1);\n}\n");
  }

  #[test]
  fn whitelist_drops_other_custom_properties() {
    let (mut plugin, _) = create_plugin(json!({ "whitelist": ["--c1"] }));
    process(
      &mut plugin,
      "/project/a.css",
      ".a { color: var(--c1); margin: var(--m2); }",
    );

    assert_eq!(plugin.output(), ".a {\n  color: var(--c1);\n}\n");
  }

  #[test]
  fn groups_consecutive_declarations_into_one_rule() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      ".a { color: var(--1); margin: var(--2); }",
    );

    assert_eq!(
      plugin.output(),
      ".a {\n  color: var(--1);\n  margin: var(--2);\n}\n"
    );
  }

  #[test]
  fn deduplicates_across_files() {
    let (mut plugin, file_system) = create_plugin(json!({ "dist": "./out", "totalCount": 2 }));
    process(
      &mut plugin,
      "/project/a.css",
      ".btn { color: var(--c1); font-size: 12px; }",
    );
    process(
      &mut plugin,
      "/project/b.css",
      ".btn { color: var(--c1); } .card { margin: var(--m1); }",
    );

    assert_eq!(
      file_system
        .read_to_string(Path::new("/project/out/output.css"))
        .unwrap(),
      ".btn {\n  color: var(--c1);\n}\n\n.card {\n  margin: var(--m1);\n}\n"
    );
  }

  #[test]
  fn index_reunites_interleaved_selectors() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      ".a { color: var(--1); } .b { margin: var(--2); } .a { padding: var(--3); }",
    );

    assert_eq!(
      plugin.output(),
      ".a {\n  color: var(--1);\n  padding: var(--3);\n}\n\n.b {\n  margin: var(--2);\n}\n"
    );
  }

  #[test]
  fn at_rule_grouping_preserves_name_and_params() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      "@media (min-width: 600px) { .x { color: var(--c); } }",
    );

    assert_eq!(
      plugin.output(),
      "@media (min-width: 600px) {\n  .x {\n    color: var(--c);\n  }\n}\n"
    );
  }

  #[test]
  fn rules_in_one_at_rule_block_share_one_output_at_rule() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      "@media m { .x { a: var(--1); } .y { b: var(--2); } }",
    );

    assert_eq!(
      plugin.output(),
      "@media m {\n  .x {\n    a: var(--1);\n  }\n  .y {\n    b: var(--2);\n  }\n}\n"
    );
  }

  #[test]
  fn at_rule_groupings_merge_across_files_via_the_index() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      "@media m { .x { a: var(--1); } }",
    );
    process(
      &mut plugin,
      "/project/b.css",
      "@media m { .x { b: var(--2); } }",
    );

    assert_eq!(
      plugin.output(),
      "@media m {\n  .x {\n    a: var(--1);\n    b: var(--2);\n  }\n}\n"
    );
  }

  #[test]
  fn at_rule_change_opens_new_grouping_despite_index_hit() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      "@media a { .x { color: var(--1); } } \
       @media b { .y { color: var(--2); } } \
       @media a { .x { margin: var(--3); } }",
    );

    assert_eq!(
      plugin.output(),
      "@media a {\n  .x {\n    color: var(--1);\n  }\n}\n\n\
       @media b {\n  .y {\n    color: var(--2);\n  }\n}\n\n\
       @media a {\n  .x {\n    margin: var(--3);\n  }\n}\n"
    );
  }

  #[test]
  fn skipped_declaration_still_clears_rule_cursor() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      ".x { a: var(--1); } .y { font-size: 12px; } @media m { .x { b: var(--2); } }",
    );

    // Without the continuity side effect the `.x` cursor would survive the
    // `.y` skip and `b` would leak into the top-level `.x` rule.
    assert_eq!(
      plugin.output(),
      ".x {\n  a: var(--1);\n}\n\n@media m {\n  .x {\n    b: var(--2);\n  }\n}\n"
    );
  }

  #[test]
  fn same_selector_entering_at_rule_continues_current_rule() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      ".x { a: var(--1); } @media m { .x { b: var(--2); } }",
    );

    // With an unchanged selector and no at-rule cursor, the grouping is
    // reused as-is, so the nested declaration joins the top-level rule.
    assert_eq!(plugin.output(), ".x {\n  a: var(--1);\n  b: var(--2);\n}\n");
  }

  #[test]
  fn duplicate_declarations_within_one_file_are_dropped() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      ".a { color: var(--1); } .b { margin: var(--2); } .a { color: var(--1); }",
    );

    assert_eq!(
      plugin.output(),
      ".a {\n  color: var(--1);\n}\n\n.b {\n  margin: var(--2);\n}\n"
    );
  }

  #[test]
  fn flush_waits_for_the_final_input() {
    let (mut plugin, file_system) =
      create_plugin(json!({ "dist": ["./a", "./b"], "totalCount": 3 }));
    let output_a = Path::new("/project/a/output.css");
    let output_b = Path::new("/project/b/output.css");

    process(&mut plugin, "/project/1.css", ".a { color: var(--1); }");
    assert!(!file_system.is_file(output_a));

    process(&mut plugin, "/project/2.css", ".b { color: var(--2); }");
    assert!(!file_system.is_file(output_a));

    process(&mut plugin, "/project/3.css", ".c { color: var(--3); }");
    let content_a = file_system.read_to_string(output_a).unwrap();
    let content_b = file_system.read_to_string(output_b).unwrap();
    assert_eq!(content_a, content_b);
    assert_eq!(
      content_a,
      ".a {\n  color: var(--1);\n}\n\n.b {\n  color: var(--2);\n}\n\n.c {\n  color: var(--3);\n}\n"
    );
  }

  #[test]
  fn excluded_files_do_not_count_toward_total() {
    let (mut plugin, file_system) = create_plugin(json!({
      "dist": "./out",
      "totalCount": 1,
      "excludeFiles": ["/project/vendor.css"],
    }));

    process(&mut plugin, "/project/vendor.css", ".v { color: var(--v); }");
    assert!(!file_system.is_file(Path::new("/project/out/output.css")));
    assert_eq!(plugin.session.processed_files(), 0);

    process(&mut plugin, "/project/app.css", ".a { color: var(--a); }");
    assert_eq!(
      file_system
        .read_to_string(Path::new("/project/out/output.css"))
        .unwrap(),
      ".a {\n  color: var(--a);\n}\n"
    );
  }

  #[test]
  fn without_total_count_flush_is_explicit() {
    let (mut plugin, file_system) = create_plugin(json!({ "dist": "./out" }));
    process(&mut plugin, "/project/a.css", ".a { color: var(--1); }");
    assert!(!file_system.is_file(Path::new("/project/out/output.css")));

    plugin.flush().unwrap();
    assert_eq!(
      file_system
        .read_to_string(Path::new("/project/out/output.css"))
        .unwrap(),
      ".a {\n  color: var(--1);\n}\n"
    );
  }

  #[test]
  fn custom_filename_and_extension() {
    let (mut plugin, file_system) = create_plugin(json!({
      "dist": "./out",
      "filename": "vars",
      "ext": "scss",
      "totalCount": 1,
    }));
    process(&mut plugin, "/project/a.css", ".a { color: var(--1); }");
    assert!(file_system.is_file(Path::new("/project/out/vars.scss")));
  }

  #[test]
  fn declarations_outside_rules_are_ignored() {
    let (mut plugin, _) = create_plugin(json!({}));
    process(
      &mut plugin,
      "/project/a.css",
      "@font-face { font-family: Demo; src: var(--src); } .a { color: var(--1); }",
    );

    assert_eq!(plugin.output(), ".a {\n  color: var(--1);\n}\n");
  }

  mod failing_writes {
    use std::io;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Fails every write below a configured prefix; everything else is
    /// delegated to an in-memory filesystem.
    #[derive(Debug)]
    struct FailingFileSystem {
      inner: InMemoryFileSystem,
      deny_prefix: PathBuf,
    }

    impl FileSystem for FailingFileSystem {
      fn cwd(&self) -> io::Result<PathBuf> {
        self.inner.cwd()
      }

      fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.inner.canonicalize(path)
      }

      fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path)
      }

      fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read(path)
      }

      fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.inner.read_to_string(path)
      }

      fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if path.starts_with(&self.deny_prefix) {
          return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.inner.write(path, contents)
      }

      fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
      }

      fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
      }
    }

    #[test]
    fn one_failed_write_does_not_stop_the_others() {
      let file_system = Arc::new(FailingFileSystem {
        inner: InMemoryFileSystem::default(),
        deny_prefix: PathBuf::from("/project/readonly"),
      });
      let mut plugin = ReexportExtractorPlugin::new(
        &PluginContext {
          file_system: file_system.clone(),
          logger: PluginLogger::default(),
          options: Arc::new(PluginOptions {
            project_root: PathBuf::from("/project"),
          }),
        },
        Some(&json!({ "dist": ["./readonly", "./out"], "totalCount": 1 })),
      )
      .unwrap();

      let result = plugin.process(
        asset("/project/a.css", ".a { color: var(--1); }"),
        ProcessContext::default(),
      );

      let error = result.unwrap_err();
      let flush_error = error.downcast_ref::<FlushError>().unwrap();
      assert_eq!(flush_error.failures.len(), 1);
      assert_eq!(
        flush_error.failures[0].0,
        PathBuf::from("/project/readonly/output.css")
      );

      // The healthy path was still written.
      assert!(file_system.is_file(Path::new("/project/out/output.css")));
    }
  }
}

use std::collections::HashMap;
use std::path::PathBuf;

use reexport_css::stringifier;
use reexport_css::{as_at_rule, as_declaration, as_rule, AtRule, Declaration, Root, Rule};
use reexport_filesystem::FileSystemRef;
use thiserror::Error;

use crate::extractor_config::ExtractorConfig;
use crate::filter::QualificationFilter;

/// One or more output writes failed. Every configured path is still
/// attempted before this is raised.
#[derive(Debug, Error)]
#[error("failed to write {} output path(s)", .failures.len())]
pub struct FlushError {
  pub failures: Vec<(PathBuf, std::io::Error)>,
}

/// Batch-scoped accumulation state: the output tree, the cross-file
/// deduplication index, the grouping cursors and the processed-input
/// counter. Constructed once per batch; never reset between files.
#[derive(Debug)]
pub struct ExtractionSession {
  /// Holds the resulting CSS.
  extracted: Root,
  /// Dedup index: `atRuleName_atRuleParams-selectors` (or plain joined
  /// selectors for top-level rules) to the output rule created for that
  /// grouping.
  index: HashMap<String, Rule>,
  current_rule: Option<Rule>,
  current_at_rule: Option<AtRule>,
  processed_files: usize,
}

impl ExtractionSession {
  pub fn new() -> Self {
    Self {
      extracted: Root::new(),
      index: HashMap::new(),
      current_rule: None,
      current_at_rule: None,
      processed_files: 0,
    }
  }

  pub fn extracted(&self) -> &Root {
    &self.extracted
  }

  pub fn processed_files(&self) -> usize {
    self.processed_files
  }

  /// Walk one input tree in document order, appending qualifying
  /// declarations into the output tree. Returns how many were appended.
  pub fn walk(&mut self, root: &Root, filter: &QualificationFilter) -> usize {
    let mut appended = 0;
    root.walk_decls(|decl| {
      if self.collect(&decl, filter) {
        appended += 1;
      }
      true
    });
    appended
  }

  /// Count one completed (non-excluded) input walk; returns the new total.
  pub fn finish_input(&mut self) -> usize {
    self.processed_files += 1;
    self.processed_files
  }

  pub fn serialize(&self) -> String {
    stringifier::stringify(&self.extracted)
  }

  fn collect(&mut self, decl: &Declaration, filter: &QualificationFilter) -> bool {
    let value = decl.value();
    let source_rule = decl.parent().as_ref().and_then(as_rule);

    // A declaration with no enclosing rule (e.g. directly inside
    // @font-face) can never be regrouped under a selector; it behaves like
    // a non-qualifying declaration whose selector never matches.
    let Some(source_rule) = source_rule else {
      if self.current_rule.is_some() {
        self.current_rule = None;
      }
      return false;
    };

    if !filter.references_custom_property(&value) {
      // Skipped declarations still break grouping continuity when their
      // selector differs from the current cursor's.
      if let Some(current) = &self.current_rule {
        if current.selector() != source_rule.selector() {
          self.current_rule = None;
        }
      }
      return false;
    }

    if !filter.matches_whitelist(&value) {
      return false;
    }

    let source_at_rule = source_rule.parent().as_ref().and_then(as_at_rule);
    let key = dedup_key(source_at_rule.as_ref(), &source_rule);
    let prop = decl.prop();

    if let Some(existing) = self.index.get(&key) {
      if rule_contains(existing, &prop, &value) {
        // Already extracted from an earlier file.
        return false;
      }
      // Point the cursor at the rule this grouping created earlier so the
      // declaration joins it instead of opening a parallel duplicate.
      self.current_rule = Some(existing.clone());
    }

    self.update_current(&source_rule, source_at_rule.as_ref(), &key);

    if let Some(current) = &self.current_rule {
      current.append(decl.clone_node().to_node());
      return true;
    }
    false
  }

  fn update_current(&mut self, source_rule: &Rule, source_at_rule: Option<&AtRule>, key: &str) {
    let no_rule_or_changed = self
      .current_rule
      .as_ref()
      .map_or(true, |current| current.selector() != source_rule.selector());

    let at_rule_changed = self.current_at_rule.as_ref().is_some_and(|current| {
      source_at_rule.map_or(true, |at_rule| at_rule_differs(current, at_rule))
    });

    if !no_rule_or_changed && !at_rule_changed {
      return;
    }

    let rule = Rule::new(source_rule.selector());
    match source_at_rule {
      None => {
        self.current_at_rule = None;
        self.extracted.append(rule.to_node());
      }
      Some(at_rule) => {
        let needs_new_at_rule = self
          .current_at_rule
          .as_ref()
          .map_or(true, |current| at_rule_differs(current, at_rule));
        if needs_new_at_rule {
          let created = AtRule::new(at_rule.name(), at_rule.params());
          self.extracted.append(created.to_node());
          self.current_at_rule = Some(created);
        }
        if let Some(current) = &self.current_at_rule {
          current.append(rule.to_node());
        }
      }
    }

    self.index.insert(key.to_string(), rule.clone());
    self.current_rule = Some(rule);
  }
}

impl Default for ExtractionSession {
  fn default() -> Self {
    Self::new()
  }
}

fn at_rule_differs(current: &AtRule, target: &AtRule) -> bool {
  current.name() != target.name() || current.params() != target.params()
}

fn dedup_key(at_rule: Option<&AtRule>, rule: &Rule) -> String {
  let selectors = rule.selectors().join(",");
  match at_rule {
    Some(at_rule) => format!("{}_{}-{}", at_rule.name(), at_rule.params(), selectors),
    None => selectors,
  }
}

fn rule_contains(rule: &Rule, prop: &str, value: &str) -> bool {
  rule
    .nodes()
    .iter()
    .filter_map(as_declaration)
    .any(|decl| decl.prop() == prop && decl.value() == value)
}

/// Write `content` to `{dist}/{filename}.{ext}` for every configured output
/// path. Every path is attempted; failures are collected and reported
/// together.
pub(crate) fn write_outputs(
  fs: &FileSystemRef,
  config: &ExtractorConfig,
  content: &str,
) -> Result<(), FlushError> {
  let file_name = config.output_file_name();
  let mut failures = Vec::new();

  for dist in &config.dist {
    let target = dist.join(&file_name);
    let result = fs
      .create_dir_all(dist)
      .and_then(|()| fs.write(&target, content.as_bytes()));
    match result {
      Ok(()) => tracing::debug!("wrote {}", target.display()),
      Err(error) => {
        tracing::warn!("failed to write {}: {error}", target.display());
        failures.push((target, error));
      }
    }
  }

  if failures.is_empty() {
    Ok(())
  } else {
    Err(FlushError { failures })
  }
}

use std::sync::OnceLock;

use regex::Regex;

use crate::extractor_config::ConfigError;

/// Matches a custom-property reference: `var(` followed by optional
/// whitespace and `--`. Tested against the raw value text.
fn var_reference() -> &'static Regex {
  static VAR_REFERENCE: OnceLock<Regex> = OnceLock::new();
  VAR_REFERENCE.get_or_init(|| Regex::new(r"var\(\s*--").expect("hardcoded pattern"))
}

/// Decides whether a declaration value is eligible for extraction.
#[derive(Debug)]
pub struct QualificationFilter {
  whitelist: Option<Regex>,
}

impl QualificationFilter {
  /// Compile the optional whitelist into a single alternation anchored
  /// inside `var(...)`, allowing leading whitespace after the parenthesis.
  /// Entries are treated as patterns and spliced in verbatim; an entry that
  /// breaks the compiled expression is reported as a malformed whitelist.
  pub fn new(whitelist: Option<&[String]>) -> Result<Self, ConfigError> {
    let whitelist = match whitelist {
      Some(names) if !names.is_empty() => {
        let pattern = format!(r"var\(\s*(?:{})\)", names.join("|"));
        Some(Regex::new(&pattern).map_err(|_| ConfigError::MalformedWhitelist)?)
      }
      _ => None,
    };
    Ok(Self { whitelist })
  }

  /// First test: does the value reference any custom property?
  pub fn references_custom_property(&self, value: &str) -> bool {
    var_reference().is_match(value)
  }

  /// Second test: does the value reference a whitelisted custom property?
  /// Always true when no whitelist is configured.
  pub fn matches_whitelist(&self, value: &str) -> bool {
    self
      .whitelist
      .as_ref()
      .map_or(true, |regex| regex.is_match(value))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_custom_property_references() {
    let filter = QualificationFilter::new(None).unwrap();
    assert!(filter.references_custom_property("var(--c1)"));
    assert!(filter.references_custom_property("var(  --c1)"));
    assert!(filter.references_custom_property("calc(var(--x) * 2)"));
    assert!(!filter.references_custom_property("12px"));
    assert!(!filter.references_custom_property("var(, --c1)"));
  }

  #[test]
  fn whitelist_limits_matches_to_named_properties() {
    let names = vec!["--c1".to_string(), "--m1".to_string()];
    let filter = QualificationFilter::new(Some(&names)).unwrap();
    assert!(filter.matches_whitelist("var(--c1)"));
    assert!(filter.matches_whitelist("var(  --m1)"));
    assert!(!filter.matches_whitelist("var(--other)"));
  }

  #[test]
  fn absent_whitelist_matches_everything() {
    let filter = QualificationFilter::new(None).unwrap();
    assert!(filter.matches_whitelist("var(--anything)"));
  }

  #[test]
  fn broken_whitelist_pattern_is_malformed() {
    let names = vec!["--c1(".to_string()];
    let error = QualificationFilter::new(Some(&names)).unwrap_err();
    assert!(matches!(error, ConfigError::MalformedWhitelist));
  }
}

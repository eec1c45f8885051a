//! Collects every declaration whose value references a custom property
//! (`var(--...)`) from a batch of stylesheets into one consolidated output
//! stylesheet, preserving selector and at-rule context and deduplicating
//! repeats across files. The result is written to every configured output
//! directory once the final input of the batch has been processed.

mod extractor;
mod extractor_config;
mod filter;
mod session;

pub use extractor::ReexportExtractorPlugin;
pub use extractor_config::{ConfigError, ExtractorConfig, RawExtractorConfig};
pub use filter::QualificationFilter;
pub use session::{ExtractionSession, FlushError};

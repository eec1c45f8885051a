//! Abstraction of the file system.
//!
//! Production code runs against [`OsFileSystem`]; tests run against
//! [`InMemoryFileSystem`] so nothing touches disk.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory file-system for testing
pub mod in_memory_file_system;

/// File-system implementation backed by std::fs
pub mod os_file_system;

pub use in_memory_file_system::InMemoryFileSystem;
pub use os_file_system::OsFileSystem;

/// FileSystem abstraction instance
///
/// This should be `OsFileSystem` for non-testing environments and
/// `InMemoryFileSystem` for testing.
pub type FileSystemRef = Arc<dyn FileSystem + Send + Sync>;

/// Trait abstracting file-system operations
pub trait FileSystem: std::fmt::Debug {
  fn cwd(&self) -> io::Result<PathBuf>;

  fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

  /// Create a directory and all of its missing parents
  fn create_dir_all(&self, path: &Path) -> io::Result<()>;

  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

  fn is_file(&self, path: &Path) -> bool;

  fn is_dir(&self, path: &Path) -> bool;
}

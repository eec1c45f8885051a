use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;

use crate::FileSystem;

/// In-memory implementation of a file-system entry
#[derive(Debug)]
enum InMemoryFileSystemEntry {
  File { contents: Vec<u8> },
  Directory,
}

/// In-memory implementation of the `FileSystem` trait, for testing purposes.
#[derive(Debug)]
pub struct InMemoryFileSystem {
  files: RwLock<HashMap<PathBuf, InMemoryFileSystemEntry>>,
  current_working_directory: RwLock<PathBuf>,
}

impl Default for InMemoryFileSystem {
  fn default() -> Self {
    Self {
      files: Default::default(),
      current_working_directory: RwLock::new(PathBuf::from("/")),
    }
  }
}

impl InMemoryFileSystem {
  /// Change the current working directory. Used for resolving relative paths.
  pub fn set_current_working_directory(&self, cwd: &Path) {
    let cwd = self.normalize(cwd);
    *self.current_working_directory.write() = cwd;
  }

  /// Convenience for seeding a file from a string in tests.
  pub fn write_file(&self, path: &Path, contents: String) {
    self.write(path, contents.as_bytes()).ok();
  }

  fn normalize(&self, path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.current_working_directory.read().join(path)
    };

    let mut result = PathBuf::new();
    for component in absolute.components() {
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
}

impl FileSystem for InMemoryFileSystem {
  fn cwd(&self) -> io::Result<PathBuf> {
    Ok(self.current_working_directory.read().clone())
  }

  fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
    Ok(self.normalize(path))
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    let path = self.normalize(path);
    let mut files = self.files.write();
    let mut dir = Some(path.as_path());
    while let Some(path) = dir {
      files.insert(path.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = path.parent();
    }
    Ok(())
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    let path = self.normalize(path);
    let files = self.files.read();
    match files.get(&path) {
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
      Some(InMemoryFileSystemEntry::File { contents }) => Ok(contents.clone()),
      Some(InMemoryFileSystemEntry::Directory) => Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      )),
    }
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let bytes = self.read(path)?;
    String::from_utf8(bytes).map_err(|_| io::Error::other("Unable to read file as string"))
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    let path = self.normalize(path);
    let mut files = self.files.write();

    files.insert(
      path.clone(),
      InMemoryFileSystemEntry::File {
        contents: contents.to_vec(),
      },
    );

    let mut dir = path.parent();
    while let Some(path) = dir {
      files.insert(path.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = path.parent();
    }

    Ok(())
  }

  fn is_file(&self, path: &Path) -> bool {
    let path = self.normalize(path);
    let files = self.files.read();
    matches!(files.get(&path), Some(InMemoryFileSystemEntry::File { .. }))
  }

  fn is_dir(&self, path: &Path) -> bool {
    let path = self.normalize(path);
    let files = self.files.read();
    matches!(files.get(&path), Some(InMemoryFileSystemEntry::Directory))
  }
}

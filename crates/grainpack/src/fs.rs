//! Filesystem access used during resolution
//!
//! Resolution only ever checks for existence, reads whole files and lists
//! flat directories, so that is all the trait asks for.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Read-only filesystem operations needed by the resolver and walker
pub trait FileSystem {
    /// Check whether a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Read a file's bytes
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// List the files directly inside `dir` whose name ends in `.<extension>`
    fn artifacts(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read_bytes(path)
    }

    fn artifacts(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        (**self).artifacts(dir, extension)
    }
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn artifacts(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            glob::Pattern::escape(extension)
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut found = Vec::new();
        for entry in entries {
            let path = entry.map_err(io::Error::from)?;
            if path.is_file() {
                found.push(path);
            }
        }

        Ok(found)
    }
}

/// In-memory filesystem that records every existence probe
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<PathBuf, Vec<u8>>,
    probes: Mutex<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file
    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Add a file, builder style
    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Paths passed to `exists`, in call order
    pub fn probes(&self) -> Vec<PathBuf> {
        self.probes.lock().clone()
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.probes.lock().push(path.to_path_buf());
        self.files.contains_key(path)
    }

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn artifacts(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        let suffix = format!(".{}", extension);

        Ok(self
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().ends_with(&suffix))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

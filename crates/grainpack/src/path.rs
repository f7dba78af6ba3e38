//! Artifact path resolution
//!
//! Finds the compiled artifact for an import by searching an ordered list of
//! roots. The first root that has the artifact wins, so project-local modules
//! shadow stdlib modules of the same name.

use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during path resolution
#[derive(Debug, Error)]
pub enum PathError {
    /// Listing a search root failed
    #[error("Failed to list search root {root}: {source}")]
    Listing {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ordered list of directories searched for artifacts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
}

impl SearchPath {
    /// Create an empty search path
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a search path from roots, in precedence order
    pub fn from_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut search_path = Self::new();
        for root in roots {
            search_path.push(root);
        }
        search_path
    }

    /// Search path for a source file: its own directory, then the include
    /// dirs in order, then the stdlib dir
    pub fn for_source(source: &Path, include_dirs: &[PathBuf], stdlib_dir: &Path) -> Self {
        let mut search_path = Self::new();
        match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => search_path.push(parent),
            // a bare file name lives in the working directory
            _ => search_path.push("."),
        }
        for dir in include_dirs {
            search_path.push(dir);
        }
        search_path.push(stdlib_dir);
        search_path
    }

    /// Append a root with the lowest precedence so far
    ///
    /// Empty roots and roots already present are ignored.
    pub fn push(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        if root.as_os_str().is_empty() || self.roots.contains(&root) {
            return;
        }
        self.roots.push(root);
    }

    /// Roots in precedence order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Number of roots
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether there are no roots
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// How the resolver looks for artifacts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolveStrategy {
    /// Check for `<root>/<name>.<ext>` in each root
    #[default]
    Probe,

    /// List each root once and look names up in the listing
    Index,
}

/// Artifact resolver over a search path
pub struct PathResolver {
    search_path: SearchPath,
    extension: String,
    strategy: ResolveStrategy,
    /// Listing per (root, subdirectory), filled lazily by the index strategy
    index: HashMap<(usize, PathBuf), HashMap<String, PathBuf>>,
}

impl PathResolver {
    /// Create a new resolver
    pub fn new(search_path: SearchPath, extension: impl Into<String>) -> Self {
        Self {
            search_path,
            extension: extension.into(),
            strategy: ResolveStrategy::Probe,
            index: HashMap::new(),
        }
    }

    /// Set the lookup strategy
    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The search path
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Artifact file name for an import
    pub fn artifact_file_name(&self, name: &str) -> String {
        format!("{}.{}", name, self.extension)
    }

    /// Resolve an import to the first matching artifact
    ///
    /// Returns `Ok(None)` when no root has the artifact; the caller decides
    /// whether that is fatal. Only the index strategy can fail, when a root
    /// cannot be listed.
    pub fn resolve<F: FileSystem>(
        &mut self,
        fs: &F,
        name: &str,
    ) -> Result<Option<PathBuf>, PathError> {
        let file_name = self.artifact_file_name(name);
        // Names like `stdlib-external/runtime` live below the root
        let relative = Path::new(&file_name);
        let subdir = relative.parent().unwrap_or(Path::new("")).to_path_buf();
        let leaf = relative
            .file_name()
            .map(|leaf| leaf.to_string_lossy().into_owned())
            .unwrap_or_default();

        for position in 0..self.search_path.roots.len() {
            let hit = match self.strategy {
                ResolveStrategy::Probe => {
                    let candidate = self.search_path.roots[position].join(&file_name);
                    debug!(import = name, path = %candidate.display(), "checking for import");
                    fs.exists(&candidate).then_some(candidate)
                }
                ResolveStrategy::Index => self.indexed(fs, position, &subdir)?.get(&leaf).cloned(),
            };

            if let Some(path) = hit {
                debug!(import = name, path = %path.display(), "resolved import");
                return Ok(Some(path));
            }
        }

        debug!(import = name, "unresolved import");
        Ok(None)
    }

    /// Listing of `subdir` under the root at `position`, read on first use
    fn indexed<F: FileSystem>(
        &mut self,
        fs: &F,
        position: usize,
        subdir: &Path,
    ) -> Result<&HashMap<String, PathBuf>, PathError> {
        let key = (position, subdir.to_path_buf());
        if !self.index.contains_key(&key) {
            let root = &self.search_path.roots[position];
            let dir = if subdir.as_os_str().is_empty() {
                root.clone()
            } else {
                root.join(subdir)
            };
            debug!(dir = %dir.display(), "indexing search root");

            let listing = fs
                .artifacts(&dir, &self.extension)
                .map_err(|source| PathError::Listing { root: dir.clone(), source })?
                .into_iter()
                .filter_map(|path| {
                    let file_name = path.file_name()?.to_string_lossy().into_owned();
                    Some((file_name, path))
                })
                .collect();
            self.index.insert(key.clone(), listing);
        }

        Ok(&self.index[&key])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryFileSystem, OsFileSystem};
    use std::fs;

    fn memfs() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file("/b/foo.gr.wasm", vec![2])
            .with_file("/c/foo.gr.wasm", vec![3])
            .with_file("/c/bar.gr.wasm", vec![4])
    }

    #[test]
    fn test_first_root_wins() {
        let memfs = memfs();
        let mut resolver =
            PathResolver::new(SearchPath::from_roots(["/a", "/b", "/c"]), "gr.wasm");

        let resolved = resolver.resolve(&memfs, "foo").unwrap();
        assert_eq!(resolved, Some(PathBuf::from("/b/foo.gr.wasm")));
        assert_eq!(
            memfs.probes(),
            vec![PathBuf::from("/a/foo.gr.wasm"), PathBuf::from("/b/foo.gr.wasm")]
        );
    }

    #[test]
    fn test_unresolved_is_none() {
        let memfs = memfs();
        let mut resolver = PathResolver::new(SearchPath::from_roots(["/a", "/b"]), "gr.wasm");

        assert_eq!(resolver.resolve(&memfs, "missing").unwrap(), None);
        assert_eq!(memfs.probes().len(), 2);
    }

    #[test]
    fn test_index_strategy_keeps_shadowing() {
        let memfs = memfs();
        let mut resolver = PathResolver::new(SearchPath::from_roots(["/a", "/b", "/c"]), "gr.wasm")
            .with_strategy(ResolveStrategy::Index);

        assert_eq!(
            resolver.resolve(&memfs, "foo").unwrap(),
            Some(PathBuf::from("/b/foo.gr.wasm"))
        );
        assert_eq!(
            resolver.resolve(&memfs, "bar").unwrap(),
            Some(PathBuf::from("/c/bar.gr.wasm"))
        );
        assert_eq!(resolver.resolve(&memfs, "baz").unwrap(), None);
        assert!(memfs.probes().is_empty());
    }

    #[test]
    fn test_nested_names_resolve_under_both_strategies() {
        let memfs = MemoryFileSystem::new()
            .with_file("/std/stdlib-external/runtime.gr.wasm", vec![1])
            .with_file("/lib/stdlib-external/runtime.gr.wasm", vec![2])
            .with_file("/std/lists.gr.wasm", vec![3]);

        for strategy in [ResolveStrategy::Probe, ResolveStrategy::Index] {
            let mut resolver =
                PathResolver::new(SearchPath::from_roots(["/lib", "/std"]), "gr.wasm")
                    .with_strategy(strategy);

            assert_eq!(
                resolver.resolve(&memfs, "stdlib-external/runtime").unwrap(),
                Some(PathBuf::from("/lib/stdlib-external/runtime.gr.wasm"))
            );
            assert_eq!(
                resolver.resolve(&memfs, "lists").unwrap(),
                Some(PathBuf::from("/std/lists.gr.wasm"))
            );
            assert_eq!(resolver.resolve(&memfs, "stdlib-external/missing").unwrap(), None);
        }
    }

    #[test]
    fn test_nested_names_resolve_on_disk() {
        let temp = tempfile::tempdir().unwrap();
        let stdlib = temp.path().join("stdlib");
        fs::create_dir_all(stdlib.join("stdlib-external")).unwrap();
        fs::write(stdlib.join("stdlib-external").join("runtime.gr.wasm"), [1u8]).unwrap();

        for strategy in [ResolveStrategy::Probe, ResolveStrategy::Index] {
            let mut resolver = PathResolver::new(SearchPath::from_roots([&stdlib]), "gr.wasm")
                .with_strategy(strategy);

            assert_eq!(
                resolver.resolve(&OsFileSystem, "stdlib-external/runtime").unwrap(),
                Some(stdlib.join("stdlib-external").join("runtime.gr.wasm"))
            );
        }
    }

    #[test]
    fn test_search_path_for_source() {
        let search_path = SearchPath::for_source(
            Path::new("/project/src/main.gr"),
            &[PathBuf::from("/project/lib"), PathBuf::from("/project/src")],
            Path::new("/grain/stdlib"),
        );

        assert_eq!(
            search_path.roots(),
            &[
                PathBuf::from("/project/src"),
                PathBuf::from("/project/lib"),
                PathBuf::from("/grain/stdlib"),
            ]
        );
    }

    #[test]
    fn test_search_path_bare_source_uses_working_dir() {
        let search_path = SearchPath::for_source(Path::new("main.gr"), &[], Path::new("/std"));

        assert_eq!(
            search_path.roots(),
            &[PathBuf::from("."), PathBuf::from("/std")]
        );
    }

    #[test]
    fn test_search_path_ignores_empty_roots() {
        let mut search_path = SearchPath::new();
        search_path.push("");
        search_path.push("/std");
        search_path.push("/std");

        assert_eq!(search_path.len(), 1);
        assert_eq!(search_path.roots(), &[PathBuf::from("/std")]);
    }

    #[test]
    fn test_resolve_on_disk() {
        let temp = tempfile::tempdir().unwrap();
        let local = temp.path().join("local");
        let stdlib = temp.path().join("stdlib");
        fs::create_dir_all(&local).unwrap();
        fs::create_dir_all(&stdlib).unwrap();
        fs::write(local.join("lists.gr.wasm"), [1u8]).unwrap();
        fs::write(stdlib.join("lists.gr.wasm"), [2u8]).unwrap();
        fs::write(stdlib.join("strings.gr.wasm"), [3u8]).unwrap();

        for strategy in [ResolveStrategy::Probe, ResolveStrategy::Index] {
            let mut resolver =
                PathResolver::new(SearchPath::from_roots([&local, &stdlib]), "gr.wasm")
                    .with_strategy(strategy);

            assert_eq!(
                resolver.resolve(&OsFileSystem, "lists").unwrap(),
                Some(local.join("lists.gr.wasm"))
            );
            assert_eq!(
                resolver.resolve(&OsFileSystem, "strings").unwrap(),
                Some(stdlib.join("strings.gr.wasm"))
            );
        }
    }
}

//! Dependency graph walking
//!
//! Starting from a root module, scans imports, resolves every external one to
//! an artifact on the search path, loads it, and repeats for the loaded
//! module until the whole transitive closure is loaded.

use crate::conventions::{Classification, ModuleConventions};
use crate::fs::FileSystem;
use crate::path::{PathError, PathResolver, ResolveStrategy, SearchPath};
use crate::scanner::{scan_imports, ScanError};
use indexmap::{set, IndexMap};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Name used for the root module in errors and logs
pub const ROOT_MODULE: &str = "<root>";

/// Errors that abort a walk
#[derive(Debug, Error)]
pub enum BundleError {
    /// A module could not be parsed
    #[error("Malformed module {module}: {source}")]
    MalformedModule {
        module: String,
        #[source]
        source: ScanError,
    },

    /// No search root has the artifact for an import
    #[error("Could not find required Grain import {0} for bundling")]
    UnresolvedImport(String),

    /// Reading a resolved artifact failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Listing a search root failed
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Paths read while resolving, in resolution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    paths: Vec<PathBuf>,
}

impl DependencyReport {
    /// Record a newly resolved artifact
    pub fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    /// Artifact paths in resolution order
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Source paths matching the artifacts (`foo.gr.wasm` becomes `foo.gr`)
    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .map(|path| match path.to_str().and_then(|s| s.strip_suffix(".wasm")) {
                Some(stripped) => PathBuf::from(stripped),
                None => path.clone(),
            })
            .collect()
    }

    /// Number of recorded paths
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing was read
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl IntoIterator for DependencyReport {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// Result of a completed walk
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Loaded modules keyed by qualified name, in resolution order
    pub modules: IndexMap<String, Vec<u8>>,

    /// Artifacts read to build `modules`
    pub report: DependencyReport,
}

/// A module whose imports are still being worked through
struct Frame {
    imports: set::IntoIter<String>,
}

/// Walks the import graph of a root module
pub struct DependencyWalker<F> {
    fs: F,
    conventions: ModuleConventions,
    strategy: ResolveStrategy,
}

impl<F: FileSystem> DependencyWalker<F> {
    /// Create a new walker
    pub fn new(fs: F, conventions: ModuleConventions) -> Self {
        Self {
            fs,
            conventions,
            strategy: ResolveStrategy::Probe,
        }
    }

    /// Set the artifact lookup strategy
    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Conventions used for scanning and classification
    pub fn conventions(&self) -> &ModuleConventions {
        &self.conventions
    }

    /// Load every module reachable from `root`
    ///
    /// Depth-first: a loaded module's imports are all handled before the next
    /// sibling import. A qualified name is loaded at most once, which is what
    /// stops cycles and diamonds from being walked again.
    pub fn walk(&self, root: &[u8], search_path: &SearchPath) -> Result<Resolution, BundleError> {
        let mut resolver = PathResolver::new(
            search_path.clone(),
            self.conventions.artifact_extension.as_str(),
        )
        .with_strategy(self.strategy);
        let mut resolution = Resolution::default();
        let mut stack = vec![self.frame(ROOT_MODULE, root)?];

        while let Some(frame) = stack.last_mut() {
            let Some(import) = frame.imports.next() else {
                stack.pop();
                continue;
            };

            let qualified = match self.conventions.classify(&import) {
                Classification::Runtime => {
                    debug!(import = import.as_str(), "skipping runtime import");
                    continue;
                }
                Classification::External(qualified) => qualified,
            };

            if resolution.modules.contains_key(&qualified) {
                continue;
            }

            debug!(
                import = import.as_str(),
                qualified = qualified.as_str(),
                "detected import"
            );

            let path = resolver
                .resolve(&self.fs, &import)?
                .ok_or_else(|| BundleError::UnresolvedImport(import.clone()))?;
            let bytes = self.fs.read_bytes(&path).map_err(|source| BundleError::Io {
                path: path.clone(),
                source,
            })?;

            let frame = self.frame(&qualified, &bytes)?;
            debug!(
                import = import.as_str(),
                qualified = qualified.as_str(),
                size = bytes.len(),
                "loaded import"
            );

            resolution.modules.insert(qualified, bytes);
            resolution.report.push(path);
            stack.push(frame);
        }

        Ok(resolution)
    }

    fn frame(&self, module: &str, wasm: &[u8]) -> Result<Frame, BundleError> {
        let imports = scan_imports(wasm, &self.conventions).map_err(|source| {
            BundleError::MalformedModule {
                module: module.to_string(),
                source,
            }
        })?;

        Ok(Frame {
            imports: imports.into_iter(),
        })
    }
}

//! Bundling entry point
//!
//! Walks the root module's dependencies and packs the result together with
//! the runtime shim.

use crate::conventions::ModuleConventions;
use crate::emitter::Bundle;
use crate::fs::{FileSystem, OsFileSystem};
use crate::path::{ResolveStrategy, SearchPath};
use crate::walker::{BundleError, DependencyReport, DependencyWalker, Resolution};
use tracing::info;

/// A finished bundle plus the paths read to build it
#[derive(Debug, Clone)]
pub struct BundleOutput {
    /// The bundle
    pub bundle: Bundle,

    /// Artifacts read during resolution
    pub report: DependencyReport,
}

/// Bundles root modules with their dependencies
pub struct Bundler<F> {
    walker: DependencyWalker<F>,
}

impl<F: FileSystem> Bundler<F> {
    /// Create a bundler reading from `fs`
    pub fn new(fs: F, conventions: ModuleConventions) -> Self {
        Self {
            walker: DependencyWalker::new(fs, conventions),
        }
    }

    /// Set the artifact lookup strategy
    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.walker = self.walker.with_strategy(strategy);
        self
    }

    /// Conventions used for scanning and classification
    pub fn conventions(&self) -> &ModuleConventions {
        self.walker.conventions()
    }

    /// Resolve the dependencies of `root` without bundling
    pub fn walk(&self, root: &[u8], search_path: &SearchPath) -> Result<Resolution, BundleError> {
        self.walker.walk(root, search_path)
    }

    /// Resolve the dependencies of `root` and bundle them with the shim
    ///
    /// Any error aborts the whole operation; no partial bundle is produced.
    pub fn bundle(
        &self,
        root: Vec<u8>,
        search_path: &SearchPath,
        shim: impl Into<String>,
    ) -> Result<BundleOutput, BundleError> {
        let Resolution { modules, report } = self.walker.walk(&root, search_path)?;

        info!(
            modules = modules.len(),
            root_size = root.len(),
            "bundled module with dependencies"
        );

        Ok(BundleOutput {
            bundle: Bundle::new(shim, modules, root),
            report,
        })
    }
}

impl Default for Bundler<OsFileSystem> {
    fn default() -> Self {
        Self::new(OsFileSystem, ModuleConventions::default())
    }
}

/// Bundle `root` from the real filesystem using the default conventions
pub fn bundle(
    root: Vec<u8>,
    search_path: &SearchPath,
    shim: impl Into<String>,
) -> Result<BundleOutput, BundleError> {
    Bundler::default().bundle(root, search_path, shim)
}

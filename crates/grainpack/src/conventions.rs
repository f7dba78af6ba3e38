//! Import naming conventions and classification
//!
//! Decides which import names are provided by the runtime and which must be
//! found on disk, and derives the name a resolved module is registered under.

use serde::{Deserialize, Serialize};

/// Marker the Grain compiler puts in front of module import namespaces
pub const MODULE_PREFIX: &str = "GRAIN$MODULE$";

/// Substring identifying externally distributed stdlib units
pub const STDLIB_MARKER: &str = "stdlib-external";

/// File extension of compiled Grain artifacts (without the leading dot)
pub const ARTIFACT_EXTENSION: &str = "gr.wasm";

/// Module names always supplied by the execution environment
pub const RUNTIME_MODULES: &[&str] = &["grainRuntime", "grainBuiltins", "console", "env"];

/// Outcome of classifying an import name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Supplied by the runtime, never resolved or bundled
    Runtime,

    /// Must be resolved from disk and registered under the qualified name
    External(String),
}

impl Classification {
    /// Qualified name for external imports
    pub fn qualified_name(&self) -> Option<&str> {
        match self {
            Classification::Runtime => None,
            Classification::External(name) => Some(name),
        }
    }
}

/// Naming rules shared by the scanner, classifier and resolver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleConventions {
    /// Prefix stripped from import namespaces and prepended to qualified names
    #[serde(default = "default_module_prefix")]
    pub module_prefix: String,

    /// Names containing this marker keep their name when registered
    #[serde(default = "default_stdlib_marker")]
    pub stdlib_marker: String,

    /// Names supplied by the runtime
    #[serde(default = "default_runtime_modules")]
    pub runtime_modules: Vec<String>,

    /// Extension of compiled artifacts on disk, without the leading dot
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,
}

fn default_module_prefix() -> String {
    MODULE_PREFIX.to_string()
}

fn default_stdlib_marker() -> String {
    STDLIB_MARKER.to_string()
}

fn default_runtime_modules() -> Vec<String> {
    RUNTIME_MODULES.iter().map(|name| name.to_string()).collect()
}

fn default_artifact_extension() -> String {
    ARTIFACT_EXTENSION.to_string()
}

impl Default for ModuleConventions {
    fn default() -> Self {
        Self {
            module_prefix: default_module_prefix(),
            stdlib_marker: default_stdlib_marker(),
            runtime_modules: default_runtime_modules(),
            artifact_extension: default_artifact_extension(),
        }
    }
}

impl ModuleConventions {
    /// Check whether a name is supplied by the runtime
    pub fn is_runtime(&self, name: &str) -> bool {
        self.runtime_modules.iter().any(|m| m == name)
    }

    /// Check whether a name denotes an external stdlib unit
    pub fn is_external_stdlib(&self, name: &str) -> bool {
        !self.stdlib_marker.is_empty() && name.contains(&self.stdlib_marker)
    }

    /// Classify an import name
    pub fn classify(&self, name: &str) -> Classification {
        if self.is_runtime(name) {
            return Classification::Runtime;
        }

        Classification::External(self.qualified_name(name))
    }

    /// Name a resolved module is registered under in a bundle
    ///
    /// Stdlib units pass through unchanged; everything else is namespaced
    /// with the module prefix.
    pub fn qualified_name(&self, name: &str) -> String {
        if self.is_external_stdlib(name) {
            name.to_string()
        } else {
            format!("{}{}", self.module_prefix, name)
        }
    }

    /// Strip the module prefix from a raw import namespace
    pub fn strip_prefix<'a>(&self, namespace: &'a str) -> &'a str {
        if self.module_prefix.is_empty() {
            return namespace;
        }
        namespace
            .strip_prefix(self.module_prefix.as_str())
            .unwrap_or(namespace)
    }
}

//! Bundler configuration (grainpack.toml)
//!
//! Provides the config file structure, discovery and the Grain installation
//! layout derived from `grain-home`.

use crate::conventions::ModuleConventions;
use crate::path::{ResolveStrategy, SearchPath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file
pub const CONFIG_FILE: &str = "grainpack.toml";

/// Compiler binary, relative to the Grain home
pub const BIN_LOOKUP_PATH: &str = "node_modules/.bin/grain";

/// Browser runtime shim, relative to the Grain home
pub const RUNTIME_LOOKUP_PATH: &str = "runtime/dist/grain-runtime-browser.js";

/// Stdlib artifacts, relative to the Grain home
pub const STDLIB_LOOKUP_PATH: &str = "stdlib";

/// Errors that can occur while loading a config
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Bundler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct GrainpackConfig {
    /// Grain installation directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain_home: Option<PathBuf>,

    /// Extra directories searched after the source's own directory
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Artifact lookup strategy
    #[serde(default)]
    pub resolve: ResolveStrategy,

    /// Import naming rules
    #[serde(default)]
    pub conventions: ModuleConventions,
}

impl GrainpackConfig {
    /// Parse a config from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: GrainpackConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, resolving relative paths against its directory
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;

        if let Some(base) = path.parent() {
            config.rebase(base);
        }

        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .include_dirs
            .iter()
            .any(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "include-dirs entries must not be empty".to_string(),
            ));
        }

        let extension = &self.conventions.artifact_extension;
        if extension.is_empty() {
            return Err(ConfigError::ValidationError(
                "artifact-extension must not be empty".to_string(),
            ));
        }
        if extension.starts_with('.') {
            return Err(ConfigError::ValidationError(format!(
                "artifact-extension must not start with '.': {}",
                extension
            )));
        }

        Ok(())
    }

    /// Make relative paths absolute against `base`
    pub fn rebase(&mut self, base: &Path) {
        if let Some(home) = self.grain_home.take() {
            self.grain_home = Some(base.join(home));
        }
        for dir in &mut self.include_dirs {
            *dir = base.join(&*dir);
        }
    }

    /// Grain installation layout
    pub fn grain_home(&self) -> Result<GrainHome, ConfigError> {
        self.grain_home
            .as_deref()
            .map(GrainHome::new)
            .ok_or_else(|| ConfigError::MissingField("grain-home".to_string()))
    }

    /// Search path for a source file
    pub fn search_path(&self, source: &Path) -> Result<SearchPath, ConfigError> {
        let home = self.grain_home()?;
        Ok(SearchPath::for_source(
            source,
            &self.include_dirs,
            &home.stdlib_dir(),
        ))
    }
}

/// Layout of a Grain installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrainHome {
    root: PathBuf,
}

impl GrainHome {
    /// Wrap a Grain home directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The Grain home directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `grain` compiler executable
    pub fn compiler(&self) -> PathBuf {
        self.root.join(BIN_LOOKUP_PATH)
    }

    /// The browser runtime shim
    pub fn runtime_shim(&self) -> PathBuf {
        self.root.join(RUNTIME_LOOKUP_PATH)
    }

    /// The stdlib artifact directory
    pub fn stdlib_dir(&self) -> PathBuf {
        self.root.join(STDLIB_LOOKUP_PATH)
    }
}

/// Find the nearest config file at or above `start_dir`
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }

        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_minimal_config() {
        let config = GrainpackConfig::from_str("grain-home = \"/opt/grain\"").unwrap();

        assert_eq!(config.grain_home, Some(PathBuf::from("/opt/grain")));
        assert!(config.include_dirs.is_empty());
        assert_eq!(config.resolve, ResolveStrategy::Probe);
        assert_eq!(config.conventions, ModuleConventions::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
grain-home = "/opt/grain"
include-dirs = ["lib", "vendor"]
resolve = "index"

[conventions]
module-prefix = "M$"
runtime-modules = ["host"]
"#;
        let config = GrainpackConfig::from_str(toml).unwrap();

        assert_eq!(config.include_dirs, vec![PathBuf::from("lib"), PathBuf::from("vendor")]);
        assert_eq!(config.resolve, ResolveStrategy::Index);
        assert_eq!(config.conventions.module_prefix, "M$");
        assert_eq!(config.conventions.runtime_modules, vec!["host".to_string()]);
        assert_eq!(config.conventions.stdlib_marker, "stdlib-external");
    }

    #[test]
    fn test_reject_unknown_strategy() {
        let result = GrainpackConfig::from_str("resolve = \"guess\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_reject_empty_include_dir() {
        let result = GrainpackConfig::from_str("include-dirs = [\"\"]");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_reject_dotted_extension() {
        let result =
            GrainpackConfig::from_str("[conventions]\nartifact-extension = \".gr.wasm\"");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_grain_home() {
        let config = GrainpackConfig::default();
        assert!(matches!(
            config.grain_home(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_grain_home_layout() {
        let home = GrainHome::new("/opt/grain");

        assert_eq!(home.compiler(), PathBuf::from("/opt/grain/node_modules/.bin/grain"));
        assert_eq!(
            home.runtime_shim(),
            PathBuf::from("/opt/grain/runtime/dist/grain-runtime-browser.js")
        );
        assert_eq!(home.stdlib_dir(), PathBuf::from("/opt/grain/stdlib"));
    }

    #[test]
    fn test_search_path_order() {
        let config = GrainpackConfig {
            grain_home: Some(PathBuf::from("/opt/grain")),
            include_dirs: vec![PathBuf::from("/project/lib")],
            ..Default::default()
        };

        let search_path = config.search_path(Path::new("/project/src/main.gr")).unwrap();
        assert_eq!(
            search_path.roots(),
            &[
                PathBuf::from("/project/src"),
                PathBuf::from("/project/lib"),
                PathBuf::from("/opt/grain/stdlib"),
            ]
        );
    }

    #[test]
    fn test_from_file_rebases_paths() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(
            root.join(CONFIG_FILE),
            "grain-home = \"grain\"\ninclude-dirs = [\"lib\", \"/abs\"]\n",
        )
        .unwrap();

        let config = GrainpackConfig::from_file(&root.join(CONFIG_FILE)).unwrap();

        assert_eq!(config.grain_home, Some(root.join("grain")));
        assert_eq!(config.include_dirs, vec![root.join("lib"), PathBuf::from("/abs")]);
    }

    #[test]
    fn test_find_config_walks_up() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();
        fs::write(root.join(CONFIG_FILE), "").unwrap();

        let nested = root.join("a").join("b").join("c");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(root.join(CONFIG_FILE)));
    }
}

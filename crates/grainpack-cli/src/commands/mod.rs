//! CLI command implementations.

pub mod bundle;
pub mod imports;
pub mod inspect;
pub mod resolve;

use anyhow::Context;
use clap::{Args, ValueEnum};
use grainpack::{find_config, Compiler, GrainCompiler, GrainHome, GrainpackConfig, ResolveStrategy};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bundle output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// CommonJS module embedding the runtime shim
    Js,
    /// Binary bundle container
    Binary,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Js => "js",
            OutputFormat::Binary => "grpk",
        }
    }
}

/// Artifact lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolveMode {
    /// Check each search root for the artifact file
    Probe,
    /// List each search root once
    Index,
}

impl From<ResolveMode> for ResolveStrategy {
    fn from(mode: ResolveMode) -> Self {
        match mode {
            ResolveMode::Probe => ResolveStrategy::Probe,
            ResolveMode::Index => ResolveStrategy::Index,
        }
    }
}

/// Flags layered over grainpack.toml
#[derive(Debug, Args)]
pub struct ConfigOverrides {
    /// Config file (defaults to the nearest grainpack.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Grain installation directory
    #[arg(long)]
    pub grain_home: Option<PathBuf>,

    /// Extra directory to search for compiled modules (repeatable)
    #[arg(short = 'I', long = "include")]
    pub include_dirs: Vec<PathBuf>,

    /// Artifact lookup strategy
    #[arg(long, value_enum)]
    pub resolve: Option<ResolveMode>,
}

/// Load the config for `source` and apply command-line overrides
pub fn load_config(source: &Path, overrides: &ConfigOverrides) -> anyhow::Result<GrainpackConfig> {
    let config_path = match &overrides.config {
        Some(path) => Some(path.clone()),
        None => find_config(source_dir(source)),
    };

    let mut config = match config_path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            GrainpackConfig::from_file(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => GrainpackConfig::default(),
    };

    if let Some(home) = &overrides.grain_home {
        config.grain_home = Some(home.clone());
    }
    config.include_dirs.extend(overrides.include_dirs.iter().cloned());
    if let Some(mode) = overrides.resolve {
        config.resolve = mode.into();
    }

    config.validate()?;
    Ok(config)
}

/// Bytes of the root module: read directly for `.wasm` inputs, compiled otherwise
pub fn load_root(source: &Path, home: &GrainHome) -> anyhow::Result<Vec<u8>> {
    if is_precompiled(source) {
        return std::fs::read(source)
            .with_context(|| format!("Failed to read {}", source.display()));
    }

    Ok(GrainCompiler::new(home.compiler()).compile(source)?)
}

fn is_precompiled(source: &Path) -> bool {
    source.extension().is_some_and(|ext| ext == "wasm")
}

fn source_dir(source: &Path) -> &Path {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Default output path: the source with `.wasm` dropped and the format's extension added
pub fn default_output(source: &Path, format: OutputFormat) -> PathBuf {
    let base = if is_precompiled(source) {
        source.with_extension("")
    } else {
        source.to_path_buf()
    };

    let mut name = base.into_os_string();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

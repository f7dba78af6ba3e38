//! Grainpack Library
//!
//! Bundles a compiled Grain WebAssembly module with every module it imports:
//! - Import scanning of WebAssembly binaries
//! - Classification of runtime-provided and external imports
//! - Artifact resolution over an ordered search path
//! - Depth-first dependency walking with duplicate and cycle suppression
//! - Binary and JavaScript bundle output
//! - Configuration (grainpack.toml) and compiler invocation

pub mod bundler;
pub mod compiler;
pub mod config;
pub mod conventions;
pub mod emitter;
pub mod fs;
pub mod js;
pub mod path;
pub mod scanner;
pub mod walker;

pub use bundler::{bundle, BundleOutput, Bundler};
pub use compiler::{CompileError, Compiler, GrainCompiler};
pub use config::{find_config, ConfigError, GrainHome, GrainpackConfig};
pub use conventions::{Classification, ModuleConventions};
pub use emitter::{Bundle, DecodeError, EncodeError};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use js::render_js;
pub use path::{PathError, PathResolver, ResolveStrategy, SearchPath};
pub use scanner::{scan_imports, ScanError};
pub use walker::{BundleError, DependencyReport, DependencyWalker, Resolution};

//! Compiler invocation
//!
//! Turning source into a module is the Grain compiler's job; this only runs
//! it and picks up the artifact it writes next to the source.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while compiling a source file
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler could not be started
    #[error("Failed to run compiler {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compiler exited unsuccessfully
    #[error("Compilation of {source_path} failed: {stderr}")]
    Failed { source_path: PathBuf, stderr: String },

    /// The compiled artifact could not be read
    #[error("Failed to read compiled module {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Something that turns a source file into module bytes
pub trait Compiler {
    /// Compile `source` and return the module bytes
    fn compile(&self, source: &Path) -> Result<Vec<u8>, CompileError>;
}

/// Runs `grain compile <source>` and reads `<source>.wasm`
#[derive(Debug, Clone)]
pub struct GrainCompiler {
    program: PathBuf,
}

impl GrainCompiler {
    /// Create a compiler using the given `grain` executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path of the `grain` executable
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Where the compiler writes the module for `source`
    pub fn output_path(source: &Path) -> PathBuf {
        let mut path = source.as_os_str().to_owned();
        path.push(".wasm");
        PathBuf::from(path)
    }
}

impl Compiler for GrainCompiler {
    fn compile(&self, source: &Path) -> Result<Vec<u8>, CompileError> {
        debug!(program = %self.program.display(), source = %source.display(), "compiling");

        let output = Command::new(&self.program)
            .arg("compile")
            .arg(source)
            .output()
            .map_err(|e| CompileError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(CompileError::Failed {
                source_path: source.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let path = Self::output_path(source);
        std::fs::read(&path).map_err(|e| CompileError::Output { path, source: e })
    }
}

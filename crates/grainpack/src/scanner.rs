//! Import scanning for compiled modules
//!
//! Walks the sections of a WebAssembly binary and collects the namespaces of
//! its import entries.

use crate::conventions::ModuleConventions;
use indexmap::IndexSet;
use thiserror::Error;
use wasmparser::{BinaryReaderError, Parser, Payload};

/// Errors that can occur while scanning a module
#[derive(Debug, Error)]
pub enum ScanError {
    /// Bytes are not a well-formed WebAssembly module
    #[error("Malformed module: {0}")]
    Malformed(#[from] BinaryReaderError),
}

/// Collect the distinct import namespaces of a module, in discovery order
///
/// Every import entry contributes its module field, whatever the imported
/// item's kind. The module prefix is stripped when present.
pub fn scan_imports(
    wasm: &[u8],
    conventions: &ModuleConventions,
) -> Result<IndexSet<String>, ScanError> {
    let mut imports = IndexSet::new();

    for payload in Parser::new(0).parse_all(wasm) {
        if let Payload::ImportSection(reader) = payload? {
            for import in reader {
                let import = import?;
                imports.insert(conventions.strip_prefix(import.module).to_string());
            }
        }
    }

    Ok(imports)
}

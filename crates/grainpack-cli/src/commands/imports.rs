//! `grainpack imports`: list the imports of a compiled module.

use crate::output::StyledOutput;
use anyhow::Context;
use grainpack::{find_config, scan_imports, Classification, GrainpackConfig};
use std::path::{Path, PathBuf};

pub fn execute(
    out: &mut StyledOutput,
    module: PathBuf,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config_path = config.or_else(|| find_config(module.parent().unwrap_or(Path::new("."))));
    let conventions = match config_path {
        Some(path) => {
            GrainpackConfig::from_file(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?
                .conventions
        }
        None => Default::default(),
    };

    let wasm = std::fs::read(&module)
        .with_context(|| format!("Failed to read {}", module.display()))?;
    let imports = scan_imports(&wasm, &conventions)
        .with_context(|| format!("Failed to scan {}", module.display()))?;

    for import in &imports {
        match conventions.classify(import) {
            Classification::Runtime => {
                out.plain(import);
                out.plain(" (runtime)");
            }
            Classification::External(qualified) => {
                out.info(import);
                out.plain(&format!(" -> {}", qualified));
            }
        }
        out.newline();
    }

    Ok(())
}

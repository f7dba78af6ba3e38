//! `grainpack resolve`: show how a program's imports resolve.

use super::{load_config, load_root, ConfigOverrides};
use crate::output::StyledOutput;
use grainpack::{Bundler, OsFileSystem};
use std::path::PathBuf;

pub fn execute(
    out: &mut StyledOutput,
    source: PathBuf,
    overrides: ConfigOverrides,
) -> anyhow::Result<()> {
    let config = load_config(&source, &overrides)?;
    let home = config.grain_home()?;
    let search_path = config.search_path(&source)?;
    let root = load_root(&source, &home)?;

    out.bold("Search path:");
    out.newline();
    for dir in search_path.roots() {
        out.plain(&format!("  {}", dir.display()));
        out.newline();
    }

    let resolution = Bundler::new(OsFileSystem, config.conventions.clone())
        .with_strategy(config.resolve)
        .walk(&root, &search_path)?;

    out.newline();
    if resolution.modules.is_empty() {
        out.warning("No external imports");
        out.newline();
        return Ok(());
    }

    out.bold("Modules:");
    out.newline();
    for ((name, bytes), path) in resolution
        .modules
        .iter()
        .zip(resolution.report.paths())
    {
        out.plain("  ");
        out.info(name);
        out.plain(&format!(" {} bytes <- {}", bytes.len(), path.display()));
        out.newline();
    }

    Ok(())
}

//! `grainpack inspect`: show the contents of a binary bundle.

use crate::output::StyledOutput;
use anyhow::Context;
use grainpack::Bundle;
use std::path::PathBuf;

pub fn execute(out: &mut StyledOutput, path: PathBuf) -> anyhow::Result<()> {
    let data =
        std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let bundle =
        Bundle::decode(&data).with_context(|| format!("Invalid bundle {}", path.display()))?;

    out.bold("Shim:");
    out.plain(&format!(" {} bytes", bundle.shim.len()));
    out.newline();

    out.bold("Root:");
    out.plain(&format!(" {} bytes", bundle.root.len()));
    out.newline();

    out.bold(&format!("Modules ({}):", bundle.modules.len()));
    out.newline();
    for (name, bytes) in &bundle.modules {
        out.plain("  ");
        out.info(name);
        out.plain(&format!(" {} bytes", bytes.len()));
        out.newline();
    }

    Ok(())
}

//! `grainpack bundle`: bundle a program with its dependencies.

use super::{default_output, load_config, load_root, ConfigOverrides, OutputFormat};
use crate::output::StyledOutput;
use anyhow::Context;
use grainpack::{render_js, Bundler, DependencyReport, OsFileSystem};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub fn execute(
    out: &mut StyledOutput,
    source: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    shim: Option<PathBuf>,
    dep_file: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> anyhow::Result<()> {
    let config = load_config(&source, &overrides)?;
    let home = config.grain_home()?;
    let search_path = config.search_path(&source)?;

    let root = load_root(&source, &home)?;

    let shim_path = shim.unwrap_or_else(|| home.runtime_shim());
    let shim_text = std::fs::read_to_string(&shim_path)
        .with_context(|| format!("Failed to read runtime shim {}", shim_path.display()))?;

    let result = Bundler::new(OsFileSystem, config.conventions.clone())
        .with_strategy(config.resolve)
        .bundle(root, &search_path, shim_text)?;

    let bytes = match format {
        OutputFormat::Js => render_js(&result.bundle).into_bytes(),
        OutputFormat::Binary => result.bundle.encode()?,
    };

    let output_path = output.unwrap_or_else(|| default_output(&source, format));
    std::fs::write(&output_path, &bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if let Some(dep_file) = dep_file {
        let rule = dep_rule(&output_path, &shim_path, &result.report);
        std::fs::write(&dep_file, rule)
            .with_context(|| format!("Failed to write {}", dep_file.display()))?;
    }

    out.success("Bundled ");
    out.bold(&source.display().to_string());
    out.plain(&format!(
        " ({} modules, {} bytes) -> {}",
        result.bundle.modules.len(),
        bytes.len(),
        output_path.display()
    ));
    out.newline();

    Ok(())
}

/// Makefile rule listing everything the bundle was built from
fn dep_rule(output: &Path, shim: &Path, report: &DependencyReport) -> String {
    let mut rule = format!("{}:", escape(output));
    let _ = write!(rule, " {}", escape(shim));
    for path in report.paths() {
        let _ = write!(rule, " {}", escape(path));
    }
    rule.push('\n');
    rule
}

fn escape(path: &Path) -> String {
    path.display().to_string().replace(' ', "\\ ")
}

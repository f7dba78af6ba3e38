//! Grainpack CLI
//!
//! Bundles a Grain program with every compiled module it imports into a
//! single JavaScript module or binary bundle.

mod commands;
mod output;

use clap::{ArgAction, Parser, Subcommand};
use commands::{bundle, imports, inspect, resolve, ConfigOverrides, OutputFormat, ResolveMode};
use output::{resolve_color_choice, StyledOutput};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grainpack")]
#[command(about = "Bundle compiled Grain modules with their dependencies", long_about = None)]
#[command(version)]
struct Cli {
    /// Colored output (auto, always, never)
    #[arg(long, global = true)]
    color: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file and bundle it with its dependencies
    Bundle {
        /// Grain source file, or an already compiled .wasm module
        source: PathBuf,
        /// Output file (defaults next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "js")]
        format: OutputFormat,
        /// Runtime shim to embed instead of the Grain home one
        #[arg(long)]
        shim: Option<PathBuf>,
        /// Write a Makefile-style dependency file
        #[arg(long)]
        dep_file: Option<PathBuf>,
        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// List the imports of a compiled module
    Imports {
        /// Compiled .wasm module
        module: PathBuf,
        /// Config file (defaults to the nearest grainpack.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Resolve the dependencies of a module without bundling
    Resolve {
        /// Grain source file, or an already compiled .wasm module
        source: PathBuf,
        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Show the contents of a binary bundle
    Inspect {
        /// Bundle file
        bundle: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "grainpack=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("GRAINPACK_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands, out: &mut StyledOutput) -> anyhow::Result<()> {
    match command {
        Commands::Bundle {
            source,
            output,
            format,
            shim,
            dep_file,
            overrides,
        } => bundle::execute(out, source, output, format, shim, dep_file, overrides),

        Commands::Imports { module, config } => imports::execute(out, module, config),

        Commands::Resolve { source, overrides } => resolve::execute(out, source, overrides),

        Commands::Inspect { bundle } => inspect::execute(out, bundle),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut out = StyledOutput::new(resolve_color_choice(cli.color.as_deref()));
    if let Err(err) = run(cli.command, &mut out) {
        out.stderr_error(&format!("error: {:#}\n", err));
        std::process::exit(1);
    }
}

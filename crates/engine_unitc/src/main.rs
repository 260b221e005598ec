//! # engine_unitc - unit resource compiler
//!
//! Compiles one or more unit sources into a single unit resource. Several
//! units on one command line become consecutive units of the same resource,
//! which is how a level is baked.
//!
//! ```text
//! engine_unitc --source-dir data --output level.unit_resource units/hero units/crate
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_unit::encoders::register_builtin_components;
use engine_unit::{CompilerConfig, ComponentTypeRegistry, DirectorySource, UnitCompiler};

#[derive(Parser)]
#[command(name = "engine_unitc", about = "Compile unit sources into a unit resource")]
struct Args {
    /// Root of the source tree; unit `name` is read from `<dir>/<name>.unit`
    #[arg(short, long, default_value = ".")]
    source_dir: PathBuf,

    /// Where to write the compiled resource
    #[arg(short, long)]
    output: PathBuf,

    /// Maximum number of documents in a prefab chain
    #[arg(long, default_value_t = engine_unit::config::DEFAULT_MAX_PREFAB_DEPTH)]
    max_prefab_depth: usize,

    /// Unit names, relative to the source directory and without extension
    #[arg(required = true)]
    units: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_unitc=info".parse()?))
        .init();

    let args = Args::parse();
    info!(dir = %args.source_dir.display(), units = args.units.len(), "compiling units");

    let mut registry = ComponentTypeRegistry::new();
    register_builtin_components(&mut registry);

    let source = DirectorySource::new(&args.source_dir);
    let config = CompilerConfig::new().with_max_prefab_depth(args.max_prefab_depth);
    let mut compiler = UnitCompiler::new(&registry, &source, config);

    for unit in &args.units {
        compiler.compile_unit_path(unit)?;
    }

    let blob = compiler.finalize();
    std::fs::write(&args.output, &blob)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        units = compiler.num_units(),
        bytes = blob.len(),
        "unit resource written"
    );
    Ok(())
}

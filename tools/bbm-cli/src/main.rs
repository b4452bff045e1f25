//! bbm - BBM mesh container tool
//!
//! Converts OBJ/PLY/STL meshes into `.bbm` containers and inspects the
//! results. All format logic lives in the `bbm` crate; this binary only
//! wires arguments, directory enumeration, and the manifest sidecar.
//!
//! # Commands
//!
//! - `bbm convert model.obj -c 3` - encode one mesh with zstd
//! - `bbm convert models/ -o pack.bbm --manifest` - encode a folder
//! - `bbm list pack.bbm` - walk a container's entries
//! - `bbm extract pack.bbm -i 2 -o model.obj` - decode one entry

mod convert;
mod inspect;
mod manifest;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// BBM mesh container tool
#[derive(Parser)]
#[command(name = "bbm")]
#[command(about = "Convert OBJ/PLY/STL meshes into BBM containers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a mesh file or a directory of mesh files into a container
    Convert(convert::ConvertArgs),

    /// List the entries of a container
    List(inspect::ListArgs),

    /// Decode one entry and optionally dump it as OBJ
    Extract(inspect::ExtractArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(args) => convert::run(args),
        Commands::List(args) => inspect::list(args),
        Commands::Extract(args) => inspect::extract(args),
    }
}

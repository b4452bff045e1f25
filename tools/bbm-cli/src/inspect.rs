//! `bbm list` and `bbm extract` - container inspection

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bbm::{Encryption, EncryptionSpec};
use clap::Args;

#[derive(Args)]
pub struct ListArgs {
    /// Container to walk
    pub container: PathBuf,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Container to read
    pub container: PathBuf,

    /// Entry index; out-of-range values fall back to entry 0
    #[arg(short, long, default_value_t = 0)]
    pub index: usize,

    /// Encryption scheme used at encode time (aes, xor, chacha, blowfish)
    #[arg(long, value_name = "SCHEME")]
    pub encrypt: Option<String>,

    /// Encryption key, required with --encrypt
    #[arg(long, requires = "encrypt")]
    pub key: Option<String>,

    /// Write the decoded mesh as an OBJ file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn list(args: ListArgs) -> Result<()> {
    let bytes = fs::read(&args.container)
        .with_context(|| format!("Failed to read {:?}", args.container))?;

    println!("{:>3}  {:<16} {:>5}  {:>10} {:>10}  {:>6}  {:>12} {:>12}",
        "#", "name", "kind", "vertices", "faces", "comp", "vertex bytes", "face bytes");

    let mut total = 0usize;
    for item in bbm::entries(&bytes) {
        let info = item.with_context(|| format!("Failed to walk {:?}", args.container))?;
        println!(
            "{:>3}  {:<16} {:>5}  {:>10} {:>10}  {:>6}  {:>12} {:>12}",
            info.index,
            info.name,
            info.source_kind()
                .map(|k| k.as_str())
                .unwrap_or("?"),
            info.vertex_count,
            info.face_count,
            info.compression,
            info.vertex_len,
            info.face_len
        );
        total += 1;
    }
    println!("{total} entries");

    Ok(())
}

pub fn extract(args: ExtractArgs) -> Result<()> {
    let bytes = fs::read(&args.container)
        .with_context(|| format!("Failed to read {:?}", args.container))?;

    let encryption = match &args.encrypt {
        Some(scheme) => Some(EncryptionSpec {
            scheme: Encryption::from_name(scheme)?,
            key: args.key.clone().context("--encrypt requires --key")?,
        }),
        None => None,
    };

    let (mesh, info) = bbm::decode_at(&bytes, args.index, encryption.as_ref())
        .with_context(|| format!("Failed to decode entry {} of {:?}", args.index, args.container))?;

    println!(
        "Entry {} ({}): {} vertices, {} faces, source {}, compression {}",
        info.index,
        info.name,
        mesh.vertices.len(),
        mesh.faces.len(),
        info.source_kind().map(|k| k.as_str()).unwrap_or("?"),
        info.compression
    );

    if let Some(output) = &args.output {
        write_obj(output, &mesh)
            .with_context(|| format!("Failed to write {output:?}"))?;
        println!("Wrote {}", output.display());
    }

    Ok(())
}

/// Dump a decoded mesh as OBJ (1-based indices)
fn write_obj(path: &std::path::Path, mesh: &bbm::Mesh) -> Result<()> {
    let mut out = std::io::BufWriter::new(fs::File::create(path)?);
    for v in &mesh.vertices {
        writeln!(out, "v {} {} {}", v[0], v[1], v[2])?;
    }
    for f in &mesh.faces {
        writeln!(out, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
    }
    Ok(())
}

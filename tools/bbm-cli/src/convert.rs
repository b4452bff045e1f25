//! `bbm convert` - encode meshes into a container

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bbm::{BBM_EXTENSION, CodecSpec, Compression, Encryption, EncryptionSpec, Model};
use clap::Args;
use walkdir::WalkDir;

use crate::manifest;

#[derive(Args)]
pub struct ConvertArgs {
    /// Input mesh file (OBJ/PLY/STL) or a directory of mesh files
    pub input: PathBuf,

    /// Output .bbm container (defaults to the input name with .bbm)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compression mode: 0=none 1=bz2 2=lz4 3=zstd 4=zlib 5=lzma
    #[arg(short, long, default_value_t = 0)]
    pub compression: u16,

    /// Encryption scheme (aes, xor, chacha, blowfish)
    #[arg(long, value_name = "SCHEME")]
    pub encrypt: Option<String>,

    /// Encryption key, required with --encrypt
    #[arg(long, requires = "encrypt")]
    pub key: Option<String>,

    /// Write a JSON manifest next to the container
    #[arg(long)]
    pub manifest: bool,
}

pub fn run(args: ConvertArgs) -> Result<()> {
    let spec = build_spec(&args)?;

    let models = if args.input.is_dir() {
        collect_directory(&args.input)?
    } else {
        vec![
            bbm::convert_file(&args.input)
                .with_context(|| format!("Failed to convert {:?}", args.input))?,
        ]
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));

    let bytes = bbm::write_container(&output, &models, &spec)
        .with_context(|| format!("Failed to write container {output:?}"))?;

    for (ordinal, model) in models.iter().enumerate() {
        println!(
            "Model #{} ({}): {} vertices, {} faces -> {}",
            ordinal + 1,
            model.name,
            model.mesh.vertices.len(),
            model.mesh.faces.len(),
            output.display()
        );
    }
    println!(
        "Wrote {} ({} entries, {} bytes, compression {})",
        output.display(),
        models.len(),
        bytes.len(),
        spec.compression.as_str()
    );

    if args.manifest {
        let manifest_path = output.with_extension("json");
        manifest::write_manifest(&manifest_path, &bytes)
            .with_context(|| format!("Failed to write manifest {manifest_path:?}"))?;
        println!("Wrote {}", manifest_path.display());
    }

    Ok(())
}

fn build_spec(args: &ConvertArgs) -> Result<CodecSpec> {
    // Unknown compression integers pass data through unchanged on encode
    let compression = Compression::from_code_lossy(args.compression);
    if compression.code() != args.compression {
        tracing::warn!(
            "unknown compression mode {}, storing uncompressed",
            args.compression
        );
    }

    let encryption = match &args.encrypt {
        Some(scheme) => {
            let scheme = Encryption::from_name(scheme)?;
            let key = args
                .key
                .clone()
                .context("--encrypt requires --key")?;
            Some(EncryptionSpec { scheme, key })
        }
        None => None,
    };

    Ok(CodecSpec {
        compression,
        encryption,
    })
}

/// Enumerate a directory's mesh files (non-recursive, sorted by name) and
/// convert each one. A file that fails to convert is reported and skipped;
/// it never aborts the rest of the batch.
fn collect_directory(dir: &Path) -> Result<Vec<Model>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_mesh_extension(p))
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("no .obj/.ply/.stl files in {dir:?}");
    }

    let mut models = Vec::with_capacity(paths.len());
    let mut failed = 0usize;
    for path in &paths {
        match bbm::convert_file(path) {
            Ok(model) => models.push(model),
            Err(e) => {
                failed += 1;
                tracing::error!("Skipping {:?}: {}", path, e);
            }
        }
    }

    if models.is_empty() {
        bail!("all {failed} candidate files in {dir:?} failed to convert");
    }
    if failed > 0 {
        tracing::warn!("{} of {} files skipped", failed, paths.len());
    }

    Ok(models)
}

fn has_mesh_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            e == "obj" || e == "ply" || e == "stl"
        })
        .unwrap_or(false)
}

fn default_output(input: &Path) -> PathBuf {
    if input.is_dir() {
        // "models/" becomes "models.bbm" next to the directory
        let stem = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        input.with_file_name(format!("{stem}.{BBM_EXTENSION}"))
    } else {
        input.with_extension(BBM_EXTENSION)
    }
}

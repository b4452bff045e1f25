//! JSON manifest sidecar
//!
//! One record per container entry, written for the consumer's bookkeeping
//! only; nothing here is needed to decode the container.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

/// One manifest record, mirroring an entry header
#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub model_id: String,
    pub source_kind: String,
    pub vertex_count: u32,
    pub face_count: u32,
    pub compression: u16,
    pub total_models: u16,
    pub model_number: u16,
    pub vertex_payload_len: u64,
    pub face_payload_len: u64,
}

/// Walk the encoded container and write one record per entry
pub fn write_manifest(path: &Path, container: &[u8]) -> Result<Vec<ManifestEntry>> {
    let mut records = Vec::new();
    for item in bbm::entries(container) {
        let info = item?;
        records.push(ManifestEntry {
            model_id: info.name.clone(),
            source_kind: info
                .source_kind()
                .map(|k| k.as_str().to_string())
                .unwrap_or_else(|| format!("unknown({})", info.kind)),
            vertex_count: info.vertex_count,
            face_count: info.face_count,
            compression: info.compression,
            total_models: info.entry_count,
            model_number: info.index as u16 + 1,
            vertex_payload_len: info.vertex_len,
            face_payload_len: info.face_len,
        });
    }

    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records)?;
    Ok(records)
}

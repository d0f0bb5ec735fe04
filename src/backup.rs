use crate::loader;
use crate::model::Dataset;
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DATASET_ENTRY: &str = "data/dataset.json";
pub const SNAPSHOT_FORMAT_V1: &str = "batchbook-snapshot-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub format: String,
    pub entry_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub format: String,
    pub dataset: Dataset,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn export_snapshot(ds: &Dataset, out_path: &Path) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }

    let payload = serde_json::to_vec_pretty(ds).context("failed to serialize dataset")?;
    let checksum = sha256_hex(&payload);

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": SNAPSHOT_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "datasetSha256": checksum,
        "counts": {
            "students": ds.students.len(),
            "batches": ds.batches.len(),
            "attendance": ds.attendance.len(),
            "tests": ds.tests.len(),
            "testResults": ds.test_results.len(),
            "notifications": ds.notifications.len(),
        },
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DATASET_ENTRY, opts)
        .context("failed to start dataset entry")?;
    zip.write_all(&payload)
        .context("failed to write dataset entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        format: SNAPSHOT_FORMAT_V1.to_string(),
        entry_count: 2,
        sha256: checksum,
    })
}

/// Reads and verifies a snapshot. The caller decides whether to install it.
pub fn import_snapshot(in_path: &Path) -> anyhow::Result<ImportSummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != SNAPSHOT_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let expected = manifest
        .get("datasetSha256")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("manifest missing datasetSha256"))?
        .to_string();

    let mut payload = Vec::new();
    archive
        .by_name(DATASET_ENTRY)
        .context("bundle missing data/dataset.json")?
        .read_to_end(&mut payload)
        .context("failed to extract dataset entry")?;

    let actual = sha256_hex(&payload);
    if actual != expected {
        return Err(anyhow!(
            "dataset checksum mismatch: manifest {}, bundle {}",
            expected,
            actual
        ));
    }

    let text = std::str::from_utf8(&payload).context("dataset entry is not UTF-8")?;
    let dataset = loader::parse_dataset(text).context("dataset entry failed validation")?;

    Ok(ImportSummary {
        format: SNAPSHOT_FORMAT_V1.to_string(),
        dataset,
    })
}

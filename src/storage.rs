use anyhow::{Context, Result};
use phenomatch_core::{catalog, Catalog, DecodeReport};
use std::path::Path;

/// Read and decode the persisted catalog. Structural problems fail the load;
/// undecodable embeddings are left out and listed in the report.
pub fn load_catalog(path: &Path) -> Result<(Catalog, DecodeReport)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let (catalog, report) =
        catalog::decode_str(&raw).with_context(|| format!("decoding catalog {}", path.display()))?;
    log::info!(
        "Loaded {} groups ({} entries) from {}",
        catalog.groups.len(),
        catalog.entry_count(),
        path.display()
    );
    if !report.is_clean() {
        log::warn!("{} embedding(s) could not be decoded", report.issues.len());
    }
    Ok((catalog, report))
}

pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string(&catalog.to_payload())?;
    std::fs::write(path, data).with_context(|| format!("writing catalog {}", path.display()))?;
    Ok(())
}

use anyhow::{Context, Result};
use std::path::Path;
use storysync_model::{AnnotatedRecord, MergedSession};

/// Load a snapshot: a JSON array of records with optional annotations.
pub fn load_records(path: &Path) -> Result<Vec<AnnotatedRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let records: Vec<AnnotatedRecord> =
        serde_json::from_str(&raw).with_context(|| format!("parsing snapshot {}", path.display()))?;
    log::info!("loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Write a snapshot back out, pretty-printed for diffability.
pub fn save_records(path: &Path, records: &[AnnotatedRecord]) -> Result<()> {
    let raw = serde_json::to_string_pretty(records).context("serializing snapshot")?;
    std::fs::write(path, raw).with_context(|| format!("writing snapshot {}", path.display()))?;
    log::info!("saved {} record(s) to {}", records.len(), path.display());
    Ok(())
}

pub fn save_sessions(path: &Path, sessions: &[MergedSession]) -> Result<()> {
    let raw = serde_json::to_string_pretty(sessions).context("serializing sessions")?;
    std::fs::write(path, raw).with_context(|| format!("writing sessions {}", path.display()))?;
    log::info!("saved {} session(s) to {}", sessions.len(), path.display());
    Ok(())
}

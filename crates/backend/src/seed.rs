use cimes_shared::models::ReportCreation;
use std::path::Path;

use crate::routes;
use crate::storage::Storage;

/// Read a JSON array of report creation bodies.
pub fn load(seed_path: &Path) -> Result<Vec<ReportCreation>, String> {
    let data = std::fs::read_to_string(seed_path)
        .map_err(|e| format!("Failed to read {}: {}", seed_path.display(), e))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse {}: {}", seed_path.display(), e))
}

/// Insert the seeds only when the store holds no report yet. Returns how many were added.
pub fn apply_if_empty(storage: &Storage, seeds: Vec<ReportCreation>) -> Result<usize, String> {
    if storage.count_reports()? > 0 {
        return Ok(0);
    }

    let mut added = 0;
    for creation in seeds {
        let title = creation.title.clone();
        match routes::new_report(creation) {
            Ok(report) => {
                storage.save_report(&report)?;
                added += 1;
            }
            Err(e) => tracing::warn!(title = %title, detail = %e.detail, "Skipping invalid seed report"),
        }
    }

    tracing::info!(reports = added, "Seeded report store");
    Ok(added)
}

use cimes_shared::geo::BoundingBox;
use cimes_shared::models::Report;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

const REPORTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("reports");

pub struct Storage {
    db: Database,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, String> {
        let db = Database::create(path)
            .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;

        // Ensure table exists
        let write_txn = db.begin_write().map_err(|e| e.to_string())?;
        {
            write_txn
                .open_table(REPORTS_TABLE)
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;

        Ok(Arc::new(Storage { db }))
    }

    pub fn save_report(&self, report: &Report) -> Result<(), String> {
        let json = serde_json::to_vec(report).map_err(|e| e.to_string())?;
        let id_str = report.id.to_string();

        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = write_txn
                .open_table(REPORTS_TABLE)
                .map_err(|e| e.to_string())?;
            table
                .insert(id_str.as_str(), json.as_slice())
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn get_report(&self, id: &Uuid) -> Result<Option<Report>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(REPORTS_TABLE)
            .map_err(|e| e.to_string())?;

        let id_str = id.to_string();
        match table.get(id_str.as_str()).map_err(|e| e.to_string())? {
            Some(value) => {
                let report: Report =
                    serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
                Ok(Some(report))
            }
            None => Ok(None),
        }
    }

    /// All reports, or only those inside `area` when given. Ordered by id.
    pub fn list_reports(&self, area: Option<&BoundingBox>) -> Result<Vec<Report>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(REPORTS_TABLE)
            .map_err(|e| e.to_string())?;

        let mut reports = Vec::new();
        for entry in table.iter().map_err(|e| e.to_string())? {
            let (_, value) = entry.map_err(|e| e.to_string())?;
            let report: Report =
                serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
            if area.is_none_or(|bbox| bbox.contains(report.coordinate())) {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    pub fn count_reports(&self) -> Result<u64, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(REPORTS_TABLE)
            .map_err(|e| e.to_string())?;
        table.len().map_err(|e| e.to_string())
    }

    pub fn delete_report(&self, id: &Uuid) -> Result<bool, String> {
        let id_str = id.to_string();
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let removed = {
            let mut table = write_txn
                .open_table(REPORTS_TABLE)
                .map_err(|e| e.to_string())?;
            let result = table.remove(id_str.as_str()).map_err(|e| e.to_string())?;
            result.is_some()
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(removed)
    }
}

//! Audit logger for the append-only audit log
//!
//! Each entry is written as a single JSON line and flushed immediately. A
//! logger without a path keeps entries in memory.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{LaplataError, LaplataResult};

use super::entry::AuditEntry;

enum Sink {
    File(PathBuf),
    Memory(Mutex<Vec<AuditEntry>>),
}

/// Writes audit entries
pub struct AuditLogger {
    sink: Sink,
}

impl AuditLogger {
    /// Log to a JSONL file at `log_path`
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            sink: Sink::File(log_path),
        }
    }

    /// Keep entries in memory only
    pub fn in_memory() -> Self {
        Self {
            sink: Sink::Memory(Mutex::new(Vec::new())),
        }
    }

    /// Append an entry
    pub fn log(&self, entry: &AuditEntry) -> LaplataResult<()> {
        match &self.sink {
            Sink::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| LaplataError::Io(format!("Failed to open audit log: {}", e)))?;

                let json = serde_json::to_string(entry).map_err(|e| {
                    LaplataError::Json(format!("Failed to serialize audit entry: {}", e))
                })?;

                writeln!(file, "{}", json)
                    .map_err(|e| LaplataError::Io(format!("Failed to write audit entry: {}", e)))?;

                file.flush()
                    .map_err(|e| LaplataError::Io(format!("Failed to flush audit log: {}", e)))?;
            }
            Sink::Memory(entries) => match entries.lock() {
                Ok(mut guard) => guard.push(entry.clone()),
                Err(poisoned) => poisoned.into_inner().push(entry.clone()),
            },
        }
        Ok(())
    }

    /// Read all entries, oldest first
    pub fn read_all(&self) -> LaplataResult<Vec<AuditEntry>> {
        let path = match &self.sink {
            Sink::File(path) => path,
            Sink::Memory(entries) => {
                return Ok(match entries.lock() {
                    Ok(guard) => guard.clone(),
                    Err(poisoned) => poisoned.into_inner().clone(),
                })
            }
        };

        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)
            .map_err(|e| LaplataError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                LaplataError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                LaplataError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// The most recent `count` entries, oldest first
    pub fn read_recent(&self, count: usize) -> LaplataResult<Vec<AuditEntry>> {
        let mut all = self.read_all()?;
        let start = all.len().saturating_sub(count);
        Ok(all.split_off(start))
    }

    /// Log file location, if file-backed
    pub fn path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::File(path) => Some(path),
            Sink::Memory(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{EntityType, Operation};
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(i: usize) -> AuditEntry {
        AuditEntry::create(
            EntityType::Expense,
            format!("txn-{}", i),
            None,
            &json!({ "amount": i }),
        )
    }

    #[test]
    fn test_log_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));

        logger.log(&entry(1)).unwrap();

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[0].entity_type, EntityType::Expense);
    }

    #[test]
    fn test_read_recent() {
        let logger = AuditLogger::in_memory();
        for i in 0..10 {
            logger.log(&entry(i)).unwrap();
        }

        let recent = logger.read_recent(3).unwrap();
        let ids: Vec<&str> = recent.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["txn-7", "txn-8", "txn-9"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        assert!(logger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("audit.log");
        AuditLogger::new(path.clone()).log(&entry(1)).unwrap();

        let reopened = AuditLogger::new(path);
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }
}

//! CSV delivery log

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use csv::WriterBuilder;
use tracing::debug;

use crate::domain::campaigns::{DeliveryLog, DeliveryLogError, DeliveryResult};

/// Column header, written once when the file is created
pub const HEADER: [&str; 6] = ["nome", "email", "assunto", "status", "erro", "data"];

/// Append-only UTF-8 CSV file of delivery records
#[derive(Debug)]
pub struct CsvDeliveryLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvDeliveryLog {
    /// Creates a log writing to `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The file this log appends to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeliveryLog for CsvDeliveryLog {
    fn append(&self, result: &DeliveryResult) -> Result<(), DeliveryLogError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let is_new = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if is_new {
            debug!(path = %self.path.display(), "creating delivery log");
            writer.write_record(HEADER)?;
        }

        writer.serialize(result)?;
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::campaigns::{DeliveryOutcome, DeliveryStatus, Recipient};

    use super::*;

    fn result(email: &str, outcome: DeliveryOutcome) -> DeliveryResult {
        DeliveryResult::new(&Recipient::new(email, "Teste"), "Assunto de Teste", outcome)
    }

    #[test]
    fn test_first_append_writes_header() -> TestResult {
        let dir = tempfile::tempdir()?;
        let log = CsvDeliveryLog::new(dir.path().join("test_log.csv"));

        log.append(&result("teste@exemplo.com", DeliveryOutcome::Sent))?;

        let contents = std::fs::read_to_string(log.path())?;
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "nome,email,assunto,status,erro,data");
        assert!(lines[1].starts_with("Teste,teste@exemplo.com,Assunto de Teste,sent,,"));

        Ok(())
    }

    #[test]
    fn test_existing_file_is_appended_to() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("test_log.csv");

        CsvDeliveryLog::new(&path).append(&result("a@exemplo.com", DeliveryOutcome::Sent))?;
        CsvDeliveryLog::new(&path).append(&result("b@exemplo.com", DeliveryOutcome::Sent))?;

        let contents = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("a@exemplo.com"));
        assert!(lines[2].contains("b@exemplo.com"));

        Ok(())
    }

    #[test]
    fn test_records_read_back() -> TestResult {
        let dir = tempfile::tempdir()?;
        let log = CsvDeliveryLog::new(dir.path().join("test_log.csv"));

        let failed = DeliveryResult::new(
            &Recipient::new("ana@x.com", "Ana, \"a\" Silva"),
            "Olá, Ana ✉️",
            DeliveryOutcome::Failed {
                detail: "message was rejected: 550 no such user".to_string(),
            },
        );
        let dry_run = result(
            "bia@x.com",
            DeliveryOutcome::Skipped {
                reason: "dry run".to_string(),
            },
        );

        log.append(&failed)?;
        log.append(&dry_run)?;

        let mut reader = csv::Reader::from_path(log.path())?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<DeliveryResult>, _>>()?;

        assert_eq!(records, vec![failed, dry_run]);
        assert_eq!(records[1].status, DeliveryStatus::DryRun);
        assert_eq!(records[1].error, None);

        Ok(())
    }
}

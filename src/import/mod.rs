//! Bulk student import from CSV
//!
//! Expects a header row naming `dni`, `nombre`, `apellido` and
//! `passwordtemporal` (any order, any case). Quoted fields may contain
//! commas and newlines. Rows are upserted one by one; a bad row is
//! counted and skipped, it never aborts the batch.

use bcrypt::hash;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use thiserror::Error;

use crate::event_store::Store;
use crate::types::Student;

const COLUMNS: [&str; 4] = ["dni", "nombre", "apellido", "passwordtemporal"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV is empty")]
    Empty,

    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("unreadable CSV header: {0}")]
    Csv(#[from] csv::Error),
}

/// Counts reported back to the administrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
}

/// Import every row of `csv`, hashing passwords with `bcrypt_cost`
pub fn import_students(
    store: &dyn Store,
    csv: &str,
    bcrypt_cost: u32,
) -> Result<ImportReport, ImportError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(csv.as_bytes());

    let index = column_index(reader.headers()?)?;
    let mut report = ImportReport::default();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable CSV row skipped");
                report.failed += 1;
                continue;
            }
        };
        let row = record.position().map(|p| p.line()).unwrap_or_default();

        let value = |col: usize| record.get(index[col]).unwrap_or("");
        let (dni, first_name, last_name, password) = (value(0), value(1), value(2), value(3));

        if [dni, first_name, last_name, password].iter().any(|v| v.is_empty()) {
            tracing::warn!(row, "CSV row with missing fields skipped");
            report.failed += 1;
            continue;
        }

        let result = hash(password, bcrypt_cost)
            .map_err(|e| e.to_string())
            .and_then(|password_hash| {
                let student = Student::new(
                    dni.to_string(),
                    first_name.to_string(),
                    last_name.to_string(),
                    password_hash,
                );
                store.upsert_student(&student).map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => report.imported += 1,
            Err(e) => {
                tracing::error!(row, dni = %dni, error = %e, "Failed to import student");
                report.failed += 1;
            }
        }
    }

    tracing::info!(imported = report.imported, failed = report.failed, "CSV import finished");
    Ok(report)
}

/// Position of each expected column in the header
fn column_index(header: &StringRecord) -> Result<[usize; 4], ImportError> {
    let names: Vec<String> = header
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_ascii_lowercase())
        .collect();
    if names.iter().all(|n| n.is_empty()) {
        return Err(ImportError::Empty);
    }

    let mut index = [0usize; 4];
    for (slot, column) in COLUMNS.into_iter().enumerate() {
        index[slot] = names
            .iter()
            .position(|n| n == column)
            .ok_or(ImportError::MissingColumn(column))?;
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::EventStore;

    #[test]
    fn test_import_counts_rows() {
        let store = EventStore::in_memory();
        let csv = "dni,nombre,apellido,passwordtemporal\n\
                   111, Ana ,Diaz,pw1\n\
                   222,Leo,,pw2\n\
                   333,Sol,Paz,pw3\n";

        let report = import_students(&store, csv, 4).unwrap();
        assert_eq!(report, ImportReport { imported: 2, failed: 1 });

        let ana = store.find_student("111").unwrap().unwrap();
        assert_eq!(ana.first_name, "Ana");
        assert!(bcrypt::verify("pw1", &ana.password_hash).unwrap());
        assert!(store.find_student("222").unwrap().is_none());
    }

    #[test]
    fn test_import_upserts_existing() {
        let store = EventStore::in_memory();
        import_students(&store, "dni,nombre,apellido,passwordtemporal\n111,Ana,Diaz,old\n", 4).unwrap();
        import_students(&store, "dni,nombre,apellido,passwordtemporal\n111,Ana,Lopez,new\n", 4).unwrap();

        let ana = store.find_student("111").unwrap().unwrap();
        assert_eq!(ana.last_name, "Lopez");
        assert!(bcrypt::verify("new", &ana.password_hash).unwrap());
    }

    #[test]
    fn test_header_in_any_order() {
        let store = EventStore::in_memory();
        let csv = "PasswordTemporal,Apellido,Nombre,DNI\npw,Diaz,Ana,111\n";

        let report = import_students(&store, csv, 4).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(store.find_student("111").unwrap().unwrap().last_name, "Diaz");
    }

    #[test]
    fn test_quoted_fields_keep_their_commas() {
        let store = EventStore::in_memory();
        let csv = "dni,nombre,apellido,passwordtemporal\n\
                   111,Ana,\"Diaz, Jr\",pw1\n\
                   222,\"Leo\nMaria\",Paz,pw2\n";

        let report = import_students(&store, csv, 4).unwrap();
        assert_eq!(report, ImportReport { imported: 2, failed: 0 });

        let ana = store.find_student("111").unwrap().unwrap();
        assert_eq!(ana.last_name, "Diaz, Jr");
        assert!(bcrypt::verify("pw1", &ana.password_hash).unwrap());
        assert_eq!(store.find_student("222").unwrap().unwrap().first_name, "Leo\nMaria");
    }

    #[test]
    fn test_short_row_counts_as_failed() {
        let store = EventStore::in_memory();
        let csv = "dni,nombre,apellido,passwordtemporal\n111,Ana\n\n333,Sol,Paz,pw\n";

        let report = import_students(&store, csv, 4).unwrap();
        assert_eq!(report, ImportReport { imported: 1, failed: 1 });
    }

    #[test]
    fn test_missing_column() {
        let store = EventStore::in_memory();
        let err = import_students(&store, "dni,nombre\n1,Ana\n", 4).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("apellido")));
        assert!(matches!(import_students(&store, "", 4), Err(ImportError::Empty)));
    }
}

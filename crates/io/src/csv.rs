// CSV import of raw tables, export of cleaned tables and reject artifacts

use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};

use foodshare_clean::config::ResolvedPaths;
use foodshare_clean::model::{RejectRule, Table, TableOutcome, TableRow};
use foodshare_clean::{RawDataset, RawTable};

use crate::error::IoError;

/// Leading columns of every reject artifact, before the cleaned and raw columns.
pub const REJECT_PREFIX_COLUMNS: [&str; 2] = ["Source_Line", "Reject_Rule"];

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::read(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::read(path, e))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            debug!("{}: not UTF-8, decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}

pub fn read_table(table: Table, path: &Path) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    let raw = RawTable::from_csv_str(table, &content)?;
    info!("{table}: read {} rows from {}", raw.rows.len(), path.display());
    Ok(raw)
}

/// Read all four input tables named by `paths`.
pub fn read_dataset(paths: &ResolvedPaths) -> Result<RawDataset, IoError> {
    let read = |table: Table| match paths.inputs.get(&table) {
        Some(path) => read_table(table, path),
        None => Err(IoError::read(Path::new(table.stem()), "no input file configured")),
    };
    Ok(RawDataset {
        providers: read(Table::Providers)?,
        receivers: read(Table::Receivers)?,
        food_listings: read(Table::FoodListings)?,
        claims: read(Table::Claims)?,
    })
}

/// Write accepted rows in schema column order.
pub fn write_clean<T: TableRow>(rows: &[T], path: &Path) -> Result<(), IoError> {
    let err = |e: csv::Error| IoError::write(path, e);
    let mut writer = csv::Writer::from_path(path).map_err(err)?;
    writer.write_record(T::TABLE.columns()).map_err(err)?;
    for row in rows {
        writer.write_record(row.cleaned_values()).map_err(err)?;
    }
    writer.flush().map_err(|e| IoError::write(path, e))?;
    info!("{}: wrote {} rows to {}", T::TABLE, rows.len(), path.display());
    Ok(())
}

/// Write one artifact per rule that rejected at least one row of `outcome`.
///
/// Each record carries the source line, the rule label, the attempted-clean
/// values, then the untouched input values under `raw_`-prefixed headers.
pub fn write_rejects<T: TableRow>(outcome: &TableOutcome<T>, dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let mut header: Vec<String> = REJECT_PREFIX_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(T::TABLE.columns().iter().map(|c| c.to_string()));
    header.extend(outcome.source_headers.iter().map(|h| format!("raw_{h}")));

    let mut written = Vec::new();
    for (rule, rows) in outcome.rejects_by_rule() {
        let path = dir.join(rule.artifact_name(outcome.table));
        let err = |e: csv::Error| IoError::write(&path, e);
        // Input rows can be wider than their header.
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(err)?;
        writer.write_record(&header).map_err(err)?;
        for row in &rows {
            let source = row.source();
            let mut record = vec![source.line.to_string(), rule.label()];
            record.extend(row.cleaned_values());
            record.extend(source.values.iter().cloned());
            writer.write_record(&record).map_err(err)?;
        }
        writer.flush().map_err(|e| IoError::write(&path, e))?;
        info!("{}: wrote {} rejected rows to {}", outcome.table, rows.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Remove reject artifacts for `table` left in `dir` by an earlier run.
/// Only names some reject rule could produce for `table` are touched.
pub fn remove_stale_rejects(table: Table, dir: &Path) -> Result<usize, IoError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(IoError::read(dir, e)),
    };

    let artifacts = RejectRule::possible_artifact_names(table);
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| IoError::read(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !artifacts.contains(&name) {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            std::fs::remove_file(&path).map_err(|e| IoError::write(&path, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodshare_clean::model::{Coerced, Receiver, Rejected, SourceRow};
    use std::fs;
    use tempfile::tempdir;

    fn receiver(line: u64, id: i64, raw: &[&str]) -> Receiver {
        Receiver {
            source: SourceRow {
                line,
                values: raw.iter().map(|s| s.to_string()).collect(),
            },
            receiver_id: Coerced::Present(id),
            name: "Shelter".into(),
            kind: "Ngo".into(),
            city: "Springfield".into(),
            contact: "555".into(),
        }
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("providers.csv");
        // "Caf\xe9" is Café in Windows-1252
        fs::write(&path, b"Name\nCaf\xe9\n").unwrap();
        let content = read_file_as_utf8(&path).unwrap();
        assert_eq!(content, "Name\nCaf\u{e9}\n");
    }

    #[test]
    fn test_missing_input_is_read_error() {
        let dir = tempdir().unwrap();
        let err = read_table(Table::Claims, &dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_clean_export_uses_schema_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("receivers_clean.csv");
        write_clean(&[receiver(2, 10, &[])], &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Receiver_ID,Name,Type,City,Contact\n10,Shelter,Ngo,Springfield,555\n"
        );
    }

    #[test]
    fn test_reject_artifact_layout() {
        let dir = tempdir().unwrap();
        let headers = vec!["Receiver_ID".to_string(), "Name".to_string()];
        let mut outcome = TableOutcome::start(
            Table::Receivers,
            headers,
            vec![receiver(2, 10, &["10", " shelter "]), receiver(3, 10, &["10", "dup", "extra"])],
        );
        outcome.apply(|mut rows| {
            let dup = rows.pop().unwrap();
            let rule = RejectRule::DuplicateKey { column: "Receiver_ID" };
            (rows, vec![Rejected { rule, row: dup }])
        });

        let written = write_rejects(&outcome, dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("receivers_duplicate_receiver_id.csv"));

        let content = fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Source_Line,Reject_Rule,Receiver_ID,Name,Type,City,Contact,raw_Receiver_ID,raw_Name"
        );
        assert_eq!(lines[1], "3,duplicate_receiver_id,10,Shelter,Ngo,Springfield,555,10,dup,extra");
    }

    #[test]
    fn test_stale_rejects_removed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("claims_bad_fk.csv"), "x").unwrap();
        fs::write(dir.path().join("claims_clean.csv"), "x").unwrap();
        fs::write(dir.path().join("providers_bad_fk.csv"), "x").unwrap();
        fs::write(dir.path().join("claims_notes.txt"), "x").unwrap();
        fs::write(dir.path().join("claims_2024.csv"), "x").unwrap();
        fs::write(dir.path().join("claims_bad_timestamp.csv"), "x").unwrap();

        assert_eq!(remove_stale_rejects(Table::Claims, dir.path()).unwrap(), 2);
        assert!(!dir.path().join("claims_bad_fk.csv").exists());
        assert!(!dir.path().join("claims_bad_timestamp.csv").exists());
        assert!(dir.path().join("claims_clean.csv").exists());
        assert!(dir.path().join("claims_2024.csv").exists());
        assert!(dir.path().join("providers_bad_fk.csv").exists());
        assert_eq!(remove_stale_rejects(Table::Claims, &dir.path().join("missing")).unwrap(), 0);
    }
}

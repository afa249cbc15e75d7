// File I/O operations

pub mod csv;
pub mod error;
pub mod json;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use foodshare_clean::config::ResolvedPaths;
use foodshare_clean::{CleanDataset, RunSummary, Table};

pub use error::IoError;

/// File name of the run summary inside the output directory.
pub const SUMMARY_FILE_NAME: &str = "run_summary.json";

/// Paths written by [`write_outputs`].
#[derive(Debug, Clone, Default)]
pub struct WrittenOutputs {
    pub cleaned: Vec<PathBuf>,
    pub rejects: Vec<PathBuf>,
    /// SHA-256 of each cleaned CSV, keyed by file name.
    pub digests: BTreeMap<String, String>,
}

fn create_dir(dir: &Path) -> Result<(), IoError> {
    std::fs::create_dir_all(dir).map_err(|e| IoError::write(dir, e))
}

/// Refuse output directories that hold one of the input CSVs.
fn check_inputs_outside(paths: &ResolvedPaths) -> Result<(), IoError> {
    let canonical = |dir: &Path| dir.canonicalize().map_err(|e| IoError::write(dir, e));
    let output_dir = canonical(&paths.output_dir)?;
    let rejects_dir = canonical(&paths.rejects_dir)?;

    for input in paths.inputs.values() {
        let Some(parent) = input.parent() else { continue };
        let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
        // Missing inputs were already reported by the reader.
        let Ok(input_dir) = parent.canonicalize() else { continue };
        for dir in [&output_dir, &rejects_dir] {
            if &input_dir == dir {
                return Err(IoError::write(
                    dir,
                    format!("directory holds input {}", input.display()),
                ));
            }
        }
    }
    Ok(())
}

/// Write the four cleaned tables and every non-empty reject artifact.
/// Reject artifacts from a previous run in the rejects directory are removed first.
pub fn write_outputs(dataset: &CleanDataset, paths: &ResolvedPaths) -> Result<WrittenOutputs, IoError> {
    create_dir(&paths.output_dir)?;
    create_dir(&paths.rejects_dir)?;
    check_inputs_outside(paths)?;

    let mut out = WrittenOutputs::default();
    let clean_path = |table: Table| paths.output_dir.join(table.clean_file_name());

    for table in Table::ALL {
        csv::remove_stale_rejects(table, &paths.rejects_dir)?;
    }

    csv::write_clean(&dataset.providers.accepted, &clean_path(Table::Providers))?;
    csv::write_clean(&dataset.receivers.accepted, &clean_path(Table::Receivers))?;
    csv::write_clean(&dataset.food_listings.accepted, &clean_path(Table::FoodListings))?;
    csv::write_clean(&dataset.claims.accepted, &clean_path(Table::Claims))?;

    out.rejects.extend(csv::write_rejects(&dataset.providers, &paths.rejects_dir)?);
    out.rejects.extend(csv::write_rejects(&dataset.receivers, &paths.rejects_dir)?);
    out.rejects.extend(csv::write_rejects(&dataset.food_listings, &paths.rejects_dir)?);
    out.rejects.extend(csv::write_rejects(&dataset.claims, &paths.rejects_dir)?);

    for table in Table::ALL {
        let path = clean_path(table);
        out.digests.insert(table.clean_file_name(), json::sha256_file(&path)?);
        out.cleaned.push(path);
    }
    Ok(out)
}

/// Attach output digests to `summary` and write it next to the cleaned tables.
pub fn write_run_summary(
    summary: &mut RunSummary,
    written: &WrittenOutputs,
    paths: &ResolvedPaths,
) -> Result<PathBuf, IoError> {
    summary.outputs = written.digests.clone();
    let path = paths.output_dir.join(SUMMARY_FILE_NAME);
    json::write_summary(summary, &path)?;
    Ok(path)
}

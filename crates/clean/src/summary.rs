use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{CleanDataset, TableOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub input_rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Rejected row counts keyed by reject artifact file name.
    pub rejects: BTreeMap<String, usize>,
    pub reconciled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub meta: RunMeta,
    pub tables: Vec<TableSummary>,
    pub backfilled_locations: usize,
    /// SHA-256 of each cleaned output, keyed by file name. Filled in by the writer.
    pub outputs: BTreeMap<String, String>,
}

fn summarize<T>(outcome: &TableOutcome<T>) -> TableSummary {
    TableSummary {
        table: outcome.table.name().to_string(),
        input_rows: outcome.input_rows,
        accepted: outcome.accepted.len(),
        rejected: outcome.rejected.len(),
        rejects: outcome.reject_counts(),
        reconciled: outcome.is_reconciled(),
    }
}

/// Per-table counts in processing order.
pub fn compute_summary(dataset: &CleanDataset) -> Vec<TableSummary> {
    vec![
        summarize(&dataset.providers),
        summarize(&dataset.receivers),
        summarize(&dataset.food_listings),
        summarize(&dataset.claims),
    ]
}

impl RunSummary {
    pub fn new(config_name: &str, dataset: &CleanDataset) -> Self {
        Self {
            meta: RunMeta {
                config_name: config_name.to_string(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            tables: compute_summary(dataset),
            backfilled_locations: dataset.backfilled_locations,
            outputs: BTreeMap::new(),
        }
    }

    pub fn total_rejected(&self) -> usize {
        self.tables.iter().map(|t| t.rejected).sum()
    }
}

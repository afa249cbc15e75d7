use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Rendering used for `Expiry_Date` in cleaned outputs and the store.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Rendering used for `Timestamp` in cleaned outputs and the store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Coerced values
// ---------------------------------------------------------------------------

/// Outcome of coercing a raw cell into a typed value.
///
/// Coercion never fails: anything that does not parse becomes `Missing` and is
/// left for the validator to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Coerced<T> {
    Present(T),
    Missing,
}

impl<T> Coerced<T> {
    pub fn present(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing => None,
        }
    }

    pub fn as_ref(&self) -> Coerced<&T> {
        match self {
            Self::Present(v) => Coerced::Present(v),
            Self::Missing => Coerced::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Coerced<U> {
        match self {
            Self::Present(v) => Coerced::Present(f(v)),
            Self::Missing => Coerced::Missing,
        }
    }
}

impl<T> From<Option<T>> for Coerced<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Present(v),
            None => Self::Missing,
        }
    }
}

fn render<T>(value: &Coerced<T>, f: impl FnOnce(&T) -> String) -> String {
    match value {
        Coerced::Present(v) => f(v),
        Coerced::Missing => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Table {
    Providers,
    Receivers,
    FoodListings,
    Claims,
}

pub const PROVIDER_COLUMNS: &[&str] = &["Provider_ID", "Name", "Type", "Address", "City", "Contact"];
pub const RECEIVER_COLUMNS: &[&str] = &["Receiver_ID", "Name", "Type", "City", "Contact"];
pub const FOOD_LISTING_COLUMNS: &[&str] = &[
    "Food_ID",
    "Food_Name",
    "Quantity",
    "Expiry_Date",
    "Provider_ID",
    "Provider_Type",
    "Location",
    "Food_Type",
    "Meal_Type",
];
pub const CLAIM_COLUMNS: &[&str] = &["Claim_ID", "Food_ID", "Receiver_ID", "Status", "Timestamp"];

impl Table {
    /// Processing and insertion order: parents before children.
    pub const ALL: [Table; 4] = [Table::Providers, Table::Receivers, Table::FoodListings, Table::Claims];

    /// Table name as used in the relational store.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Providers => "Providers",
            Self::Receivers => "Receivers",
            Self::FoodListings => "Food_Listings",
            Self::Claims => "Claims",
        }
    }

    /// Lowercase stem used for artifact file names.
    pub fn stem(&self) -> &'static str {
        match self {
            Self::Providers => "providers",
            Self::Receivers => "receivers",
            Self::FoodListings => "food_listings",
            Self::Claims => "claims",
        }
    }

    /// Required columns, identifier first, in output order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Providers => PROVIDER_COLUMNS,
            Self::Receivers => RECEIVER_COLUMNS,
            Self::FoodListings => FOOD_LISTING_COLUMNS,
            Self::Claims => CLAIM_COLUMNS,
        }
    }

    pub fn key_column(&self) -> &'static str {
        self.columns()[0]
    }

    /// File name of the cleaned output for this table.
    pub fn clean_file_name(&self) -> String {
        format!("{}_clean.csv", self.stem())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// The untouched input record a typed row was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line of the record in its input file (header is line 1).
    pub line: u64,
    /// Raw field values, aligned with the table's source headers.
    pub values: Vec<String>,
}

/// Common view over the four entity rows.
pub trait TableRow {
    const TABLE: Table;

    /// Primary key value.
    fn key(&self) -> Coerced<i64>;

    fn source(&self) -> &SourceRow;

    /// Attempted-clean values, aligned with `Self::TABLE.columns()`.
    fn cleaned_values(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    pub source: SourceRow,
    pub provider_id: Coerced<i64>,
    pub name: String,
    pub kind: String,
    pub address: String,
    pub city: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub source: SourceRow,
    pub receiver_id: Coerced<i64>,
    pub name: String,
    pub kind: String,
    pub city: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoodListing {
    pub source: SourceRow,
    pub food_id: Coerced<i64>,
    pub food_name: String,
    pub quantity: Coerced<i64>,
    pub expiry_date: Coerced<NaiveDate>,
    pub provider_id: Coerced<i64>,
    pub provider_type: String,
    pub location: String,
    pub food_type: String,
    pub meal_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub source: SourceRow,
    pub claim_id: Coerced<i64>,
    pub food_id: Coerced<i64>,
    pub receiver_id: Coerced<i64>,
    pub status: String,
    pub timestamp: Coerced<NaiveDateTime>,
}

fn id_text(v: &Coerced<i64>) -> String {
    render(v, |n| n.to_string())
}

impl TableRow for Provider {
    const TABLE: Table = Table::Providers;

    fn key(&self) -> Coerced<i64> {
        self.provider_id
    }

    fn source(&self) -> &SourceRow {
        &self.source
    }

    fn cleaned_values(&self) -> Vec<String> {
        vec![
            id_text(&self.provider_id),
            self.name.clone(),
            self.kind.clone(),
            self.address.clone(),
            self.city.clone(),
            self.contact.clone(),
        ]
    }
}

impl TableRow for Receiver {
    const TABLE: Table = Table::Receivers;

    fn key(&self) -> Coerced<i64> {
        self.receiver_id
    }

    fn source(&self) -> &SourceRow {
        &self.source
    }

    fn cleaned_values(&self) -> Vec<String> {
        vec![
            id_text(&self.receiver_id),
            self.name.clone(),
            self.kind.clone(),
            self.city.clone(),
            self.contact.clone(),
        ]
    }
}

impl TableRow for FoodListing {
    const TABLE: Table = Table::FoodListings;

    fn key(&self) -> Coerced<i64> {
        self.food_id
    }

    fn source(&self) -> &SourceRow {
        &self.source
    }

    fn cleaned_values(&self) -> Vec<String> {
        vec![
            id_text(&self.food_id),
            self.food_name.clone(),
            id_text(&self.quantity),
            render(&self.expiry_date, |d| d.format(DATE_FORMAT).to_string()),
            id_text(&self.provider_id),
            self.provider_type.clone(),
            self.location.clone(),
            self.food_type.clone(),
            self.meal_type.clone(),
        ]
    }
}

impl TableRow for Claim {
    const TABLE: Table = Table::Claims;

    fn key(&self) -> Coerced<i64> {
        self.claim_id
    }

    fn source(&self) -> &SourceRow {
        &self.source
    }

    fn cleaned_values(&self) -> Vec<String> {
        vec![
            id_text(&self.claim_id),
            id_text(&self.food_id),
            id_text(&self.receiver_id),
            self.status.clone(),
            render(&self.timestamp, |t| t.format(TIMESTAMP_FORMAT).to_string()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// The rule a row failed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RejectRule {
    NullKey { column: &'static str },
    DuplicateKey { column: &'static str },
    InvalidQuantity,
    InvalidDate { column: &'static str },
    /// `column` is `None` for the combined claim check (food OR receiver).
    BadForeignKey { column: Option<&'static str> },
}

impl RejectRule {
    /// Stable snake_case label, e.g. `duplicate_provider_id`.
    pub fn label(&self) -> String {
        match self {
            Self::NullKey { column } => format!("null_{}", column.to_lowercase()),
            Self::DuplicateKey { column } => format!("duplicate_{}", column.to_lowercase()),
            Self::InvalidQuantity => "invalid_quantity".into(),
            Self::InvalidDate { column } => format!("bad_{}", column.to_lowercase()),
            Self::BadForeignKey { column: Some(column) } => {
                format!("bad_{}_fk", column.to_lowercase())
            }
            Self::BadForeignKey { column: None } => "bad_fk".into(),
        }
    }

    /// Reject artifact file name for this rule on `table`.
    pub fn artifact_name(&self, table: Table) -> String {
        format!("{}_{}.csv", table.stem(), self.label())
    }

    /// Every artifact name a rule over one of `table`'s columns can produce.
    pub fn possible_artifact_names(table: Table) -> BTreeSet<String> {
        let mut rules = vec![Self::InvalidQuantity, Self::BadForeignKey { column: None }];
        for &column in table.columns() {
            rules.push(Self::NullKey { column });
            rules.push(Self::DuplicateKey { column });
            rules.push(Self::InvalidDate { column });
            rules.push(Self::BadForeignKey { column: Some(column) });
        }
        rules.iter().map(|rule| rule.artifact_name(table)).collect()
    }
}

impl fmt::Display for RejectRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejected<T> {
    pub rule: RejectRule,
    pub row: T,
}

/// Accept/reject partition produced by a single rule.
pub type Partition<T> = (Vec<T>, Vec<Rejected<T>>);

// ---------------------------------------------------------------------------
// Per-table outcome
// ---------------------------------------------------------------------------

/// Everything one table went through during a run.
#[derive(Debug, Clone)]
pub struct TableOutcome<T> {
    pub table: Table,
    /// Trimmed header names of the input file, in input order.
    pub source_headers: Vec<String>,
    pub input_rows: usize,
    pub accepted: Vec<T>,
    pub rejected: Vec<Rejected<T>>,
}

impl<T> TableOutcome<T> {
    pub fn start(table: Table, source_headers: Vec<String>, rows: Vec<T>) -> Self {
        Self {
            table,
            source_headers,
            input_rows: rows.len(),
            accepted: rows,
            rejected: Vec::new(),
        }
    }

    /// Run one partitioning stage over the currently accepted rows.
    /// Returns the number of rows the stage rejected.
    pub fn apply(&mut self, stage: impl FnOnce(Vec<T>) -> Partition<T>) -> usize {
        let rows = std::mem::take(&mut self.accepted);
        let (accepted, rejected) = stage(rows);
        let count = rejected.len();
        self.accepted = accepted;
        self.rejected.extend(rejected);
        count
    }

    /// Rejected row counts keyed by artifact name.
    pub fn reject_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.rejected {
            *counts.entry(r.rule.artifact_name(self.table)).or_insert(0) += 1;
        }
        counts
    }

    /// Rejected rows grouped by rule, each group in source order.
    pub fn rejects_by_rule(&self) -> BTreeMap<RejectRule, Vec<&T>> {
        let mut groups: BTreeMap<RejectRule, Vec<&T>> = BTreeMap::new();
        for r in &self.rejected {
            groups.entry(r.rule).or_default().push(&r.row);
        }
        groups
    }

    /// Every input row is either accepted or rejected exactly once.
    pub fn is_reconciled(&self) -> bool {
        self.input_rows == self.accepted.len() + self.rejected.len()
    }
}

impl<T: TableRow> TableOutcome<T> {
    pub fn accepted_keys(&self) -> std::collections::HashSet<i64> {
        self.accepted.iter().filter_map(|r| r.key().present()).collect()
    }
}

/// Output of a full pipeline run.
#[derive(Debug, Clone)]
pub struct CleanDataset {
    pub providers: TableOutcome<Provider>,
    pub receivers: TableOutcome<Receiver>,
    pub food_listings: TableOutcome<FoodListing>,
    pub claims: TableOutcome<Claim>,
    /// Food listings whose Location was filled from the provider's City.
    pub backfilled_locations: usize,
}

impl CleanDataset {
    pub fn is_reconciled(&self) -> bool {
        self.providers.is_reconciled()
            && self.receivers.is_reconciled()
            && self.food_listings.is_reconciled()
            && self.claims.is_reconciled()
    }
}

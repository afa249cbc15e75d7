//! Per-table row rules. Each rule is a pure function from a row set to an
//! `(accepted, rejected)` pair; relative row order is preserved on both sides.

use std::collections::HashSet;

use crate::model::{Claim, Coerced, FoodListing, Partition, RejectRule, Rejected, TableRow};

/// Split `rows` by `fails`, tagging rejected rows with `rule`.
pub fn partition<T>(rows: Vec<T>, rule: RejectRule, mut fails: impl FnMut(&T) -> bool) -> Partition<T> {
    let mut accepted = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        if fails(&row) {
            rejected.push(Rejected { rule, row });
        } else {
            accepted.push(row);
        }
    }
    (accepted, rejected)
}

/// Rows whose `column` (read through `field`) is missing.
pub fn drop_null<T>(rows: Vec<T>, column: &'static str, field: impl Fn(&T) -> Coerced<i64>) -> Partition<T> {
    partition(rows, RejectRule::NullKey { column }, |r| field(r).is_missing())
}

/// Rows with a missing primary key.
pub fn drop_null_keys<T: TableRow>(rows: Vec<T>) -> Partition<T> {
    drop_null(rows, T::TABLE.key_column(), T::key)
}

/// Keep the first row for each primary key; later rows with the same key are rejected.
/// Rows without a key are left alone (null-key removal runs first).
pub fn drop_duplicate_keys<T: TableRow>(rows: Vec<T>) -> Partition<T> {
    let mut seen = HashSet::new();
    partition(rows, RejectRule::DuplicateKey { column: T::TABLE.key_column() }, |r| match r.key() {
        Coerced::Present(k) => !seen.insert(k),
        Coerced::Missing => false,
    })
}

/// Missing or negative Quantity.
pub fn drop_invalid_quantity(rows: Vec<FoodListing>) -> Partition<FoodListing> {
    partition(rows, RejectRule::InvalidQuantity, |f| match f.quantity {
        Coerced::Present(q) => q < 0,
        Coerced::Missing => true,
    })
}

pub fn drop_invalid_expiry(rows: Vec<FoodListing>) -> Partition<FoodListing> {
    partition(rows, RejectRule::InvalidDate { column: "Expiry_Date" }, |f| {
        f.expiry_date.is_missing()
    })
}

pub fn drop_invalid_timestamp(rows: Vec<Claim>) -> Partition<Claim> {
    partition(rows, RejectRule::InvalidDate { column: "Timestamp" }, |c| {
        c.timestamp.is_missing()
    })
}

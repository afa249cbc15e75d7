// Bulk load of a cleaned dataset into a fresh store

use std::path::{Path, PathBuf};

use log::info;
use rusqlite::{params, Connection};

use foodshare_clean::model::{Claim, FoodListing, Provider, Receiver, DATE_FORMAT, TIMESTAMP_FORMAT};
use foodshare_clean::{CleanDataset, Table};

use crate::error::{is_constraint_violation, StoreError};
use crate::handle::{foreign_key_violations, Store};
use crate::reports::TableCounts;
use crate::schema;

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn load_error(table: Table) -> impl Fn(rusqlite::Error) -> StoreError {
    move |e| {
        if is_constraint_violation(&e) {
            StoreError::Integrity {
                table: table.name().into(),
                message: e.to_string(),
            }
        } else {
            StoreError::Sqlite(e)
        }
    }
}

/// Sibling path the new store is built at before it replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Build a store from `dataset` and move it over `path`.
///
/// The previous store, if any, is discarded whole, never migrated. On any
/// failure it is left untouched and the partial build is deleted.
pub fn load(dataset: &CleanDataset, path: &Path) -> Result<TableCounts, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let staging = staging_path(path);
    if staging.exists() {
        std::fs::remove_file(&staging).map_err(|e| io_error(&staging, e))?;
    }

    if let Err(e) = build(dataset, &staging) {
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&staging, path) {
        let _ = std::fs::remove_file(&staging);
        return Err(io_error(path, e));
    }

    let store = Store::open(path)?;
    let counts = store.table_counts()?;
    store.close()?;
    info!(
        "loaded {}: {} providers, {} receivers, {} listings, {} claims",
        path.display(),
        counts.providers,
        counts.receivers,
        counts.food_listings,
        counts.claims
    );
    Ok(counts)
}

fn build(dataset: &CleanDataset, path: &Path) -> Result<(), StoreError> {
    let mut conn = Connection::open(path)?;
    schema::create(&conn)?;

    // Parents before children.
    let tx = conn.transaction()?;
    insert_providers(&tx, &dataset.providers.accepted)?;
    insert_receivers(&tx, &dataset.receivers.accepted)?;
    insert_food_listings(&tx, &dataset.food_listings.accepted)?;
    insert_claims(&tx, &dataset.claims.accepted)?;

    let violations = foreign_key_violations(&tx)?;
    if let Some((table, rowid)) = violations.first() {
        return Err(StoreError::Integrity {
            table: table.clone(),
            message: format!("{} rows with dangling foreign keys (first rowid {rowid})", violations.len()),
        });
    }
    tx.commit()?;
    conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
}

fn insert_providers(conn: &Connection, rows: &[Provider]) -> Result<(), StoreError> {
    let err = load_error(Table::Providers);
    let mut stmt = conn
        .prepare("INSERT INTO Providers (Provider_ID, Name, Type, Address, City, Contact) VALUES (?1, ?2, ?3, ?4, ?5, ?6)")
        .map_err(&err)?;
    for p in rows {
        stmt.execute(params![p.provider_id.present(), p.name, p.kind, p.address, p.city, p.contact])
            .map_err(&err)?;
    }
    Ok(())
}

fn insert_receivers(conn: &Connection, rows: &[Receiver]) -> Result<(), StoreError> {
    let err = load_error(Table::Receivers);
    let mut stmt = conn
        .prepare("INSERT INTO Receivers (Receiver_ID, Name, Type, City, Contact) VALUES (?1, ?2, ?3, ?4, ?5)")
        .map_err(&err)?;
    for r in rows {
        stmt.execute(params![r.receiver_id.present(), r.name, r.kind, r.city, r.contact])
            .map_err(&err)?;
    }
    Ok(())
}

fn insert_food_listings(conn: &Connection, rows: &[FoodListing]) -> Result<(), StoreError> {
    let err = load_error(Table::FoodListings);
    let mut stmt = conn
        .prepare(
            "INSERT INTO Food_Listings (Food_ID, Food_Name, Quantity, Expiry_Date, Provider_ID, Provider_Type, Location, Food_Type, Meal_Type) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .map_err(&err)?;
    for f in rows {
        // Missing values bind as NULL so NOT NULL constraints catch them.
        let expiry = f.expiry_date.map(|d| d.format(DATE_FORMAT).to_string()).present();
        stmt.execute(params![
            f.food_id.present(),
            f.food_name,
            f.quantity.present(),
            expiry,
            f.provider_id.present(),
            f.provider_type,
            f.location,
            f.food_type,
            f.meal_type
        ])
        .map_err(&err)?;
    }
    Ok(())
}

fn insert_claims(conn: &Connection, rows: &[Claim]) -> Result<(), StoreError> {
    let err = load_error(Table::Claims);
    let mut stmt = conn
        .prepare("INSERT INTO Claims (Claim_ID, Food_ID, Receiver_ID, Status, Timestamp) VALUES (?1, ?2, ?3, ?4, ?5)")
        .map_err(&err)?;
    for c in rows {
        let timestamp = c.timestamp.map(|t| t.format(TIMESTAMP_FORMAT).to_string()).present();
        stmt.execute(params![
            c.claim_id.present(),
            c.food_id.present(),
            c.receiver_id.present(),
            c.status,
            timestamp
        ])
        .map_err(&err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_path_appends_suffix() {
        assert_eq!(
            staging_path(Path::new("/out/food_waste.db")),
            PathBuf::from("/out/food_waste.db.tmp")
        );
    }
}

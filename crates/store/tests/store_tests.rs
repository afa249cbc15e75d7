use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use foodshare_clean::model::{Claim, Coerced, SourceRow};
use foodshare_clean::{run, CleanDataset, RawDataset, RawTable, Table, Vocabularies};
use foodshare_store::{
    load, Cell, ListingFilter, NewClaim, NewListing, Report, ReportParams, Store, StoreError, TableCounts,
};
use tempfile::tempdir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../clean/tests/fixtures")
}

fn fixture_table(table: Table, file: &str) -> RawTable {
    let data = std::fs::read_to_string(fixtures_dir().join(file)).unwrap();
    RawTable::from_csv_str(table, &data).unwrap()
}

fn fixture_dataset() -> CleanDataset {
    let raw = RawDataset {
        providers: fixture_table(Table::Providers, "providers_data.csv"),
        receivers: fixture_table(Table::Receivers, "receivers_data.csv"),
        food_listings: fixture_table(Table::FoodListings, "food_listings_data.csv"),
        claims: fixture_table(Table::Claims, "claims_data.csv"),
    };
    run(&raw, &Vocabularies::default()).unwrap()
}

fn loaded_store(dir: &Path) -> Store {
    let path = dir.join("food_waste.db");
    load(&fixture_dataset(), &path).unwrap();
    Store::open(&path).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn params(today: &str) -> ReportParams {
    ReportParams {
        city: None,
        today: date(today),
    }
}

// -------------------------------------------------------------------------
// Loader
// -------------------------------------------------------------------------

#[test]
fn load_persists_accepted_rows_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/food_waste.db");
    let counts = load(&fixture_dataset(), &path).unwrap();
    assert_eq!(
        counts,
        TableCounts {
            providers: 3,
            receivers: 3,
            food_listings: 3,
            claims: 3
        }
    );
    assert!(!dir.path().join("nested/food_waste.db.tmp").exists());

    let store = Store::open(&path).unwrap();
    assert!(store.foreign_key_violations().unwrap().is_empty());
    store.close().unwrap();
}

/// Every row of every table, rendered as text, in primary-key order.
fn dump(path: &Path) -> Vec<(String, Vec<Vec<String>>)> {
    use rusqlite::types::ValueRef;

    let conn = rusqlite::Connection::open(path).unwrap();
    ["Providers", "Receivers", "Food_Listings", "Claims"]
        .iter()
        .map(|table| {
            let mut stmt = conn.prepare(&format!("SELECT * FROM {table} ORDER BY 1")).unwrap();
            let width = stmt.column_count();
            let rows = stmt
                .query_map([], |row| {
                    (0..width)
                        .map(|i| {
                            Ok(match row.get_ref(i)? {
                                ValueRef::Null => "NULL".to_string(),
                                ValueRef::Integer(v) => v.to_string(),
                                ValueRef::Real(v) => v.to_string(),
                                ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
                                ValueRef::Blob(b) => format!("{b:?}"),
                            })
                        })
                        .collect::<rusqlite::Result<Vec<String>>>()
                })
                .unwrap()
                .collect::<rusqlite::Result<Vec<_>>>()
                .unwrap();
            (table.to_string(), rows)
        })
        .collect()
}

#[test]
fn loading_same_dataset_twice_yields_identical_stores() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.db");
    let second = dir.path().join("second.db");
    load(&fixture_dataset(), &first).unwrap();
    load(&fixture_dataset(), &second).unwrap();

    let before = dump(&first);
    assert_eq!(before, dump(&second));
    assert_eq!(before[3].1.len(), 3);

    // Reloading over an existing store converges to the same contents.
    load(&fixture_dataset(), &first).unwrap();
    assert_eq!(dump(&first), before);
}

#[test]
fn failed_swap_leaves_no_staging_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("food_waste.db");
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("keep.txt"), "x").unwrap();

    let err = load(&fixture_dataset(), &path).unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }), "{err}");
    assert!(!dir.path().join("food_waste.db.tmp").exists());
    assert!(path.join("keep.txt").exists());
}

#[test]
fn reload_discards_previous_store() {
    let dir = tempdir().unwrap();
    let mut store = loaded_store(dir.path());
    store
        .insert_claim(&NewClaim {
            food_id: 104,
            receiver_id: 10,
            status: "Pending".into(),
            timestamp: date("2025-03-07").and_hms_opt(8, 0, 0).unwrap(),
        })
        .unwrap();
    assert_eq!(store.table_counts().unwrap().claims, 4);
    store.close().unwrap();

    let store = loaded_store(dir.path());
    assert_eq!(store.table_counts().unwrap().claims, 3);
}

#[test]
fn failed_load_keeps_previous_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("food_waste.db");
    load(&fixture_dataset(), &path).unwrap();

    // A claim that slipped past FK filtering must trip the store constraint.
    let mut broken = fixture_dataset();
    broken.claims.accepted.push(Claim {
        source: SourceRow { line: 99, values: vec![] },
        claim_id: Coerced::Present(50),
        food_id: Coerced::Present(4242),
        receiver_id: Coerced::Present(10),
        status: "Pending".into(),
        timestamp: Coerced::Present(date("2025-03-05").and_hms_opt(0, 0, 0).unwrap()),
    });
    let err = load(&broken, &path).unwrap_err();
    assert!(matches!(err, StoreError::Integrity { ref table, .. } if table == "Claims"), "{err}");

    let store = Store::open(&path).unwrap();
    assert_eq!(store.table_counts().unwrap().claims, 3);
    assert!(!dir.path().join("food_waste.db.tmp").exists());
}

#[test]
fn missing_value_reaching_the_store_is_fatal() {
    let dir = tempdir().unwrap();
    let mut broken = fixture_dataset();
    broken.food_listings.accepted[0].quantity = Coerced::Missing;
    let err = load(&broken, &dir.path().join("food_waste.db")).unwrap_err();
    assert!(matches!(err, StoreError::Integrity { ref table, .. } if table == "Food_Listings"), "{err}");
    assert!(!dir.path().join("food_waste.db").exists());
}

#[test]
fn open_missing_store_fails() {
    let dir = tempdir().unwrap();
    let err = Store::open(&dir.path().join("absent.db")).err().unwrap();
    assert!(matches!(err, StoreError::Io { .. }));
    assert!(!dir.path().join("absent.db").exists());
}

// -------------------------------------------------------------------------
// Reports
// -------------------------------------------------------------------------

fn status_dataset() -> CleanDataset {
    let mut claims = String::from("Claim_ID,Food_ID,Receiver_ID,Status,Timestamp\n");
    let mut statuses = vec!["Completed"; 6];
    statuses.extend(["Pending"; 3]);
    statuses.push("Canceled");
    for (i, status) in statuses.into_iter().enumerate() {
        claims.push_str(&format!("{},1,1,{status},2025-03-0{} 09:00:00\n", i + 1, i % 3 + 1));
    }
    let raw = RawDataset {
        providers: RawTable::from_csv_str(
            Table::Providers,
            "Provider_ID,Name,Type,Address,City,Contact\n1,Acme,Restaurant,1 Main St,Springfield,555\n",
        )
        .unwrap(),
        receivers: RawTable::from_csv_str(Table::Receivers, "Receiver_ID,Name,Type,City,Contact\n1,Shelter,Ngo,Springfield,555\n")
            .unwrap(),
        food_listings: RawTable::from_csv_str(
            Table::FoodListings,
            "Food_ID,Food_Name,Quantity,Expiry_Date,Provider_ID,Provider_Type,Location,Food_Type,Meal_Type\n\
             1,Bread,4,2025-03-17,1,Restaurant,Springfield,Vegan,Lunch\n",
        )
        .unwrap(),
        claims: RawTable::from_csv_str(Table::Claims, &claims).unwrap(),
    };
    run(&raw, &Vocabularies::default()).unwrap()
}

#[test]
fn claim_status_distribution_percentages() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("food_waste.db");
    load(&status_dataset(), &path).unwrap();
    let store = Store::open(&path).unwrap();

    let shares = store.claim_status_distribution().unwrap();
    let got: Vec<(&str, i64, f64)> = shares
        .iter()
        .map(|s| (s.status.as_str(), s.count, s.percentage))
        .collect();
    assert_eq!(
        got,
        vec![("Completed", 6, 60.0), ("Pending", 3, 30.0), ("Cancelled", 1, 10.0)]
    );
    let total: f64 = shares.iter().map(|s| s.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);

    let table = store.run_report(Report::ClaimStatus, &params("2025-03-17")).unwrap();
    assert_eq!(table.columns, vec!["Status", "Count", "Percentage"]);
    assert_eq!(table.rows[0], vec![Cell::Text("Completed".into()), Cell::Integer(6), Cell::Real(60.0)]);
}

#[test]
fn daily_claims_trend_groups_by_date() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("food_waste.db");
    load(&status_dataset(), &path).unwrap();
    let store = Store::open(&path).unwrap();

    let table = store.run_report(Report::DailyClaims, &params("2025-03-17")).unwrap();
    let counts: Vec<(String, i64)> = table
        .rows
        .iter()
        .map(|r| match (&r[0], &r[1]) {
            (Cell::Text(d), Cell::Integer(n)) => (d.clone(), *n),
            other => panic!("unexpected row {other:?}"),
        })
        .collect();
    assert_eq!(
        counts,
        vec![
            ("2025-03-01".to_string(), 4),
            ("2025-03-02".to_string(), 3),
            ("2025-03-03".to_string(), 3)
        ]
    );
}

#[test]
fn expiring_soon_uses_inclusive_two_day_window() {
    let dir = tempdir().unwrap();
    let store = loaded_store(dir.path());

    let table = store.run_report(Report::ExpiringSoon, &params("2025-03-18")).unwrap();
    let ids: Vec<Cell> = table.rows.iter().map(|r| r[0].clone()).collect();
    assert_eq!(ids, vec![Cell::Integer(104), Cell::Integer(105)]);

    let table = store.run_report(Report::ExpiringSoon, &params("2025-03-17")).unwrap();
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0][0], Cell::Integer(100));
}

#[test]
fn providers_per_city_orders_and_filters() {
    let dir = tempdir().unwrap();
    let store = loaded_store(dir.path());

    let all = store.run_report(Report::ProvidersPerCity, &params("2025-03-17")).unwrap();
    let cities: Vec<Cell> = all.rows.iter().map(|r| r[0].clone()).collect();
    assert_eq!(
        cities,
        vec![
            Cell::Text("Capital City".into()),
            Cell::Text("Shelbyville".into()),
            Cell::Text("Springfield".into())
        ]
    );

    let filtered = store
        .run_report(
            Report::ProvidersPerCity,
            &ReportParams {
                city: Some("Springfield".into()),
                today: date("2025-03-17"),
            },
        )
        .unwrap();
    assert_eq!(filtered.rows, vec![vec![Cell::Text("Springfield".into()), Cell::Integer(1)]]);
}

#[test]
fn provider_contacts_requires_city() {
    let dir = tempdir().unwrap();
    let store = loaded_store(dir.path());
    let err = store.run_report(Report::ProviderContacts, &params("2025-03-17")).unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn every_report_runs_against_the_schema() {
    let dir = tempdir().unwrap();
    let store = loaded_store(dir.path());
    let p = ReportParams {
        city: Some("Springfield".into()),
        today: date("2025-03-17"),
    };
    for report in Report::ALL {
        let table = store.run_report(report, &p).unwrap();
        assert!(!table.columns.is_empty(), "{}", report.name());
    }

    let total = store.run_report(Report::TotalQuantity, &p).unwrap();
    assert_eq!(total.rows, vec![vec![Cell::Integer(25)]]);
}

#[test]
fn listings_filter_and_options() {
    let dir = tempdir().unwrap();
    let store = loaded_store(dir.path());

    let vegan = store
        .listings(&ListingFilter {
            food_type: Some("Vegan".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(vegan.iter().map(|l| l.food_id).collect::<Vec<_>>(), vec![104]);

    let springfield = store
        .listings(&ListingFilter {
            city: Some("Springfield".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(springfield.len(), 1);
    assert_eq!(springfield[0].food_name, "Bread");

    let options = store.filter_options().unwrap();
    assert_eq!(options.cities, vec!["Capital City", "Shelbyville", "Springfield"]);
    assert_eq!(options.meal_types, vec!["Breakfast", "Dinner", "Snacks"]);
    assert_eq!(options.providers[0], (1, "Acme Diner".to_string()));
}

#[test]
fn provider_lookup() {
    let dir = tempdir().unwrap();
    let store = loaded_store(dir.path());

    let seven = store.provider(7).unwrap().unwrap();
    assert_eq!(seven.name, "Seven Grocers");
    assert_eq!(seven.provider_type, "Grocery Store");
    assert_eq!(seven.city, "Shelbyville");
    assert!(store.provider(999).unwrap().is_none());
}

// -------------------------------------------------------------------------
// Writes
// -------------------------------------------------------------------------

fn listing(provider_id: i64, quantity: i64) -> NewListing {
    NewListing {
        food_name: "Soup".into(),
        quantity,
        expiry_date: date("2025-03-21"),
        provider_id,
        provider_type: "Restaurant".into(),
        location: "Springfield".into(),
        food_type: "Vegan".into(),
        meal_type: "Dinner".into(),
    }
}

#[test]
fn insert_listing_assigns_next_id() {
    let dir = tempdir().unwrap();
    let mut store = loaded_store(dir.path());
    assert_eq!(store.insert_listing(&listing(1, 3)).unwrap(), 106);
    assert_eq!(store.insert_listing(&listing(7, 0)).unwrap(), 107);
    assert_eq!(store.table_counts().unwrap().food_listings, 5);
}

#[test]
fn writes_violating_constraints_are_rejected() {
    let dir = tempdir().unwrap();
    let mut store = loaded_store(dir.path());

    let err = store.insert_listing(&listing(999, 3)).unwrap_err();
    assert!(matches!(err, StoreError::Rejected(_)), "{err}");

    let err = store.insert_listing(&listing(1, -1)).unwrap_err();
    assert!(matches!(err, StoreError::Rejected(_)));

    let err = store
        .insert_claim(&NewClaim {
            food_id: 102,
            receiver_id: 10,
            status: "Pending".into(),
            timestamp: date("2025-03-07").and_hms_opt(8, 0, 0).unwrap(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Rejected(_)));

    assert_eq!(store.table_counts().unwrap().food_listings, 3);
    assert_eq!(store.table_counts().unwrap().claims, 3);
    assert!(store.foreign_key_violations().unwrap().is_empty());
}

#[test]
fn insert_claim_assigns_next_id() {
    let dir = tempdir().unwrap();
    let mut store = loaded_store(dir.path());
    let id = store
        .insert_claim(&NewClaim {
            food_id: 104,
            receiver_id: 12,
            status: "Pending".into(),
            timestamp: date("2025-03-07").and_hms_opt(8, 30, 0).unwrap(),
        })
        .unwrap();
    assert_eq!(id, 7);
}

#[test]
fn update_quantity_and_delete_claim() {
    let dir = tempdir().unwrap();
    let mut store = loaded_store(dir.path());

    assert_eq!(store.update_listing_quantity(104, 2).unwrap(), 12);
    let rows = store.listings(&ListingFilter::default()).unwrap();
    assert_eq!(rows.iter().find(|l| l.food_id == 104).unwrap().quantity, 2);

    assert!(matches!(
        store.update_listing_quantity(104, -3),
        Err(StoreError::Rejected(_))
    ));
    assert!(matches!(
        store.update_listing_quantity(4242, 1),
        Err(StoreError::NotFound { id: 4242, .. })
    ));

    store.delete_claim(3).unwrap();
    assert_eq!(store.table_counts().unwrap().claims, 2);
    assert!(matches!(store.delete_claim(3), Err(StoreError::NotFound { .. })));
}

// Relational schema of the food donation store

use rusqlite::Connection;

/// Table and column names are part of the reporting contract; do not rename.
pub const SCHEMA: &str = r#"
CREATE TABLE Providers (
    Provider_ID INTEGER PRIMARY KEY,
    Name TEXT NOT NULL,
    Type TEXT NOT NULL,
    Address TEXT NOT NULL,
    City TEXT NOT NULL,
    Contact TEXT NOT NULL
);

CREATE TABLE Receivers (
    Receiver_ID INTEGER PRIMARY KEY,
    Name TEXT NOT NULL,
    Type TEXT NOT NULL,
    City TEXT NOT NULL,
    Contact TEXT NOT NULL
);

CREATE TABLE Food_Listings (
    Food_ID INTEGER PRIMARY KEY,
    Food_Name TEXT NOT NULL,
    Quantity INTEGER NOT NULL CHECK (Quantity >= 0),
    Expiry_Date DATE NOT NULL,
    Provider_ID INTEGER NOT NULL,
    Provider_Type TEXT NOT NULL,
    Location TEXT NOT NULL,
    Food_Type TEXT NOT NULL,
    Meal_Type TEXT NOT NULL,
    FOREIGN KEY (Provider_ID) REFERENCES Providers(Provider_ID)
);

CREATE TABLE Claims (
    Claim_ID INTEGER PRIMARY KEY,
    Food_ID INTEGER NOT NULL,
    Receiver_ID INTEGER NOT NULL,
    Status TEXT NOT NULL,
    Timestamp DATETIME NOT NULL,
    FOREIGN KEY (Food_ID) REFERENCES Food_Listings(Food_ID),
    FOREIGN KEY (Receiver_ID) REFERENCES Receivers(Receiver_ID)
);

CREATE INDEX idx_food_provider ON Food_Listings(Provider_ID);
CREATE INDEX idx_claims_food ON Claims(Food_ID);
CREATE INDEX idx_claims_receiver ON Claims(Receiver_ID);
"#;

/// Turn on FK enforcement for this connection. SQLite defaults it to off.
pub fn enable_foreign_keys(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

pub fn create(conn: &Connection) -> rusqlite::Result<()> {
    enable_foreign_keys(conn)?;
    conn.execute_batch(SCHEMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_declares_fk_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        create(&conn).unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%' ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec!["idx_claims_food", "idx_claims_receiver", "idx_food_provider"]);

        let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(fk, 1);
    }
}

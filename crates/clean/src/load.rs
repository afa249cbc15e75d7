use crate::error::CleanError;
use crate::model::{Claim, FoodListing, Provider, Receiver, SourceRow, Table};
use crate::normalize::{coerce_date, coerce_integer, coerce_timestamp, normalize_text};
use crate::vocab::Vocabularies;

/// One input table exactly as read: trimmed headers plus raw records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub table: Table,
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
}

/// The four raw inputs of a run.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub providers: RawTable,
    pub receivers: RawTable,
    pub food_listings: RawTable,
    pub claims: RawTable,
}

impl RawDataset {
    pub fn tables(&self) -> [&RawTable; 4] {
        [&self.providers, &self.receivers, &self.food_listings, &self.claims]
    }
}

impl RawTable {
    /// Parse CSV text. Header names are trimmed; short records are padded with
    /// empty fields so every row lines up with the headers.
    pub fn from_csv_str(table: Table, csv_data: &str) -> Result<Self, CleanError> {
        let csv_err = |e: csv::Error| CleanError::Csv {
            table: table.name().into(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let line = record.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
            let mut values: Vec<String> = record.iter().map(str::to_string).collect();
            values.resize(headers.len().max(values.len()), String::new());
            rows.push(SourceRow { line, values });
        }

        Ok(Self { table, headers, rows })
    }

    /// Fails with every absent required column, sorted, if any is missing.
    pub fn require_columns(&self) -> Result<ColumnIndex, CleanError> {
        let mut missing: Vec<String> = Vec::new();
        let mut positions = Vec::with_capacity(self.table.columns().len());
        for name in self.table.columns() {
            match self.headers.iter().position(|h| h == name) {
                Some(i) => positions.push(i),
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            missing.sort();
            return Err(CleanError::MissingColumns {
                table: self.table.name().into(),
                columns: missing,
            });
        }
        Ok(ColumnIndex { positions })
    }
}

/// Positions of a table's required columns within its source headers,
/// in `Table::columns()` order.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: Vec<usize>,
}

impl ColumnIndex {
    fn get<'a>(&self, row: &'a SourceRow, column: usize) -> &'a str {
        row.values
            .get(self.positions[column])
            .map(String::as_str)
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Typed conversion (normalize + canonicalize)
// ---------------------------------------------------------------------------

pub fn providers(raw: &RawTable) -> Result<Vec<Provider>, CleanError> {
    let idx = raw.require_columns()?;
    Ok(raw
        .rows
        .iter()
        .map(|row| Provider {
            provider_id: coerce_integer(idx.get(row, 0)),
            name: normalize_text(idx.get(row, 1), false),
            kind: normalize_text(idx.get(row, 2), true),
            address: normalize_text(idx.get(row, 3), false),
            city: normalize_text(idx.get(row, 4), true),
            contact: normalize_text(idx.get(row, 5), false),
            source: row.clone(),
        })
        .collect())
}

pub fn receivers(raw: &RawTable) -> Result<Vec<Receiver>, CleanError> {
    let idx = raw.require_columns()?;
    Ok(raw
        .rows
        .iter()
        .map(|row| Receiver {
            receiver_id: coerce_integer(idx.get(row, 0)),
            name: normalize_text(idx.get(row, 1), false),
            kind: normalize_text(idx.get(row, 2), true),
            city: normalize_text(idx.get(row, 3), true),
            contact: normalize_text(idx.get(row, 4), false),
            source: row.clone(),
        })
        .collect())
}

pub fn food_listings(raw: &RawTable, vocab: &Vocabularies) -> Result<Vec<FoodListing>, CleanError> {
    let idx = raw.require_columns()?;
    let text = |row: &SourceRow, col: usize| normalize_text(idx.get(row, col), true);
    Ok(raw
        .rows
        .iter()
        .map(|row| FoodListing {
            food_id: coerce_integer(idx.get(row, 0)),
            food_name: text(row, 1),
            quantity: coerce_integer(idx.get(row, 2)),
            expiry_date: coerce_date(idx.get(row, 3)),
            provider_id: coerce_integer(idx.get(row, 4)),
            provider_type: vocab.provider_type.canonicalize(&text(row, 5)).to_string(),
            location: text(row, 6),
            food_type: vocab.food_type.canonicalize(&text(row, 7)).to_string(),
            meal_type: vocab.meal_type.canonicalize(&text(row, 8)).to_string(),
            source: row.clone(),
        })
        .collect())
}

pub fn claims(raw: &RawTable, vocab: &Vocabularies) -> Result<Vec<Claim>, CleanError> {
    let idx = raw.require_columns()?;
    Ok(raw
        .rows
        .iter()
        .map(|row| Claim {
            claim_id: coerce_integer(idx.get(row, 0)),
            food_id: coerce_integer(idx.get(row, 1)),
            receiver_id: coerce_integer(idx.get(row, 2)),
            status: vocab
                .status
                .canonicalize(&normalize_text(idx.get(row, 3), true))
                .to_string(),
            timestamp: coerce_timestamp(idx.get(row, 4)),
            source: row.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coerced;

    #[test]
    fn trims_headers_and_pads_short_rows() {
        let csv = " Provider_ID ,Name,Type,Address,City,Contact\n1,Acme,restaurant,1 Main St\n";
        let raw = RawTable::from_csv_str(Table::Providers, csv).unwrap();
        assert_eq!(raw.headers[0], "Provider_ID");
        assert_eq!(raw.rows[0].values.len(), 6);
        assert_eq!(raw.rows[0].line, 2);

        let rows = providers(&raw).unwrap();
        assert_eq!(rows[0].kind, "Restaurant");
        assert_eq!(rows[0].city, "");
    }

    #[test]
    fn missing_columns_are_fatal_and_listed() {
        let csv = "Claim_ID,Food_ID,Status\n1,2,Pending\n";
        let raw = RawTable::from_csv_str(Table::Claims, csv).unwrap();
        let err = claims(&raw, &Vocabularies::default()).unwrap_err();
        match err {
            CleanError::MissingColumns { table, columns } => {
                assert_eq!(table, "Claims");
                assert_eq!(columns, vec!["Receiver_ID", "Timestamp"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn columns_found_in_any_order() {
        let csv = "Status,Timestamp,Receiver_ID,Food_ID,Claim_ID,Note\n\
                   canceled,2025-03-05 10:00:00,4,3,9,late\n";
        let raw = RawTable::from_csv_str(Table::Claims, csv).unwrap();
        let rows = claims(&raw, &Vocabularies::default()).unwrap();
        assert_eq!(rows[0].claim_id, Coerced::Present(9));
        assert_eq!(rows[0].food_id, Coerced::Present(3));
        assert_eq!(rows[0].status, "Cancelled");
        assert_eq!(rows[0].source.values[5], "late");
    }

    #[test]
    fn food_fields_are_normalized_and_canonicalized() {
        let csv = "Food_ID,Food_Name,Quantity,Expiry_Date,Provider_ID,Provider_Type,Location,Food_Type,Meal_Type\n\
                   1,  whole  wheat bread ,12.0,3/17/2025,4,grocery store,  new carol,non vegetarian,snack\n";
        let raw = RawTable::from_csv_str(Table::FoodListings, csv).unwrap();
        let rows = food_listings(&raw, &Vocabularies::default()).unwrap();
        let f = &rows[0];
        assert_eq!(f.food_name, "Whole Wheat Bread");
        assert_eq!(f.quantity, Coerced::Present(12));
        assert_eq!(f.provider_type, "Grocery Store");
        assert_eq!(f.location, "New Carol");
        assert_eq!(f.food_type, "Non-Vegetarian");
        assert_eq!(f.meal_type, "Snacks");
    }
}

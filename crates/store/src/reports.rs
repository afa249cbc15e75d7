// Read contract: canned aggregate reports, counts, filtered listings

use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{OptionalExtension, ToSql};
use serde::Serialize;

use foodshare_clean::model::DATE_FORMAT;

use crate::error::StoreError;
use crate::handle::Store;

// ---------------------------------------------------------------------------
// Report catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    ProvidersPerCity,
    ReceiversPerCity,
    ProviderTypeListings,
    ProviderContacts,
    TopReceivers,
    TotalQuantity,
    ListingsPerCity,
    FoodTypes,
    ClaimsPerFood,
    TopProvidersCompleted,
    ClaimStatus,
    AvgClaimedQuantity,
    MealTypeClaims,
    QuantityByProvider,
    ExpiringSoon,
    DailyClaims,
}

impl Report {
    pub const ALL: [Report; 16] = [
        Report::ProvidersPerCity,
        Report::ReceiversPerCity,
        Report::ProviderTypeListings,
        Report::ProviderContacts,
        Report::TopReceivers,
        Report::TotalQuantity,
        Report::ListingsPerCity,
        Report::FoodTypes,
        Report::ClaimsPerFood,
        Report::TopProvidersCompleted,
        Report::ClaimStatus,
        Report::AvgClaimedQuantity,
        Report::MealTypeClaims,
        Report::QuantityByProvider,
        Report::ExpiringSoon,
        Report::DailyClaims,
    ];

    /// Command-line name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProvidersPerCity => "providers-per-city",
            Self::ReceiversPerCity => "receivers-per-city",
            Self::ProviderTypeListings => "provider-type-listings",
            Self::ProviderContacts => "provider-contacts",
            Self::TopReceivers => "top-receivers",
            Self::TotalQuantity => "total-quantity",
            Self::ListingsPerCity => "listings-per-city",
            Self::FoodTypes => "food-types",
            Self::ClaimsPerFood => "claims-per-food",
            Self::TopProvidersCompleted => "top-providers-completed",
            Self::ClaimStatus => "claim-status",
            Self::AvgClaimedQuantity => "avg-claimed-quantity",
            Self::MealTypeClaims => "meal-type-claims",
            Self::QuantityByProvider => "quantity-by-provider",
            Self::ExpiringSoon => "expiring-soon",
            Self::DailyClaims => "daily-claims",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ProvidersPerCity => "Providers per city",
            Self::ReceiversPerCity => "Receivers per city",
            Self::ProviderTypeListings => "Listings contributed per provider type",
            Self::ProviderContacts => "Provider contacts in a city",
            Self::TopReceivers => "Top receivers by total claims",
            Self::TotalQuantity => "Total quantity available",
            Self::ListingsPerCity => "Cities with the most listings",
            Self::FoodTypes => "Most common food types",
            Self::ClaimsPerFood => "Claims per food item",
            Self::TopProvidersCompleted => "Providers with the most completed claims",
            Self::ClaimStatus => "Claim status distribution (%)",
            Self::AvgClaimedQuantity => "Average claimed quantity per receiver",
            Self::MealTypeClaims => "Claims per meal type",
            Self::QuantityByProvider => "Total quantity donated per provider",
            Self::ExpiringSoon => "Listings expiring within two days",
            Self::DailyClaims => "Daily claims trend",
        }
    }

    pub fn from_name(name: &str) -> Option<Report> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Reports that cannot run without a city.
    pub fn requires_city(&self) -> bool {
        matches!(self, Self::ProviderContacts)
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::ProvidersPerCity => {
                "SELECT City, COUNT(*) AS Total_Providers
                 FROM Providers
                 WHERE :city IS NULL OR City = :city
                 GROUP BY City
                 ORDER BY Total_Providers DESC, City ASC"
            }
            Self::ReceiversPerCity => {
                "SELECT City, COUNT(*) AS Total_Receivers
                 FROM Receivers
                 WHERE :city IS NULL OR City = :city
                 GROUP BY City
                 ORDER BY Total_Receivers DESC, City ASC"
            }
            Self::ProviderTypeListings => {
                "SELECT Provider_Type, COUNT(*) AS Total_Listings
                 FROM Food_Listings
                 GROUP BY Provider_Type
                 ORDER BY Total_Listings DESC, Provider_Type ASC"
            }
            Self::ProviderContacts => {
                "SELECT Name, Type, Address, Contact
                 FROM Providers
                 WHERE City = :city
                 ORDER BY Name ASC, Provider_ID ASC"
            }
            Self::TopReceivers => {
                "SELECT r.Receiver_ID, r.Name, COUNT(*) AS Total_Claims
                 FROM Claims c
                 JOIN Receivers r ON r.Receiver_ID = c.Receiver_ID
                 GROUP BY r.Receiver_ID, r.Name
                 ORDER BY Total_Claims DESC, r.Receiver_ID ASC
                 LIMIT 15"
            }
            Self::TotalQuantity => {
                "SELECT COALESCE(SUM(Quantity), 0) AS Total_Quantity FROM Food_Listings"
            }
            Self::ListingsPerCity => {
                "SELECT Location AS City, COUNT(*) AS Listings
                 FROM Food_Listings
                 GROUP BY Location
                 ORDER BY Listings DESC, City ASC
                 LIMIT 10"
            }
            Self::FoodTypes => {
                "SELECT Food_Type, COUNT(*) AS Listings
                 FROM Food_Listings
                 GROUP BY Food_Type
                 ORDER BY Listings DESC, Food_Type ASC"
            }
            Self::ClaimsPerFood => {
                "SELECT f.Food_ID, f.Food_Name, COUNT(c.Claim_ID) AS Claims_Count
                 FROM Food_Listings f
                 LEFT JOIN Claims c ON c.Food_ID = f.Food_ID
                 GROUP BY f.Food_ID, f.Food_Name
                 ORDER BY Claims_Count DESC, f.Food_ID ASC
                 LIMIT 20"
            }
            Self::TopProvidersCompleted => {
                "SELECT p.Provider_ID, p.Name, COUNT(*) AS Completed_Claims
                 FROM Claims c
                 JOIN Food_Listings f ON f.Food_ID = c.Food_ID
                 JOIN Providers p ON p.Provider_ID = f.Provider_ID
                 WHERE c.Status = 'Completed'
                 GROUP BY p.Provider_ID, p.Name
                 ORDER BY Completed_Claims DESC, p.Provider_ID ASC
                 LIMIT 10"
            }
            Self::ClaimStatus => {
                "WITH totals AS (SELECT COUNT(*) AS total FROM Claims)
                 SELECT Status, COUNT(*) AS Count,
                        ROUND(100.0 * COUNT(*) / (SELECT total FROM totals), 2) AS Percentage
                 FROM Claims
                 GROUP BY Status
                 ORDER BY Count DESC, Status ASC"
            }
            Self::AvgClaimedQuantity => {
                "WITH claim_qty AS (
                   SELECT c.Claim_ID, c.Receiver_ID, f.Quantity
                   FROM Claims c
                   JOIN Food_Listings f ON f.Food_ID = c.Food_ID
                 )
                 SELECT r.Receiver_ID, r.Name,
                        ROUND(AVG(claim_qty.Quantity), 2) AS Avg_Claimed_Quantity
                 FROM claim_qty
                 JOIN Receivers r ON r.Receiver_ID = claim_qty.Receiver_ID
                 GROUP BY r.Receiver_ID, r.Name
                 ORDER BY Avg_Claimed_Quantity DESC, r.Receiver_ID ASC
                 LIMIT 20"
            }
            Self::MealTypeClaims => {
                "SELECT f.Meal_Type, COUNT(*) AS Claims_Count
                 FROM Claims c
                 JOIN Food_Listings f ON c.Food_ID = f.Food_ID
                 GROUP BY f.Meal_Type
                 ORDER BY Claims_Count DESC, f.Meal_Type ASC"
            }
            Self::QuantityByProvider => {
                "SELECT p.Provider_ID, p.Name, SUM(f.Quantity) AS Total_Quantity_Donated
                 FROM Providers p
                 JOIN Food_Listings f ON f.Provider_ID = p.Provider_ID
                 GROUP BY p.Provider_ID, p.Name
                 ORDER BY Total_Quantity_Donated DESC, p.Provider_ID ASC
                 LIMIT 20"
            }
            Self::ExpiringSoon => {
                "SELECT Food_ID, Food_Name, Quantity, Expiry_Date, Location
                 FROM Food_Listings
                 WHERE julianday(Expiry_Date) - julianday(:today) BETWEEN 0 AND 2
                 ORDER BY Expiry_Date ASC, Food_ID ASC"
            }
            Self::DailyClaims => {
                "SELECT DATE(Timestamp) AS Claim_Date, COUNT(*) AS Claims_Count
                 FROM Claims
                 GROUP BY DATE(Timestamp)
                 ORDER BY Claim_Date ASC"
            }
        }
    }
}

/// Inputs a report may use. Unused fields are ignored.
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub city: Option<String>,
    /// Reference day for the expiry window.
    pub today: NaiveDate,
}

/// One SQL value as returned by a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(x) => write!(f, "{x:.2}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(n) => Self::Integer(n),
            ValueRef::Real(x) => Self::Real(x),
            ValueRef::Text(t) | ValueRef::Blob(t) => Self::Text(String::from_utf8_lossy(t).into_owned()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub report: &'static str,
    pub title: &'static str,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

// ---------------------------------------------------------------------------
// Typed rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub providers: i64,
    pub receivers: i64,
    pub food_listings: i64,
    pub claims: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusShare {
    pub status: String,
    pub count: i64,
    /// Percentage of all claims, rounded to two decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub city: Option<String>,
    pub food_type: Option<String>,
    pub meal_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRow {
    pub food_id: i64,
    pub food_name: String,
    pub quantity: i64,
    pub expiry_date: String,
    pub provider_id: i64,
    pub provider_type: String,
    pub city: String,
    pub food_type: String,
    pub meal_type: String,
}

/// A provider's type and city, used to default new listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub provider_id: i64,
    pub name: String,
    pub provider_type: String,
    pub city: String,
}

/// Distinct values offered as listing filters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOptions {
    /// Provider cities and listing locations, merged.
    pub cities: Vec<String>,
    pub food_types: Vec<String>,
    pub meal_types: Vec<String>,
    /// `(id, name)` ordered by name.
    pub providers: Vec<(i64, String)>,
    pub receivers: Vec<(i64, String)>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Store {
    pub fn run_report(&self, report: Report, params: &ReportParams) -> Result<ReportTable, StoreError> {
        if report.requires_city() && params.city.is_none() {
            return Err(StoreError::InvalidInput(format!("report {} requires a city", report.name())));
        }

        let sql = report.sql();
        let city = params.city.as_deref();
        let today = params.today.format(DATE_FORMAT).to_string();
        let mut bound: Vec<(&str, &dyn ToSql)> = Vec::new();
        if sql.contains(":city") {
            bound.push((":city", &city as &dyn ToSql));
        }
        if sql.contains(":today") {
            bound.push((":today", &today as &dyn ToSql));
        }

        let mut stmt = self.conn().prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let mut rows = stmt.query(bound.as_slice())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                cells.push(Cell::from(row.get_ref(i)?));
            }
            out.push(cells);
        }

        Ok(ReportTable {
            report: report.name(),
            title: report.title(),
            columns,
            rows: out,
        })
    }

    pub fn claim_status_distribution(&self) -> Result<Vec<StatusShare>, StoreError> {
        let mut stmt = self.conn().prepare(Report::ClaimStatus.sql())?;
        let rows = stmt.query_map([], |row| {
            Ok(StatusShare {
                status: row.get(0)?,
                count: row.get(1)?,
                percentage: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn table_counts(&self) -> Result<TableCounts, StoreError> {
        let count = |table: &str| -> Result<i64, StoreError> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(self.conn().query_row(&sql, [], |row| row.get(0))?)
        };
        Ok(TableCounts {
            providers: count("Providers")?,
            receivers: count("Receivers")?,
            food_listings: count("Food_Listings")?,
            claims: count("Claims")?,
        })
    }

    /// Listings matching every given filter, soonest expiry first.
    pub fn listings(&self, filter: &ListingFilter) -> Result<Vec<ListingRow>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT Food_ID, Food_Name, Quantity, Expiry_Date, Provider_ID,
                    Provider_Type, Location AS City, Food_Type, Meal_Type
             FROM Food_Listings
             WHERE (:city IS NULL OR Location = :city)
               AND (:ft IS NULL OR Food_Type = :ft)
               AND (:mt IS NULL OR Meal_Type = :mt)
             ORDER BY Expiry_Date ASC, Quantity DESC, Food_ID ASC",
        )?;
        let rows = stmt.query_map(
            rusqlite::named_params! {
                ":city": filter.city.as_deref(),
                ":ft": filter.food_type.as_deref(),
                ":mt": filter.meal_type.as_deref(),
            },
            |row| {
                Ok(ListingRow {
                    food_id: row.get(0)?,
                    food_name: row.get(1)?,
                    quantity: row.get(2)?,
                    expiry_date: row.get(3)?,
                    provider_id: row.get(4)?,
                    provider_type: row.get(5)?,
                    city: row.get(6)?,
                    food_type: row.get(7)?,
                    meal_type: row.get(8)?,
                })
            },
        )?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn provider(&self, provider_id: i64) -> Result<Option<ProviderInfo>, StoreError> {
        let info = self
            .conn()
            .query_row(
                "SELECT Provider_ID, Name, Type, City FROM Providers WHERE Provider_ID = ?1",
                [provider_id],
                |row| {
                    Ok(ProviderInfo {
                        provider_id: row.get(0)?,
                        name: row.get(1)?,
                        provider_type: row.get(2)?,
                        city: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }

    pub fn filter_options(&self) -> Result<FilterOptions, StoreError> {
        let strings = |sql: &str| -> Result<Vec<String>, StoreError> {
            let mut stmt = self.conn().prepare(sql)?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            Ok(rows.collect::<Result<_, _>>()?)
        };
        let pairs = |sql: &str| -> Result<Vec<(i64, String)>, StoreError> {
            let mut stmt = self.conn().prepare(sql)?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            Ok(rows.collect::<Result<_, _>>()?)
        };

        Ok(FilterOptions {
            cities: strings(
                "SELECT City FROM Providers UNION SELECT Location FROM Food_Listings ORDER BY 1",
            )?,
            food_types: strings("SELECT DISTINCT Food_Type FROM Food_Listings ORDER BY 1")?,
            meal_types: strings("SELECT DISTINCT Meal_Type FROM Food_Listings ORDER BY 1")?,
            providers: pairs("SELECT Provider_ID, Name FROM Providers ORDER BY Name, Provider_ID")?,
            receivers: pairs("SELECT Receiver_ID, Name FROM Receivers ORDER BY Name, Receiver_ID")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_names_round_trip() {
        for report in Report::ALL {
            assert_eq!(Report::from_name(report.name()), Some(report));
        }
        assert_eq!(Report::from_name("nope"), None);
    }

    #[test]
    fn cell_rendering() {
        assert_eq!(Cell::Real(60.0).to_string(), "60.00");
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(serde_json::to_string(&Cell::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Cell::Integer(3)).unwrap(), "3");
    }
}

//! `foodshare report`, `listings` and `overview`: read-only store queries.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use foodshare_clean::normalize::normalize_text;
use foodshare_clean::{canonicalize, Vocabularies};
use foodshare_store::{Cell, ListingFilter, Report, ReportParams, Store};

use crate::{print_json, CliError, DEFAULT_DB};

#[derive(Args)]
pub struct ReportOptions {
    #[arg(long, env = "FOODSHARE_DB", default_value = DEFAULT_DB)]
    pub db: PathBuf,

    /// City for city-scoped reports
    #[arg(long)]
    pub city: Option<String>,

    /// Reference day for `expiring-soon` (YYYY-MM-DD, defaults to the local date)
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Output JSON instead of CSV
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ReportEntry {
    name: &'static str,
    title: &'static str,
    requires_city: bool,
}

fn open_store(db: &Path) -> Result<Store, CliError> {
    Store::open(db).map_err(CliError::store)
}

/// Stored cities are title-cased with collapsed whitespace.
fn city_arg(city: Option<String>) -> Option<String> {
    city.map(|c| normalize_text(&c, true))
}

fn write_csv<W: std::io::Write>(out: W, columns: &[String], rows: &[Vec<String>]) -> Result<(), CliError> {
    let mut wtr = csv::Writer::from_writer(out);
    let write_err = |e: csv::Error| CliError::io(format!("cannot write output: {e}"));
    wtr.write_record(columns).map_err(write_err)?;
    for row in rows {
        wtr.write_record(row).map_err(write_err)?;
    }
    wtr.flush().map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
    Ok(())
}

pub fn cmd_report(name: &str, options: ReportOptions) -> Result<(), CliError> {
    if name == "list" {
        return list_reports(options.json);
    }

    let report = Report::from_name(name).ok_or_else(|| {
        CliError::args(format!("unknown report: {name}")).with_hint("run `foodshare report list` for the catalogue")
    })?;

    let params = ReportParams {
        city: city_arg(options.city),
        today: options.today.unwrap_or_else(|| chrono::Local::now().date_naive()),
    };

    let store = open_store(&options.db)?;
    let table = store.run_report(report, &params).map_err(CliError::store)?;

    if options.json {
        return print_json(&table);
    }

    eprintln!("{} ({} rows)", table.title, table.rows.len());
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(Cell::to_string).collect())
        .collect();
    write_csv(std::io::stdout().lock(), &table.columns, &rows)
}

fn list_reports(json_output: bool) -> Result<(), CliError> {
    let entries: Vec<ReportEntry> = Report::ALL
        .iter()
        .map(|r| ReportEntry {
            name: r.name(),
            title: r.title(),
            requires_city: r.requires_city(),
        })
        .collect();

    if json_output {
        return print_json(&entries);
    }

    for entry in &entries {
        let flag = if entry.requires_city { " (--city)" } else { "" };
        println!("{:<26} {}{flag}", entry.name, entry.title);
    }
    Ok(())
}

pub fn cmd_listings(
    db: PathBuf,
    city: Option<String>,
    food_type: Option<String>,
    meal_type: Option<String>,
    json_output: bool,
) -> Result<(), CliError> {
    let vocab = Vocabularies::default();
    let filter = ListingFilter {
        city: city_arg(city),
        food_type: food_type.map(|v| canonicalize(&normalize_text(&v, true), &vocab.food_type)),
        meal_type: meal_type.map(|v| canonicalize(&normalize_text(&v, true), &vocab.meal_type)),
    };

    let store = open_store(&db)?;
    let listings = store.listings(&filter).map_err(CliError::store)?;

    if json_output {
        return print_json(&listings);
    }

    eprintln!("{} listings", listings.len());
    let columns: Vec<String> = [
        "Food_ID", "Food_Name", "Quantity", "Expiry_Date", "Provider_ID", "Provider_Type", "City", "Food_Type",
        "Meal_Type",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    let rows: Vec<Vec<String>> = listings
        .iter()
        .map(|l| {
            vec![
                l.food_id.to_string(),
                l.food_name.clone(),
                l.quantity.to_string(),
                l.expiry_date.clone(),
                l.provider_id.to_string(),
                l.provider_type.clone(),
                l.city.clone(),
                l.food_type.clone(),
                l.meal_type.clone(),
            ]
        })
        .collect();
    write_csv(std::io::stdout().lock(), &columns, &rows)
}

pub fn cmd_overview(db: PathBuf, json_output: bool) -> Result<(), CliError> {
    #[derive(Serialize)]
    struct Overview {
        counts: foodshare_store::TableCounts,
        filters: foodshare_store::FilterOptions,
    }

    let store = open_store(&db)?;
    let overview = Overview {
        counts: store.table_counts().map_err(CliError::store)?,
        filters: store.filter_options().map_err(CliError::store)?,
    };

    if json_output {
        return print_json(&overview);
    }

    let c = &overview.counts;
    println!("providers:     {}", c.providers);
    println!("receivers:     {}", c.receivers);
    println!("food_listings: {}", c.food_listings);
    println!("claims:        {}", c.claims);
    println!("cities:        {}", overview.filters.cities.join(", "));
    println!("food types:    {}", overview.filters.food_types.join(", "));
    println!("meal types:    {}", overview.filters.meal_types.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_argument_matches_stored_form() {
        assert_eq!(city_arg(Some("  capital   city ".into())), Some("Capital City".into()));
        assert_eq!(city_arg(None), None);
    }

    #[test]
    fn csv_output_quotes_fields() {
        let mut buf = Vec::new();
        let columns = vec!["City".to_string(), "Total".to_string()];
        let rows = vec![vec!["Springfield, IL".to_string(), "3".to_string()]];
        write_csv(&mut buf, &columns, &rows).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "City,Total\n\"Springfield, IL\",3\n");
    }
}

//! `foodshare listing` / `foodshare claim`: single-row writes against the store.
//!
//! Text arguments pass through the same normalization and vocabularies as
//! the cleaning pipeline, so written rows look like loaded ones.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::Subcommand;
use serde_json::json;

use foodshare_clean::normalize::{coerce_date, coerce_timestamp, normalize_text};
use foodshare_clean::{canonicalize, Vocabularies};
use foodshare_store::{NewClaim, NewListing, Store};

use crate::{print_json, CliError, DEFAULT_DB};

#[derive(Subcommand)]
pub enum ListingCommands {
    /// Add a listing; it gets the next free Food_ID
    #[command(after_help = "\
Examples:
  foodshare listing add --name Bread --quantity 10 --expiry 2025-03-20 --provider 1 \\
      --food-type vegetarian --meal-type breakfast
  foodshare listing add --name Soup --quantity 4 --expiry 2025-03-21 --provider 3 \\
      --food-type vegan --meal-type lunch --location Springfield --json")]
    Add {
        #[arg(long, env = "FOODSHARE_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,

        /// Expiry date (YYYY-MM-DD and the other accepted input formats)
        #[arg(long)]
        expiry: String,

        #[arg(long)]
        provider: i64,

        /// Defaults to the provider's Type
        #[arg(long)]
        provider_type: Option<String>,

        /// Defaults to the provider's City
        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        food_type: String,

        #[arg(long)]
        meal_type: String,

        #[arg(long)]
        json: bool,
    },

    /// Set a listing's quantity
    #[command(after_help = "\
Examples:
  foodshare listing set-quantity 104 6")]
    SetQuantity {
        #[arg(long, env = "FOODSHARE_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        food_id: i64,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ClaimCommands {
    /// Record a claim; it gets the next free Claim_ID
    #[command(after_help = "\
Examples:
  foodshare claim add --food 104 --receiver 11
  foodshare claim add --food 105 --receiver 12 --status completed --at '2025-03-06 09:30:00'")]
    Add {
        #[arg(long, env = "FOODSHARE_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        #[arg(long)]
        food: i64,

        #[arg(long)]
        receiver: i64,

        #[arg(long, default_value = "Pending")]
        status: String,

        /// Claim time; defaults to the local time now
        #[arg(long)]
        at: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Delete a claim by id
    Delete {
        #[arg(long, env = "FOODSHARE_DB", default_value = DEFAULT_DB)]
        db: PathBuf,

        claim_id: i64,
    },
}

fn vocab_value(raw: &str, vocabulary: &foodshare_clean::Vocabulary) -> String {
    canonicalize(&normalize_text(raw, true), vocabulary)
}

fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    coerce_date(raw)
        .present()
        .ok_or_else(|| CliError::args(format!("not a date: {raw:?}")))
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, CliError> {
    coerce_timestamp(raw)
        .present()
        .ok_or_else(|| CliError::args(format!("not a timestamp: {raw:?}")))
}

pub fn cmd_listing(cmd: ListingCommands) -> Result<(), CliError> {
    match cmd {
        ListingCommands::Add {
            db,
            name,
            quantity,
            expiry,
            provider,
            provider_type,
            location,
            food_type,
            meal_type,
            json,
        } => {
            let vocab = Vocabularies::default();
            let expiry_date = parse_date(&expiry)?;
            let mut store = Store::open(&db).map_err(CliError::store)?;

            // Unknown providers fall through to the insert, which rejects the FK.
            let info = store.provider(provider).map_err(CliError::store)?;
            let provider_type = match (provider_type, &info) {
                (Some(t), _) => vocab_value(&t, &vocab.provider_type),
                (None, Some(info)) => info.provider_type.clone(),
                (None, None) => String::new(),
            };
            let location = match (location, &info) {
                (Some(l), _) => normalize_text(&l, true),
                (None, Some(info)) => info.city.clone(),
                (None, None) => String::new(),
            };

            let listing = NewListing {
                food_name: normalize_text(&name, true),
                quantity,
                expiry_date,
                provider_id: provider,
                provider_type,
                location,
                food_type: vocab_value(&food_type, &vocab.food_type),
                meal_type: vocab_value(&meal_type, &vocab.meal_type),
            };
            let food_id = store.insert_listing(&listing).map_err(CliError::store)?;

            if json {
                print_json(&json!({ "food_id": food_id }))?;
            }
            eprintln!("added listing {food_id}: {} x{}", listing.food_name, listing.quantity);
            Ok(())
        }
        ListingCommands::SetQuantity { db, food_id, quantity, json } => {
            let mut store = Store::open(&db).map_err(CliError::store)?;
            let previous = store
                .update_listing_quantity(food_id, quantity)
                .map_err(CliError::store)?;

            if json {
                print_json(&json!({ "food_id": food_id, "previous": previous, "quantity": quantity }))?;
            }
            eprintln!("listing {food_id}: quantity {previous} -> {quantity}");
            Ok(())
        }
    }
}

pub fn cmd_claim(cmd: ClaimCommands) -> Result<(), CliError> {
    match cmd {
        ClaimCommands::Add { db, food, receiver, status, at, json } => {
            let vocab = Vocabularies::default();
            let timestamp = match at {
                Some(raw) => parse_timestamp(&raw)?,
                None => chrono::Local::now().naive_local(),
            };

            let mut store = Store::open(&db).map_err(CliError::store)?;
            let claim = NewClaim {
                food_id: food,
                receiver_id: receiver,
                status: vocab_value(&status, &vocab.status),
                timestamp,
            };
            let claim_id = store.insert_claim(&claim).map_err(CliError::store)?;

            if json {
                print_json(&json!({ "claim_id": claim_id }))?;
            }
            eprintln!("added claim {claim_id}: listing {food} -> receiver {receiver} ({})", claim.status);
            Ok(())
        }
        ClaimCommands::Delete { db, claim_id } => {
            let mut store = Store::open(&db).map_err(CliError::store)?;
            store.delete_claim(claim_id).map_err(CliError::store)?;
            eprintln!("deleted claim {claim_id}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_values_are_canonicalized() {
        let vocab = Vocabularies::default();
        assert_eq!(vocab_value(" non vegetarian ", &vocab.food_type), "Non-Vegetarian");
        assert_eq!(vocab_value("canceled", &vocab.status), "Cancelled");
    }

    #[test]
    fn unparseable_dates_are_usage_errors() {
        let err = parse_date("soon").unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert_eq!(parse_date("2025-03-20").unwrap(), NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
    }
}

use log::{info, warn};

use crate::backfill::backfill_locations;
use crate::error::CleanError;
use crate::integrity::{enforce_claim_references, enforce_food_providers};
use crate::load::{self, RawDataset};
use crate::model::{CleanDataset, Partition, TableOutcome};
use crate::validate::{
    drop_duplicate_keys, drop_invalid_expiry, drop_invalid_quantity, drop_invalid_timestamp,
    drop_null, drop_null_keys,
};
use crate::vocab::Vocabularies;

/// Run the whole cleaning pipeline.
///
/// Stage order is fixed: Providers, Receivers, FoodListings (validation, then
/// provider FK), Claims (validation, then food/receiver FK), then Location
/// backfill. A missing required column in any table aborts before any row
/// is processed.
pub fn run(raw: &RawDataset, vocab: &Vocabularies) -> Result<CleanDataset, CleanError> {
    for table in raw.tables() {
        table.require_columns()?;
    }

    // Providers
    let mut providers = TableOutcome::start(
        raw.providers.table,
        raw.providers.headers.clone(),
        load::providers(&raw.providers)?,
    );
    stage(&mut providers, "null Provider_ID", drop_null_keys);
    stage(&mut providers, "duplicate Provider_ID", drop_duplicate_keys);

    // Receivers
    let mut receivers = TableOutcome::start(
        raw.receivers.table,
        raw.receivers.headers.clone(),
        load::receivers(&raw.receivers)?,
    );
    stage(&mut receivers, "null Receiver_ID", drop_null_keys);
    stage(&mut receivers, "duplicate Receiver_ID", drop_duplicate_keys);

    // Food listings
    let mut food = TableOutcome::start(
        raw.food_listings.table,
        raw.food_listings.headers.clone(),
        load::food_listings(&raw.food_listings, vocab)?,
    );
    stage(&mut food, "null Food_ID", drop_null_keys);
    stage(&mut food, "null Provider_ID", |rows| {
        drop_null(rows, "Provider_ID", |f| f.provider_id)
    });
    stage(&mut food, "duplicate Food_ID", drop_duplicate_keys);
    stage(&mut food, "invalid Quantity", drop_invalid_quantity);
    stage(&mut food, "invalid Expiry_Date", drop_invalid_expiry);
    let provider_ids = providers.accepted_keys();
    stage(&mut food, "unknown Provider_ID", |rows| {
        enforce_food_providers(rows, &provider_ids)
    });

    // Claims
    let mut claims = TableOutcome::start(
        raw.claims.table,
        raw.claims.headers.clone(),
        load::claims(&raw.claims, vocab)?,
    );
    stage(&mut claims, "null Claim_ID", drop_null_keys);
    stage(&mut claims, "null Food_ID", |rows| drop_null(rows, "Food_ID", |c| c.food_id));
    stage(&mut claims, "null Receiver_ID", |rows| {
        drop_null(rows, "Receiver_ID", |c| c.receiver_id)
    });
    stage(&mut claims, "duplicate Claim_ID", drop_duplicate_keys);
    stage(&mut claims, "invalid Timestamp", drop_invalid_timestamp);
    let food_ids = food.accepted_keys();
    let receiver_ids = receivers.accepted_keys();
    stage(&mut claims, "bad FK", |rows| {
        enforce_claim_references(rows, &food_ids, &receiver_ids)
    });

    let backfilled_locations = backfill_locations(&mut food.accepted, &providers.accepted);
    if backfilled_locations > 0 {
        info!("{}: filled {backfilled_locations} empty Location values from provider City", food.table);
    }

    let dataset = CleanDataset {
        providers,
        receivers,
        food_listings: food,
        claims,
        backfilled_locations,
    };

    for (table, input, accepted) in [
        (dataset.providers.table, dataset.providers.input_rows, dataset.providers.accepted.len()),
        (dataset.receivers.table, dataset.receivers.input_rows, dataset.receivers.accepted.len()),
        (dataset.food_listings.table, dataset.food_listings.input_rows, dataset.food_listings.accepted.len()),
        (dataset.claims.table, dataset.claims.input_rows, dataset.claims.accepted.len()),
    ] {
        info!("{table}: {accepted} of {input} rows accepted");
    }

    Ok(dataset)
}

fn stage<T>(outcome: &mut TableOutcome<T>, what: &str, f: impl FnOnce(Vec<T>) -> Partition<T>) {
    let before = outcome.rejected.len();
    let count = outcome.apply(f);
    if count > 0 {
        let artifact = outcome
            .rejected
            .get(before)
            .map(|r| r.rule.artifact_name(outcome.table))
            .unwrap_or_default();
        warn!("{}: {count} rows with {what} -> {artifact}", outcome.table);
    }
}

//! Cross-table foreign-key checks against a parent's surviving key set.

use std::collections::HashSet;

use crate::model::{Claim, Coerced, FoodListing, Partition, RejectRule};
use crate::validate::partition;

fn resolves(key: Coerced<i64>, parents: &HashSet<i64>) -> bool {
    match key {
        Coerced::Present(k) => parents.contains(&k),
        Coerced::Missing => false,
    }
}

/// Food listings whose Provider_ID is not among the surviving providers.
pub fn enforce_food_providers(rows: Vec<FoodListing>, provider_ids: &HashSet<i64>) -> Partition<FoodListing> {
    partition(rows, RejectRule::BadForeignKey { column: Some("Provider_ID") }, |f| {
        !resolves(f.provider_id, provider_ids)
    })
}

/// Claims whose Food_ID or Receiver_ID does not resolve. A single coarse rule:
/// the artifact does not say which reference failed.
pub fn enforce_claim_references(
    rows: Vec<Claim>,
    food_ids: &HashSet<i64>,
    receiver_ids: &HashSet<i64>,
) -> Partition<Claim> {
    partition(rows, RejectRule::BadForeignKey { column: None }, |c| {
        !resolves(c.food_id, food_ids) || !resolves(c.receiver_id, receiver_ids)
    })
}

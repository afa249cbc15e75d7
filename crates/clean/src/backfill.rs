use std::collections::HashMap;

use crate::model::{FoodListing, Provider};

/// Fill empty `Location` from the City of the listing's provider.
/// Returns the number of listings changed.
pub fn backfill_locations(food: &mut [FoodListing], providers: &[Provider]) -> usize {
    let cities: HashMap<i64, &str> = providers
        .iter()
        .filter_map(|p| p.provider_id.present().map(|id| (id, p.city.as_str())))
        .collect();

    let mut filled = 0;
    for listing in food.iter_mut().filter(|f| f.location.is_empty()) {
        let city = listing.provider_id.present().and_then(|id| cities.get(&id));
        if let Some(city) = city {
            listing.location = city.to_string();
            filled += 1;
        }
    }
    filled
}

//! Controlled vocabularies for categorical fields.
//!
//! Canonicalization is a lookup with identity default: known spellings are
//! unified, anything unrecognized passes through untouched.

use std::collections::BTreeMap;

use crate::error::CleanError;
use crate::normalize::normalize_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    field: &'static str,
    map: BTreeMap<String, String>,
}

impl Vocabulary {
    /// Every canonical value maps to itself; aliases map onto a canonical value.
    pub fn new(field: &'static str, canonical: &[&str], aliases: &[(&str, &str)]) -> Self {
        let mut map = BTreeMap::new();
        for value in canonical {
            map.insert(value.to_string(), value.to_string());
        }
        for (alias, target) in aliases {
            map.insert(alias.to_string(), target.to_string());
        }
        Self { field, map }
    }

    /// Canonical spelling if `value` is a known key, else `value` unchanged.
    pub fn canonicalize<'a>(&'a self, value: &'a str) -> &'a str {
        self.map.get(value).map(String::as_str).unwrap_or(value)
    }

    /// Merge extra aliases. Keys and targets are normalized the same way field
    /// values are (title-cased), and the target becomes canonical.
    ///
    /// Fails if the merge would break the fixed-point property, i.e. some key
    /// would map to a value that itself maps elsewhere.
    pub fn extend(&mut self, aliases: &BTreeMap<String, String>) -> Result<(), CleanError> {
        let mut merged = self.map.clone();
        for (alias, target) in aliases {
            let alias = normalize_text(alias, true);
            let target = normalize_text(target, true);
            if alias.is_empty() || target.is_empty() {
                return Err(CleanError::ConfigValidation(format!(
                    "vocabulary '{}': empty alias or target",
                    self.field
                )));
            }
            merged.entry(target.clone()).or_insert_with(|| target.clone());
            merged.insert(alias, target);
        }

        for (key, value) in &merged {
            if merged.get(value) != Some(value) {
                return Err(CleanError::ConfigValidation(format!(
                    "vocabulary '{}': '{key}' maps to '{value}', which is not canonical",
                    self.field
                )));
            }
        }

        self.map = merged;
        Ok(())
    }
}

/// Free-function form of [`Vocabulary::canonicalize`] returning an owned value.
pub fn canonicalize(value: &str, vocabulary: &Vocabulary) -> String {
    vocabulary.canonicalize(value).to_string()
}

/// The four vocabularies used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabularies {
    pub provider_type: Vocabulary,
    pub food_type: Vocabulary,
    pub meal_type: Vocabulary,
    pub status: Vocabulary,
}

impl Default for Vocabularies {
    fn default() -> Self {
        Self {
            provider_type: Vocabulary::new(
                "Provider_Type",
                &["Restaurant", "Grocery Store", "Supermarket", "Catering Service"],
                &[],
            ),
            food_type: Vocabulary::new(
                "Food_Type",
                &["Vegetarian", "Non-Vegetarian", "Vegan"],
                &[("Non Vegetarian", "Non-Vegetarian"), ("Nonvegetarian", "Non-Vegetarian")],
            ),
            meal_type: Vocabulary::new(
                "Meal_Type",
                &["Breakfast", "Lunch", "Dinner", "Snacks"],
                &[("Snack", "Snacks")],
            ),
            status: Vocabulary::new(
                "Status",
                &["Pending", "Completed", "Cancelled"],
                &[("Canceled", "Cancelled")],
            ),
        }
    }
}

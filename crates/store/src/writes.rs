// Write contract: single-row inserts, quantity update, claim delete

use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use rusqlite::{params, OptionalExtension, TransactionBehavior};

use foodshare_clean::model::{DATE_FORMAT, TIMESTAMP_FORMAT};

use crate::error::{write_error, StoreError};
use crate::handle::Store;

#[derive(Debug, Clone)]
pub struct NewListing {
    pub food_name: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub provider_id: i64,
    pub provider_type: String,
    pub location: String,
    pub food_type: String,
    pub meal_type: String,
}

#[derive(Debug, Clone)]
pub struct NewClaim {
    pub food_id: i64,
    pub receiver_id: i64,
    pub status: String,
    pub timestamp: NaiveDateTime,
}

fn check_quantity(quantity: i64) -> Result<(), StoreError> {
    if quantity < 0 {
        return Err(StoreError::Rejected(format!("Quantity must be >= 0, got {quantity}")));
    }
    Ok(())
}

impl Store {
    /// Insert a listing with the next free Food_ID and return it.
    pub fn insert_listing(&mut self, listing: &NewListing) -> Result<i64, StoreError> {
        check_quantity(listing.quantity)?;
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let food_id: i64 =
            tx.query_row("SELECT COALESCE(MAX(Food_ID), 0) + 1 FROM Food_Listings", [], |row| row.get(0))?;
        tx.execute(
            "INSERT INTO Food_Listings (Food_ID, Food_Name, Quantity, Expiry_Date, Provider_ID, Provider_Type, Location, Food_Type, Meal_Type) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                food_id,
                listing.food_name,
                listing.quantity,
                listing.expiry_date.format(DATE_FORMAT).to_string(),
                listing.provider_id,
                listing.provider_type,
                listing.location,
                listing.food_type,
                listing.meal_type
            ],
        )
        .map_err(write_error)?;
        tx.commit()?;
        info!("inserted Food_Listings {food_id}");
        Ok(food_id)
    }

    /// Insert a claim with the next free Claim_ID and return it.
    pub fn insert_claim(&mut self, claim: &NewClaim) -> Result<i64, StoreError> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let claim_id: i64 =
            tx.query_row("SELECT COALESCE(MAX(Claim_ID), 0) + 1 FROM Claims", [], |row| row.get(0))?;
        tx.execute(
            "INSERT INTO Claims (Claim_ID, Food_ID, Receiver_ID, Status, Timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                claim_id,
                claim.food_id,
                claim.receiver_id,
                claim.status,
                claim.timestamp.format(TIMESTAMP_FORMAT).to_string()
            ],
        )
        .map_err(write_error)?;
        tx.commit()?;
        info!("inserted Claims {claim_id}");
        Ok(claim_id)
    }

    /// Set a listing's Quantity. Returns the previous value.
    pub fn update_listing_quantity(&mut self, food_id: i64, quantity: i64) -> Result<i64, StoreError> {
        check_quantity(quantity)?;
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let previous: Option<i64> = tx
            .query_row("SELECT Quantity FROM Food_Listings WHERE Food_ID = ?1", [food_id], |row| row.get(0))
            .optional()?;
        let previous = previous.ok_or(StoreError::NotFound {
            entity: "Food_Listings",
            id: food_id,
        })?;
        tx.execute(
            "UPDATE Food_Listings SET Quantity = ?1 WHERE Food_ID = ?2",
            params![quantity, food_id],
        )
        .map_err(write_error)?;
        tx.commit()?;
        info!("Food_Listings {food_id}: Quantity {previous} -> {quantity}");
        Ok(previous)
    }

    pub fn delete_claim(&mut self, claim_id: i64) -> Result<(), StoreError> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let deleted = tx
            .execute("DELETE FROM Claims WHERE Claim_ID = ?1", [claim_id])
            .map_err(write_error)?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                entity: "Claims",
                id: claim_id,
            });
        }
        tx.commit()?;
        info!("deleted Claims {claim_id}");
        Ok(())
    }
}

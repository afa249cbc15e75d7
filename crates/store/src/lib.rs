//! `foodshare-store`: SQLite persistence for cleaned food donation data.
//!
//! [`loader::load`] rebuilds the store from a cleaned dataset. An open
//! [`Store`] serves the canned reports and the single-row write contract;
//! both run against the same declared keys and foreign keys.

pub mod error;
pub mod handle;
pub mod loader;
pub mod reports;
pub mod schema;
pub mod writes;

pub use error::StoreError;
pub use handle::Store;
pub use loader::load;
pub use reports::{
    Cell, FilterOptions, ListingFilter, ListingRow, ProviderInfo, Report, ReportParams, ReportTable, StatusShare,
    TableCounts,
};
pub use writes::{NewClaim, NewListing};

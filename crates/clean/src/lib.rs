//! `foodshare-clean`: cleaning and referential-integrity pipeline.
//!
//! Pure engine crate: receives raw CSV text, returns accepted rows and
//! rule-tagged rejects per table. No filesystem or database dependencies.

pub mod backfill;
pub mod config;
pub mod error;
pub mod integrity;
pub mod load;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod summary;
pub mod validate;
pub mod vocab;

pub use config::PipelineConfig;
pub use error::CleanError;
pub use load::{RawDataset, RawTable};
pub use model::{
    Claim, CleanDataset, Coerced, FoodListing, Provider, Receiver, RejectRule, Rejected,
    SourceRow, Table, TableOutcome, TableRow,
};
pub use pipeline::run;
pub use summary::RunSummary;
pub use vocab::{canonicalize, Vocabularies, Vocabulary};

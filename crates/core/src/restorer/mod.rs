//! Release link restoration.
//!
//! The restorer keeps a per-account work catalog of releases whose links
//! need re-activation and sweeps it against the release service:
//! - **Catalog**: built from the free-account listing, genre dimension dropped
//! - **Classification**: each restore reply maps to a `RestorationOutcome`
//! - **Sweep**: sequential per account, paced, stopped early on rate limits

mod catalog;
mod classify;
mod config;
mod pacing;
mod sweep;
mod types;

pub use catalog::WorkCatalog;
pub use classify::{
    classify, is_recognized, RestorationOutcome, FILES_ALREADY_ONLINE, LINK_ALREADY_REQUESTED,
    WAIT_BEFORE_NEXT_REFRESH,
};
pub use config::RestorerConfig;
pub use pacing::next_delay;
pub use sweep::Restorer;
pub use types::{CycleReport, RestorerError, SweepOutput, SweepReport};

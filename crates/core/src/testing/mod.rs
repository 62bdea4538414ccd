//! Testing utilities and mock implementations.
//!
//! This module provides a scriptable `ReleaseService` so the restorer can be
//! exercised without a real remote service.
//!
//! # Example
//!
//! ```rust,ignore
//! use relink_core::testing::{fixtures, MockReleaseService};
//!
//! let service = MockReleaseService::new();
//! service.set_listing(fixtures::listing(&[("rock", "acc", &["1", "2"])])).await;
//! service.set_reply("1", fixtures::rate_limited()).await;
//!
//! // Hand it to a Restorer...
//! ```

mod mock_service;

pub use mock_service::{MockReleaseService, MockRestoreReply};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{Map, Value};

    use crate::gateway::{AccountId, ApiResponse, ReleaseCode};
    use crate::restorer::{
        WorkCatalog, FILES_ALREADY_ONLINE, LINK_ALREADY_REQUESTED, WAIT_BEFORE_NEXT_REFRESH,
    };

    use super::MockRestoreReply;

    /// Build a genre -> account -> codes listing.
    pub fn listing(entries: &[(&str, &str, &[&str])]) -> Value {
        let mut genres: Map<String, Value> = Map::new();
        for (genre, account, codes) in entries {
            let accounts = genres
                .entry(genre.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(accounts) = accounts {
                let queue = accounts
                    .entry(account.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(queue) = queue {
                    queue.extend(codes.iter().map(|c| Value::String(c.to_string())));
                }
            }
        }
        Value::Object(genres)
    }

    /// Build a work catalog directly from account -> codes pairs.
    pub fn catalog(entries: &[(&str, &[&str])]) -> WorkCatalog {
        entries
            .iter()
            .map(|(account, queue)| (AccountId::from(*account), codes(queue)))
            .collect()
    }

    pub fn codes(codes: &[&str]) -> Vec<ReleaseCode> {
        codes.iter().map(|c| ReleaseCode::from(*c)).collect()
    }

    pub fn already_online() -> MockRestoreReply {
        MockRestoreReply::Respond(ApiResponse::Json(Value::String(
            FILES_ALREADY_ONLINE.to_string(),
        )))
    }

    pub fn rate_limited() -> MockRestoreReply {
        MockRestoreReply::Respond(ApiResponse::Json(Value::String(
            WAIT_BEFORE_NEXT_REFRESH.to_string(),
        )))
    }

    pub fn accepted() -> MockRestoreReply {
        MockRestoreReply::Respond(ApiResponse::Json(Value::Bool(true)))
    }

    pub fn already_requested() -> MockRestoreReply {
        MockRestoreReply::Respond(ApiResponse::Json(Value::String(
            LINK_ALREADY_REQUESTED.to_string(),
        )))
    }

    pub fn failure(message: &str) -> MockRestoreReply {
        MockRestoreReply::Fail(message.to_string())
    }
}

//! Mock release service for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::gateway::{ApiResponse, GatewayError, ReleaseCode, ReleaseService};

/// Scripted answer to a restore request.
#[derive(Debug, Clone)]
pub enum MockRestoreReply {
    /// Reply with this body.
    Respond(ApiResponse),
    /// Fail the request as a service error with this message.
    Fail(String),
}

impl MockRestoreReply {
    fn into_result(self) -> Result<ApiResponse, GatewayError> {
        match self {
            Self::Respond(response) => Ok(response),
            Self::Fail(message) => Err(GatewayError::Api {
                status: 503,
                message,
            }),
        }
    }
}

/// Mock implementation of the ReleaseService trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable free-account listing
/// - Script restore replies per release code
/// - Record restore requests for assertions
///
/// Codes without a script are answered with `true` (restore accepted). When
/// several replies are scripted for a code they are served in order, and the
/// last one repeats.
#[derive(Debug)]
pub struct MockReleaseService {
    listing: Arc<RwLock<Result<ApiResponse, String>>>,
    replies: Arc<RwLock<HashMap<ReleaseCode, VecDeque<MockRestoreReply>>>>,
    restores: Arc<RwLock<Vec<ReleaseCode>>>,
    listing_calls: Arc<RwLock<usize>>,
}

impl Default for MockReleaseService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReleaseService {
    /// Create a mock with an empty listing.
    pub fn new() -> Self {
        Self {
            listing: Arc::new(RwLock::new(Ok(ApiResponse::Json(Value::Object(
                Default::default(),
            ))))),
            replies: Arc::new(RwLock::new(HashMap::new())),
            restores: Arc::new(RwLock::new(Vec::new())),
            listing_calls: Arc::new(RwLock::new(0)),
        }
    }

    // =========================================================================
    // Listing Configuration
    // =========================================================================

    /// Serve this JSON value as the free-account listing.
    pub async fn set_listing(&self, listing: Value) {
        *self.listing.write().await = Ok(ApiResponse::Json(listing));
    }

    /// Serve an arbitrary decoded body as the listing.
    pub async fn set_listing_response(&self, response: ApiResponse) {
        *self.listing.write().await = Ok(response);
    }

    /// Make listing requests fail.
    pub async fn fail_listing(&self, message: &str) {
        *self.listing.write().await = Err(message.to_string());
    }

    /// Number of listing requests served.
    pub async fn listing_count(&self) -> usize {
        *self.listing_calls.read().await
    }

    // =========================================================================
    // Restore Configuration
    // =========================================================================

    /// Always answer restores of `code` with `reply`.
    pub async fn set_reply(&self, code: &str, reply: MockRestoreReply) {
        self.set_replies(code, vec![reply]).await;
    }

    /// Answer successive restores of `code` with `replies`, repeating the last.
    pub async fn set_replies(&self, code: &str, replies: Vec<MockRestoreReply>) {
        self.replies
            .write()
            .await
            .insert(ReleaseCode::from(code), replies.into());
    }

    /// Make restores of `code` fail.
    pub async fn set_failure(&self, code: &str, message: &str) {
        self.set_reply(code, MockRestoreReply::Fail(message.to_string())).await;
    }

    // =========================================================================
    // Request Recording
    // =========================================================================

    /// Release codes restored so far, in request order.
    pub async fn recorded_restores(&self) -> Vec<ReleaseCode> {
        self.restores.read().await.clone()
    }

    pub async fn restore_count(&self) -> usize {
        self.restores.read().await.len()
    }

    async fn next_reply(&self, code: &ReleaseCode) -> MockRestoreReply {
        let mut replies = self.replies.write().await;
        match replies.get_mut(code) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or(MockRestoreReply::Respond(ApiResponse::Json(Value::Bool(true)))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or(MockRestoreReply::Respond(ApiResponse::Json(Value::Bool(true)))),
            None => MockRestoreReply::Respond(ApiResponse::Json(Value::Bool(true))),
        }
    }
}

#[async_trait]
impl ReleaseService for MockReleaseService {
    async fn fetch_releases_per_free_account(&self) -> Result<ApiResponse, GatewayError> {
        *self.listing_calls.write().await += 1;
        match &*self.listing.read().await {
            Ok(response) => Ok(response.clone()),
            Err(message) => Err(GatewayError::Api {
                status: 503,
                message: message.clone(),
            }),
        }
    }

    async fn restore_release(&self, code: &ReleaseCode) -> Result<ApiResponse, GatewayError> {
        self.restores.write().await.push(code.clone());
        self.next_reply(code).await.into_result()
    }
}

//! Restore response classification.

use serde::{Deserialize, Serialize};

use crate::gateway::ApiResponse;

/// Reply when the release links are still alive.
pub const FILES_ALREADY_ONLINE: &str = "Files already online";
/// Reply when the account hit the service's refresh rate limit.
pub const WAIT_BEFORE_NEXT_REFRESH: &str = "Wait before next refresh";
/// Reply when a restore for the release is already pending.
pub const LINK_ALREADY_REQUESTED: &str = "Link already requested";

/// What a single restore request amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorationOutcome {
    AlreadyOnline,
    RateLimited,
    RestoreAccepted,
    AlreadyRequested,
}

impl RestorationOutcome {
    /// Whether the release can leave the work queue.
    pub fn resolves_item(self) -> bool {
        !matches!(self, Self::RateLimited)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyOnline => "already_online",
            Self::RateLimited => "rate_limited",
            Self::RestoreAccepted => "restore_accepted",
            Self::AlreadyRequested => "already_requested",
        }
    }
}

/// Classify a restore reply.
///
/// Known sentinels are matched first; anything else, including the `true`
/// acknowledgement, counts as an accepted restore.
pub fn classify(response: &ApiResponse) -> RestorationOutcome {
    match response.as_str() {
        Some(FILES_ALREADY_ONLINE) => RestorationOutcome::AlreadyOnline,
        Some(WAIT_BEFORE_NEXT_REFRESH) => RestorationOutcome::RateLimited,
        Some(LINK_ALREADY_REQUESTED) => RestorationOutcome::AlreadyRequested,
        _ => RestorationOutcome::RestoreAccepted,
    }
}

/// Whether the reply is one the service is known to send for a restore.
pub fn is_recognized(response: &ApiResponse) -> bool {
    response.is_true()
        || matches!(
            response.as_str(),
            Some(FILES_ALREADY_ONLINE | WAIT_BEFORE_NEXT_REFRESH | LINK_ALREADY_REQUESTED)
        )
}

//! Error taxonomy for calls against the TerraConsole API.

use crate::status::{RunAction, RunStatus};
use reqwest::StatusCode;
use thiserror::Error;

/// Message shown when a non-2xx body carries no `error` field.
pub const GENERIC_FAILURE: &str = "Request failed";

#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 from any endpoint. The token has already been evicted and the
    /// navigator points at the login route by the time this is returned.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Validation or business error reported by the server.
    #[error("{message} (HTTP {status})")]
    Api { status: StatusCode, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The action's affordance is not offered for the run's current status.
    #[error("cannot {action} a run that is {status}")]
    IllegalAction { action: RunAction, status: RunStatus },

    /// A request for the same operation is still in flight.
    #[error("a request is already in progress")]
    Busy,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Login answered 428: the account has MFA enabled and no TOTP code was sent.
    pub fn is_mfa_required(&self) -> bool {
        matches!(self, ApiError::Api { status, .. } if *status == StatusCode::PRECONDITION_REQUIRED)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// The string a user should see for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { .. } => "Unauthorized".to_string(),
            ApiError::Api { message, .. } => message.clone(),
            ApiError::Transport(_) | ApiError::Decode(_) => {
                "Could not reach the server or read its response".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

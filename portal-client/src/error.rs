//! Error taxonomy for calls against the Agent Portal API.

use std::fmt;

use thiserror::Error;

/// Failure of a client operation.
///
/// `Display` yields the server-provided message verbatim when there is one,
/// so callers can show it as-is.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, or expired credentials.
    #[error("{}", .message.as_deref().unwrap_or("authentication required"))]
    Unauthorized {
        /// Server explanation, when one was sent.
        message: Option<String>,
    },

    /// Any other non-success status reported by the server.
    #[error("{}", status_message(.status, .message.as_deref()))]
    Api {
        /// Envelope code, or the transport status without one.
        status: u16,
        /// Server explanation, when one was sent.
        message: Option<String>,
    },

    /// The server accepted the request but reported that it did not act on it.
    #[error("{0}")]
    Rejected(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not match the expected payload.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Reading or writing the persisted session failed.
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// An authenticated call was attempted without a session.
    #[error("not signed in")]
    NotAuthenticated,
}

fn status_message(status: impl fmt::Display, message: Option<&str>) -> String {
    message.map_or_else(
        || format!("request failed with status {status}"),
        str::to_string,
    )
}

impl ClientError {
    /// Map a failed status code and optional server message to an error.
    #[must_use]
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message.filter(|text| !text.trim().is_empty());
        if status == 401 {
            Self::Unauthorized { message }
        } else {
            Self::Api { status, message }
        }
    }

    /// Whether this error means the session is no longer trusted.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::NotAuthenticated)
    }

    /// A human-readable message when the error carries one of its own.
    ///
    /// Transport, decoding, and storage failures return `None`; callers
    /// substitute a message specific to what they were doing.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(message) | Self::Rejected(message) => Some(message.clone()),
            Self::Unauthorized { message } | Self::Api { message, .. } => message.clone(),
            Self::NotAuthenticated => Some(self.to_string()),
            Self::Network(_) | Self::Decode(_) | Self::Storage(_) => None,
        }
    }

    /// [`Self::user_message`] or `fallback`.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.user_message()
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

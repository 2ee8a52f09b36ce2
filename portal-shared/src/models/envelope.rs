//! The response envelope wrapped around every Agent Portal API payload.

use serde::{Deserialize, Serialize};

/// `{ code, message?, data? }` wrapper used by every endpoint.
///
/// `code` mirrors an HTTP status; anything outside `200..300` is a failure
/// whose `message` is meant for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiEnvelope<T> {
    /// Status code reported by the server. Absent codes fall back to the
    /// transport status.
    #[serde(default)]
    pub code: Option<u16>,

    /// Display message accompanying a failure.
    #[serde(default)]
    pub message: Option<String>,

    /// The payload of a successful call.
    #[serde(default)]
    pub data: Option<T>,
}

fn is_2xx(status: u16) -> bool {
    (200..300).contains(&status)
}

impl<T> ApiEnvelope<T> {
    /// The status that decides the outcome.
    ///
    /// A failing envelope code wins; otherwise the transport status decides,
    /// so a success code inside a failed response is still a failure.
    #[must_use]
    pub fn effective_code(&self, transport_status: u16) -> u16 {
        match self.code {
            Some(code) if !is_2xx(code) => code,
            _ => transport_status,
        }
    }

    /// Whether both the transport status and the envelope code are 2xx.
    #[must_use]
    pub fn is_success(&self, transport_status: u16) -> bool {
        is_2xx(self.effective_code(transport_status))
    }
}

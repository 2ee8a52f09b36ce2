//! Agent recruitment: sponsor codes and invitations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An invitation sent by the current agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    /// Invitation identifier.
    pub id: String,
    /// Address the invitation went to.
    pub email: String,
    /// Invitee name, when one was given.
    #[serde(default)]
    pub name: Option<String>,
    /// Invitation status such as `pending` or `accepted`.
    #[serde(default)]
    pub status: Option<String>,
    /// When the invitation was sent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Whether the invitee has signed up.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("accepted"))
    }
}

/// Payload of `GET /api/membership/invitations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvitationStats {
    /// The agent's own referral code.
    #[serde(default)]
    pub sponsor_code: Option<String>,
    /// Every invitation the agent has sent.
    #[serde(default)]
    pub invitations: Vec<Invitation>,
}

impl InvitationStats {
    /// Number of invitations that turned into sign-ups.
    #[must_use]
    pub fn accepted_count(&self) -> usize {
        self.invitations
            .iter()
            .filter(|invitation| invitation.is_accepted())
            .count()
    }
}

/// Payload of `GET /api/membership/pending-invitations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingInvitations {
    /// Invitations not yet accepted.
    #[serde(default)]
    pub invitations: Vec<Invitation>,
}

/// Body of `POST /api/membership/send-invitation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendInvitationRequest {
    /// Address to invite.
    pub email: String,
    /// Name to greet the invitee with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Payload of a sent invitation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendInvitationResponse {
    /// Whether the invitation email went out.
    pub sent: bool,
}

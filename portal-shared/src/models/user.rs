//! Membership payloads: the agent record, login, session verification, and
//! profile updates.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Role assignments reported by the membership service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Field agent taking jobs.
    Agent,
    /// Portal administrator.
    Admin,
    /// Customer posting jobs.
    Client,
    /// Any role this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl UserRole {
    /// Return the canonical string representation used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Admin => "admin",
            Self::Client => "client",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            "client" => Ok(Self::Client),
            _ => Err("unknown user role"),
        }
    }
}

/// The authenticated agent as returned by login and verify.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentUser {
    /// Server-assigned identifier; also the commission agent id.
    pub id: String,

    /// Login email address.
    pub email: String,

    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,

    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,

    /// Roles granted to the account.
    #[serde(default)]
    pub roles: Vec<UserRole>,

    /// Referral identifier used to attribute recruited agents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_code: Option<String>,

    /// Whether the email address was confirmed; absent when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    /// Whether the phone number was confirmed; absent when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_verified: Option<bool>,

    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// City of residence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// State or region code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,

    /// Country of residence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl AgentUser {
    /// Full name when both parts are known, else the first name, else the
    /// email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (non_blank(self.first_name.as_deref()), non_blank(self.last_name.as_deref())) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            _ => self.email.clone(),
        }
    }

    /// Whether the agent holds `role`.
    #[must_use]
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    /// Whether the email address has been confirmed. Unknown counts as no.
    #[must_use]
    pub fn is_email_verified(&self) -> bool {
        self.email_verified.unwrap_or(false)
    }

    /// Whether the phone number has been confirmed. Unknown counts as no.
    #[must_use]
    pub fn is_phone_verified(&self) -> bool {
        self.phone_verified.unwrap_or(false)
    }

    /// Single-line postal address built from whichever parts are present.
    #[must_use]
    pub fn formatted_address(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.address.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.zip_code.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .filter_map(non_blank)
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

/// Body of `POST /api/membership/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password, sent as typed.
    pub password: String,
}

/// Payload of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Opaque bearer token.
    pub token: String,
    /// The signed-in agent.
    pub user: AgentUser,
}

/// Payload of `GET /api/membership/verify`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyResponse {
    /// Whether the token is still accepted.
    pub valid: bool,
    /// The token holder, when valid.
    #[serde(default)]
    pub user: Option<AgentUser>,
}

impl VerifyResponse {
    /// The verified user, if the server vouched for the token and sent one.
    #[must_use]
    pub fn into_verified_user(self) -> Option<AgentUser> {
        if self.valid { self.user } else { None }
    }
}

/// Partial profile patch for `PUT /api/membership/profile`. Only fields that
/// are set are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New first name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// New city.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// New state or region code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// New postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// New country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl ProfileUpdate {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Payload of a profile update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdateResponse {
    /// Whether the patch was applied.
    pub success: bool,
}

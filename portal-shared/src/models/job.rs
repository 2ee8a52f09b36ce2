//! Job listings, job enquiries (applications), and the job-type catalogue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Server-assigned identifier.
    pub id: String,

    /// URL-friendly identifier accepted by `GET /api/jobs/{slug}`.
    #[serde(default)]
    pub slug: Option<String>,

    /// Headline shown in listings.
    pub title: String,

    /// Job-type slug; see [`JobType`].
    #[serde(rename = "type", default)]
    pub job_type: Option<String>,

    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,

    /// City the job is in.
    #[serde(default)]
    pub city: Option<String>,

    /// State or region code.
    #[serde(default)]
    pub state: Option<String>,

    /// Hourly pay in dollars.
    #[serde(default)]
    pub pay_rate: Option<f64>,

    /// Listing status such as `open` or `filled`.
    #[serde(default)]
    pub status: Option<String>,

    /// When the job was posted.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Job {
    /// "City, ST" from whichever parts are known.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match (self.city.as_deref(), self.state.as_deref()) {
            (Some(city), Some(state)) => Some(format!("{city}, {state}")),
            (Some(single), None) | (None, Some(single)) => Some(single.to_string()),
            (None, None) => None,
        }
    }

    /// The identifier to use for detail lookups: the slug when present,
    /// else the id.
    #[must_use]
    pub fn lookup_key(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.id)
    }
}

/// Query filters for `GET /api/jobs`.
///
/// Compared by value; a change to any field is a new dependency set for the
/// job list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobFilter {
    /// Job-type slug, sent as `type`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    /// State or region code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// City name, matched exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Number of jobs to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl JobFilter {
    /// Query-string pairs in a stable order, omitting unset and blank values.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("type", self.job_type.as_deref()),
            ("state", self.state.as_deref()),
            ("city", self.city.as_deref()),
        ];
        let numbers = [("limit", self.limit), ("offset", self.offset)];

        text.into_iter()
            .filter_map(|(key, value)| {
                value
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| (key, value.to_string()))
            })
            .chain(
                numbers
                    .into_iter()
                    .filter_map(|(key, value)| value.map(|value| (key, value.to_string()))),
            )
            .collect()
    }
}

/// Payload of `GET /api/jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobListResponse {
    /// The requested page.
    #[serde(default)]
    pub jobs: Vec<Job>,
    /// Matches across all pages.
    #[serde(default)]
    pub total: u64,
}

/// Payload of `GET /api/jobs/{slug}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDetailResponse {
    /// The requested job.
    pub job: Job,
}

/// Payload of `GET /api/jobs/my-requests`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MyRequestsResponse {
    /// Jobs posted by the signed-in agent.
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// An enquiry the agent submitted against a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Application identifier.
    pub id: String,
    /// The job applied to.
    pub job_id: String,
    /// Title of the job, when the server includes it.
    #[serde(default)]
    pub job_title: Option<String>,
    /// Review status; see [`Application::status_label`].
    #[serde(default)]
    pub status: Option<String>,
    /// The message sent with the enquiry.
    #[serde(default)]
    pub message: Option<String>,
    /// When the enquiry was submitted.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Status for display, `pending` when the server sent none.
    #[must_use]
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("pending")
    }
}

/// Payload of `GET /api/jobs/my-applications`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationListResponse {
    /// Applications, newest first.
    #[serde(default)]
    pub applications: Vec<Application>,
    /// Applications across all pages.
    #[serde(default)]
    pub total: u64,
}

/// Body of `POST /api/jobs/{jobId}/enquire`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnquiryRequest {
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Message to the poster.
    pub message: String,
}

/// Payload of a job enquiry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnquiryResponse {
    /// Whether the enquiry was recorded.
    pub success: bool,
}

/// One entry of the job-type catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobType {
    /// Value accepted by the `type` filter.
    pub slug: String,
    /// Display name.
    pub name: String,
}

/// Payload of `GET /api/jobs/types/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobTypesResponse {
    /// Every job type the board accepts.
    #[serde(default)]
    pub types: Vec<JobType>,
}

//! Typed access to the Agent Portal REST API.
//!
//! [`PortalApi`] is the seam the session manager and fetch controllers are
//! written against; [`HttpPortalApi`] is the reqwest implementation.
//! Authenticated calls take the bearer token explicitly so each request uses
//! the token that was current when it was issued.

use async_trait::async_trait;
use portal_shared::models::{
    ApiEnvelope, ApplicationListResponse, EarningsSummary, EnquiryRequest, EnquiryResponse,
    InvitationStats, JobDetailResponse, JobFilter, JobListResponse,
    JobTypesResponse, LoginRequest, LoginResponse, MyRequestsResponse, PendingInvitations,
    ProfileUpdate, ProfileUpdateResponse, SendInvitationRequest, SendInvitationResponse,
    VerifyResponse,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ClientError;

const USER_AGENT: &str = concat!("agent-portal/", env!("CARGO_PKG_VERSION"));

/// Every endpoint of the Agent Portal API the client depends on.
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// `POST /api/membership/login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError>;

    /// `GET /api/membership/verify`
    async fn verify(&self, token: &str) -> Result<VerifyResponse, ClientError>;

    /// `PUT /api/membership/profile`
    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdateResponse, ClientError>;

    /// `GET /api/jobs`
    async fn list_jobs(&self, filter: &JobFilter) -> Result<JobListResponse, ClientError>;

    /// `GET /api/jobs/{slug}`
    async fn job(&self, slug: &str) -> Result<JobDetailResponse, ClientError>;

    /// `GET /api/jobs/my-requests`
    async fn my_requests(&self, token: &str) -> Result<MyRequestsResponse, ClientError>;

    /// `GET /api/jobs/my-applications`
    async fn my_applications(&self, token: &str)
    -> Result<ApplicationListResponse, ClientError>;

    /// `POST /api/jobs/{jobId}/enquire`
    async fn enquire(
        &self,
        token: &str,
        job_id: &str,
        request: &EnquiryRequest,
    ) -> Result<EnquiryResponse, ClientError>;

    /// `GET /api/jobs/types/list`
    async fn job_types(&self) -> Result<JobTypesResponse, ClientError>;

    /// `GET /api/commissions/agent/{agentId}`
    async fn earnings(&self, token: &str, agent_id: &str)
    -> Result<EarningsSummary, ClientError>;

    /// `GET /api/membership/invitations`
    async fn invitations(&self, token: &str) -> Result<InvitationStats, ClientError>;

    /// `GET /api/membership/pending-invitations`
    async fn pending_invitations(&self, token: &str) -> Result<PendingInvitations, ClientError>;

    /// `POST /api/membership/send-invitation`
    async fn send_invitation(
        &self,
        token: &str,
        request: &SendInvitationRequest,
    ) -> Result<SendInvitationResponse, ClientError>;
}

/// reqwest-backed [`PortalApi`].
#[derive(Clone, Debug)]
pub struct HttpPortalApi {
    base_url: Url,
    client: Client,
}

impl HttpPortalApi {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Wrap an existing reqwest client.
    #[must_use]
    pub fn with_client(base_url: Url, client: Client) -> Self {
        Self { base_url, client }
    }

    /// The API origin requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::Validation(format!("API base URL `{}` cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        debug!(method = %method, url = %url, authenticated = token.is_some(), "api request");
        let request = self.client.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        decode_envelope(status, &body)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        self.send(self.request(Method::GET, url, token)).await
    }
}

/// Decode an enveloped response body.
///
/// The call succeeds only when the transport status and the envelope code
/// (when present) are both 2xx.
/// Failures carry the server's `message`; non-JSON failure bodies map to a
/// status-only error.
///
/// # Errors
/// Returns the mapped [`ClientError`] for failure statuses and
/// [`ClientError::Decode`] for malformed success payloads.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    let transport_ok = (200..300).contains(&status);
    let envelope: ApiEnvelope<serde_json::Value> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(err) if transport_ok => return Err(err.into()),
        Err(_) => return Err(ClientError::from_status(status, None)),
    };

    if !envelope.is_success(status) {
        let code = envelope.effective_code(status);
        return Err(ClientError::from_status(code, envelope.message));
    }

    let data = envelope
        .data
        .ok_or_else(|| ClientError::Decode("response envelope has no data".to_string()))?;
    Ok(serde_json::from_value(data)?)
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let url = self.endpoint(&["api", "membership", "login"])?;
        self.send(self.request(Method::POST, url, None).json(request))
            .await
    }

    async fn verify(&self, token: &str) -> Result<VerifyResponse, ClientError> {
        self.get(&["api", "membership", "verify"], Some(token)).await
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdateResponse, ClientError> {
        let url = self.endpoint(&["api", "membership", "profile"])?;
        self.send(self.request(Method::PUT, url, Some(token)).json(update))
            .await
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<JobListResponse, ClientError> {
        let url = self.endpoint(&["api", "jobs"])?;
        let request = self
            .request(Method::GET, url, None)
            .query(&filter.query_pairs());
        self.send(request).await
    }

    async fn job(&self, slug: &str) -> Result<JobDetailResponse, ClientError> {
        self.get(&["api", "jobs", slug], None).await
    }

    async fn my_requests(&self, token: &str) -> Result<MyRequestsResponse, ClientError> {
        self.get(&["api", "jobs", "my-requests"], Some(token)).await
    }

    async fn my_applications(
        &self,
        token: &str,
    ) -> Result<ApplicationListResponse, ClientError> {
        self.get(&["api", "jobs", "my-applications"], Some(token))
            .await
    }

    async fn enquire(
        &self,
        token: &str,
        job_id: &str,
        request: &EnquiryRequest,
    ) -> Result<EnquiryResponse, ClientError> {
        let url = self.endpoint(&["api", "jobs", job_id, "enquire"])?;
        self.send(self.request(Method::POST, url, Some(token)).json(request))
            .await
    }

    async fn job_types(&self) -> Result<JobTypesResponse, ClientError> {
        self.get(&["api", "jobs", "types", "list"], None).await
    }

    async fn earnings(&self, token: &str, agent_id: &str) -> Result<EarningsSummary, ClientError> {
        self.get(&["api", "commissions", "agent", agent_id], Some(token))
            .await
    }

    async fn invitations(&self, token: &str) -> Result<InvitationStats, ClientError> {
        self.get(&["api", "membership", "invitations"], Some(token))
            .await
    }

    async fn pending_invitations(&self, token: &str) -> Result<PendingInvitations, ClientError> {
        self.get(&["api", "membership", "pending-invitations"], Some(token))
            .await
    }

    async fn send_invitation(
        &self,
        token: &str,
        request: &SendInvitationRequest,
    ) -> Result<SendInvitationResponse, ClientError> {
        let url = self.endpoint(&["api", "membership", "send-invitation"])?;
        self.send(self.request(Method::POST, url, Some(token)).json(request))
            .await
    }
}

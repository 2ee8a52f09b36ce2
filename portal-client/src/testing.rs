//! Scripted [`PortalApi`] used by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use portal_shared::models::{
    AgentUser, ApplicationListResponse, EarningsSummary, EnquiryRequest, EnquiryResponse,
    InvitationStats, JobDetailResponse, JobFilter, JobListResponse, JobTypesResponse,
    LoginRequest, LoginResponse, MyRequestsResponse, PendingInvitations, ProfileUpdate,
    ProfileUpdateResponse, SendInvitationRequest, SendInvitationResponse, VerifyResponse,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::oneshot;

use crate::{api::PortalApi, error::ClientError};

enum Outcome {
    Reply(serde_json::Value),
    Fail { status: u16, message: Option<String> },
}

struct Scripted {
    outcome: Outcome,
    gate: Option<oneshot::Receiver<()>>,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub endpoint: &'static str,
    pub token: Option<String>,
    pub detail: String,
}

/// Fake API answering each endpoint from a queue of scripted outcomes.
///
/// Gated replies are held until the returned sender fires, which lets tests
/// decide completion order. Unscripted calls fail with status 501.
#[derive(Default)]
pub struct FakeApi {
    script: Mutex<HashMap<&'static str, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Call>>,
}

impl std::fmt::Debug for FakeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeApi")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, endpoint: &'static str, scripted: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint)
            .or_default()
            .push_back(scripted);
    }

    pub fn reply<T: Serialize>(&self, endpoint: &'static str, value: T) {
        self.push(
            endpoint,
            Scripted {
                outcome: Outcome::Reply(serde_json::to_value(value).unwrap()),
                gate: None,
            },
        );
    }

    pub fn fail(&self, endpoint: &'static str, status: u16, message: Option<&str>) {
        self.push(
            endpoint,
            Scripted {
                outcome: Outcome::Fail {
                    status,
                    message: message.map(str::to_string),
                },
                gate: None,
            },
        );
    }

    /// Reply that is withheld until the returned sender is fired.
    pub fn gated_reply<T: Serialize>(&self, endpoint: &'static str, value: T) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.push(
            endpoint,
            Scripted {
                outcome: Outcome::Reply(serde_json::to_value(value).unwrap()),
                gate: Some(gate),
            },
        );
        release
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    /// Yield until `endpoint` has been called at least `count` times.
    pub async fn wait_for_calls(&self, endpoint: &str, count: usize) {
        while self.call_count(endpoint) < count {
            tokio::task::yield_now().await;
        }
    }

    async fn answer<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        token: Option<&str>,
        detail: String,
    ) -> Result<T, ClientError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call {
                endpoint,
                token: token.map(str::to_string),
                detail,
            });

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        let Some(Scripted { outcome, gate }) = next else {
            return Err(ClientError::from_status(
                501,
                Some(format!("unscripted call to {endpoint}")),
            ));
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match outcome {
            Outcome::Reply(value) => Ok(serde_json::from_value(value)?),
            Outcome::Fail { status, message } => Err(ClientError::from_status(status, message)),
        }
    }
}

#[async_trait]
impl PortalApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.answer("login", None, request.email.clone()).await
    }

    async fn verify(&self, token: &str) -> Result<VerifyResponse, ClientError> {
        self.answer("verify", Some(token), String::new()).await
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdateResponse, ClientError> {
        let detail = serde_json::to_string(update)?;
        self.answer("update_profile", Some(token), detail).await
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<JobListResponse, ClientError> {
        let detail = filter.job_type.clone().unwrap_or_default();
        self.answer("list_jobs", None, detail).await
    }

    async fn job(&self, slug: &str) -> Result<JobDetailResponse, ClientError> {
        self.answer("job", None, slug.to_string()).await
    }

    async fn my_requests(&self, token: &str) -> Result<MyRequestsResponse, ClientError> {
        self.answer("my_requests", Some(token), String::new()).await
    }

    async fn my_applications(
        &self,
        token: &str,
    ) -> Result<ApplicationListResponse, ClientError> {
        self.answer("my_applications", Some(token), String::new())
            .await
    }

    async fn enquire(
        &self,
        token: &str,
        job_id: &str,
        request: &EnquiryRequest,
    ) -> Result<EnquiryResponse, ClientError> {
        let detail = format!("{job_id}:{}", request.message);
        self.answer("enquire", Some(token), detail).await
    }

    async fn job_types(&self) -> Result<JobTypesResponse, ClientError> {
        self.answer("job_types", None, String::new()).await
    }

    async fn earnings(&self, token: &str, agent_id: &str) -> Result<EarningsSummary, ClientError> {
        self.answer("earnings", Some(token), agent_id.to_string())
            .await
    }

    async fn invitations(&self, token: &str) -> Result<InvitationStats, ClientError> {
        self.answer("invitations", Some(token), String::new()).await
    }

    async fn pending_invitations(&self, token: &str) -> Result<PendingInvitations, ClientError> {
        self.answer("pending_invitations", Some(token), String::new())
            .await
    }

    async fn send_invitation(
        &self,
        token: &str,
        request: &SendInvitationRequest,
    ) -> Result<SendInvitationResponse, ClientError> {
        self.answer("send_invitation", Some(token), request.email.clone())
            .await
    }
}

/// A representative agent record.
pub fn agent(id: &str) -> AgentUser {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "email": format!("{id}@example.com"),
        "firstName": "Ada",
        "lastName": "Okafor",
        "roles": ["agent"],
        "sponsorCode": format!("SPN-{id}"),
    }))
    .unwrap()
}

/// Successful login payload for `agent(id)`.
pub fn login_ok(token: &str, id: &str) -> LoginResponse {
    LoginResponse {
        token: token.to_string(),
        user: agent(id),
    }
}

/// Verify payload vouching for `agent(id)`.
pub fn verified(id: &str) -> VerifyResponse {
    VerifyResponse {
        valid: true,
        user: Some(agent(id)),
    }
}

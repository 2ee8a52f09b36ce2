//! Fetch controllers for every read resource of the portal.

use std::sync::Arc;

use portal_shared::models::{
    ApplicationListResponse, EarningsSummary, InvitationStats, JobDetailResponse, JobFilter,
    JobListResponse, JobTypesResponse, MyRequestsResponse, PendingInvitations,
};

use crate::{api::PortalApi, fetch::FetchController, session::SessionManager};

/// Builds controllers bound to one API client and session.
#[derive(Clone)]
pub struct Resources {
    api: Arc<dyn PortalApi>,
    session: Arc<SessionManager>,
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

macro_rules! authenticated {
    ($resources:expr, $label:literal, $fallback:literal, $method:ident) => {{
        let api = Arc::clone(&$resources.api);
        let session = Arc::clone(&$resources.session);
        FetchController::new($label, $fallback, move |()| {
            let api = Arc::clone(&api);
            let session = Arc::clone(&session);
            async move {
                session
                    .authorized(|token| async move { api.$method(&token).await })
                    .await
            }
        })
    }};
}

impl Resources {
    /// Resources read through `api`, authenticated by `session`.
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>, session: Arc<SessionManager>) -> Self {
        Self { api, session }
    }

    /// The session the authenticated resources read their token from.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Public job listing, keyed by filter.
    #[must_use]
    pub fn jobs(&self) -> FetchController<JobFilter, JobListResponse> {
        let api = Arc::clone(&self.api);
        FetchController::new("jobs", "Failed to fetch jobs", move |filter: JobFilter| {
            let api = Arc::clone(&api);
            async move { api.list_jobs(&filter).await }
        })
    }

    /// One job, keyed by slug.
    #[must_use]
    pub fn job(&self) -> FetchController<String, JobDetailResponse> {
        let api = Arc::clone(&self.api);
        FetchController::new("job", "Failed to fetch job", move |slug: String| {
            let api = Arc::clone(&api);
            async move { api.job(&slug).await }
        })
    }

    /// The job-type catalogue.
    #[must_use]
    pub fn job_types(&self) -> FetchController<(), JobTypesResponse> {
        let api = Arc::clone(&self.api);
        FetchController::new("job_types", "Failed to fetch job types", move |()| {
            let api = Arc::clone(&api);
            async move { api.job_types().await }
        })
    }

    /// Jobs the signed-in agent has posted.
    #[must_use]
    pub fn my_requests(&self) -> FetchController<(), MyRequestsResponse> {
        authenticated!(self, "my_requests", "Failed to fetch your requests", my_requests)
    }

    /// The signed-in agent's job applications.
    #[must_use]
    pub fn applications(&self) -> FetchController<(), ApplicationListResponse> {
        authenticated!(self, "applications", "Failed to fetch applications", my_applications)
    }

    /// Earnings summary keyed by agent id. Stays idle while the id is
    /// absent; feed it [`crate::session::Session::agent_id`].
    #[must_use]
    pub fn earnings(&self) -> FetchController<Option<String>, EarningsSummary> {
        let api = Arc::clone(&self.api);
        let session = Arc::clone(&self.session);
        FetchController::new(
            "earnings",
            "Failed to fetch earnings",
            move |agent_id: Option<String>| {
                let api = Arc::clone(&api);
                let session = Arc::clone(&session);
                async move {
                    let agent_id = agent_id.unwrap_or_default();
                    session
                        .authorized(|token| async move { api.earnings(&token, &agent_id).await })
                        .await
                }
            },
        )
        .with_gate(Option::is_some)
    }

    /// Sponsor code and every invitation sent.
    #[must_use]
    pub fn invitations(&self) -> FetchController<(), InvitationStats> {
        authenticated!(self, "invitations", "Failed to fetch invitations", invitations)
    }

    /// Invitations still awaiting sign-up.
    #[must_use]
    pub fn pending_invitations(&self) -> FetchController<(), PendingInvitations> {
        authenticated!(
            self,
            "pending_invitations",
            "Failed to fetch pending invitations",
            pending_invitations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fetch::FetchOutcome,
        store::MemorySessionStore,
        testing::{FakeApi, login_ok},
    };
    use portal_shared::models::{EarningsSummary, Job};

    fn job(slug: &str, job_type: &str) -> Job {
        serde_json::from_value(serde_json::json!({
            "id": format!("id-{slug}"),
            "title": format!("{job_type} in Austin"),
            "slug": slug,
            "type": job_type,
            "city": "Austin",
            "state": "TX",
            "payRate": 32.5,
            "status": "open",
            "createdAt": "2024-03-04T10:00:00Z",
        }))
        .unwrap()
    }

    fn listing(slug: &str, job_type: &str) -> JobListResponse {
        JobListResponse {
            jobs: vec![job(slug, job_type)],
            total: 1,
        }
    }

    fn filter(job_type: &str) -> JobFilter {
        JobFilter {
            job_type: Some(job_type.to_string()),
            limit: Some(5),
            ..JobFilter::default()
        }
    }

    fn resources(api: &Arc<FakeApi>) -> Resources {
        let session = Arc::new(SessionManager::new(
            api.clone(),
            Arc::new(MemorySessionStore::new()),
        ));
        Resources::new(api.clone(), session)
    }

    async fn signed_in(api: &Arc<FakeApi>) -> Resources {
        api.reply("login", login_ok("tok-1", "agent-1"));
        let resources = resources(api);
        resources
            .session()
            .login("agent-1@example.com", "pw")
            .await
            .unwrap();
        resources
    }

    #[tokio::test]
    async fn filter_change_shows_only_latest_listing() {
        let api = FakeApi::new();
        let release_guard = api.gated_reply("list_jobs", listing("night-guard", "guard"));
        let release_bodyguard =
            api.gated_reply("list_jobs", listing("vip-escort", "bodyguard"));
        let jobs = resources(&api).jobs();

        let first = tokio::spawn(jobs.update(filter("guard")).unwrap());
        api.wait_for_calls("list_jobs", 1).await;
        let second = tokio::spawn(jobs.update(filter("bodyguard")).unwrap());
        api.wait_for_calls("list_jobs", 2).await;

        release_bodyguard.send(()).unwrap();
        assert_eq!(second.await.unwrap(), FetchOutcome::Applied);
        release_guard.send(()).unwrap();
        assert_eq!(first.await.unwrap(), FetchOutcome::Superseded);

        let state = jobs.state();
        let shown = state.data().unwrap();
        assert_eq!(shown.jobs[0].slug.as_deref(), Some("vip-escort"));
        let details: Vec<_> = api.calls().into_iter().map(|call| call.detail).collect();
        assert_eq!(details, vec!["guard", "bodyguard"]);
    }

    #[tokio::test]
    async fn earnings_without_user_never_requests() {
        let api = FakeApi::new();
        let resources = resources(&api);
        resources.session().restore().await;
        let earnings = resources.earnings();

        let agent_id = resources.session().snapshot().agent_id().map(str::to_string);
        assert!(earnings.update(agent_id).is_none());

        let state = earnings.state();
        assert!(state.is_idle());
        assert!(!state.is_loading());
        assert_eq!(api.call_count("earnings"), 0);
    }

    #[tokio::test]
    async fn earnings_for_signed_in_agent() {
        let api = FakeApi::new();
        let resources = signed_in(&api).await;
        api.reply(
            "earnings",
            EarningsSummary {
                total_earned: 410.0,
                this_week: 60.0,
                pending: 25.0,
                commissions: Vec::new(),
            },
        );
        let earnings = resources.earnings();

        let agent_id = resources.session().snapshot().agent_id().map(str::to_string);
        earnings.update(agent_id).unwrap().await;

        assert!((earnings.state().data().unwrap().total_earned - 410.0).abs() < f64::EPSILON);
        let call = api.calls().pop().unwrap();
        assert_eq!(call.detail, "agent-1");
        assert_eq!(call.token.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn expired_token_fails_resource_and_signs_out() {
        let api = FakeApi::new();
        let resources = signed_in(&api).await;
        api.fail("my_applications", 401, Some("Token expired"));
        let applications = resources.applications();

        applications.update(()).unwrap().await;

        assert_eq!(applications.state().error(), Some("Token expired"));
        assert!(!resources.session().is_authenticated());
    }

    #[tokio::test]
    async fn authenticated_resource_without_session_fails_locally() {
        let api = FakeApi::new();
        let invitations = resources(&api).invitations();

        invitations.update(()).unwrap().await;

        assert_eq!(invitations.state().error(), Some("not signed in"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn transport_failures_use_resource_fallback() {
        let api = FakeApi::new();
        let resources = signed_in(&api).await;
        api.reply("job_types", serde_json::json!({"types": "guard"}));
        api.reply("pending_invitations", serde_json::json!({"invitations": 42}));

        let types = resources.job_types();
        types.update(()).unwrap().await;
        assert_eq!(types.state().error(), Some("Failed to fetch job types"));

        let pending = resources.pending_invitations();
        pending.update(()).unwrap().await;
        assert_eq!(
            pending.state().error(),
            Some("Failed to fetch pending invitations")
        );
    }

    #[tokio::test]
    async fn job_detail_surfaces_not_found_message() {
        let api = FakeApi::new();
        api.fail("job", 404, Some("Job not found"));
        let detail = resources(&api).job();

        detail.update("missing".to_string()).unwrap().await;

        assert_eq!(detail.state().error(), Some("Job not found"));
        assert_eq!(api.calls()[0].detail, "missing");
    }
}

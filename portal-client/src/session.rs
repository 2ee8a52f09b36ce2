//! The session manager: single owner of the bearer token and current user.
//!
//! Consumers read [`Session`] snapshots or subscribe to changes; only
//! [`SessionManager::restore`], [`SessionManager::login`],
//! [`SessionManager::logout`], [`SessionManager::refresh_user`], and the
//! central expiry in [`SessionManager::authorized`] mutate it.

use std::{fmt, future::Future, sync::Arc};

use portal_shared::models::{AgentUser, LoginRequest, LoginResponse};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{api::PortalApi, error::ClientError, store::SessionStore};

/// Snapshot of the client's authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    current_user: Option<AgentUser>,
    is_loading: bool,
}

impl Session {
    /// State before the persisted session has been restored.
    fn pending() -> Self {
        Self {
            token: None,
            current_user: None,
            is_loading: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            token: None,
            current_user: None,
            is_loading: false,
        }
    }

    fn signed_in(token: String, user: AgentUser) -> Self {
        Self {
            token: Some(token),
            current_user: Some(user),
            is_loading: false,
        }
    }

    /// Bearer token of the verified session.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The verified agent; `None` when signed out.
    #[must_use]
    pub fn current_user(&self) -> Option<&AgentUser> {
        self.current_user.as_ref()
    }

    /// True while a restore or login call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Exactly `current_user().is_some()`.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    /// The current agent id, used as the earnings dependency.
    #[must_use]
    pub fn agent_id(&self) -> Option<&str> {
        self.current_user.as_ref().map(|user| user.id.as_str())
    }
}

/// Clears `is_loading` when dropped, so an abandoned restore or login never
/// leaves the session stuck in loading.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<Session>,
}

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a watch::Sender<Session>) -> Self {
        state.send_if_modified(|session| !std::mem::replace(&mut session.is_loading, true));
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state
            .send_if_modified(|session| std::mem::replace(&mut session.is_loading, false));
    }
}

/// Owns the session and its persisted slots.
pub struct SessionManager {
    api: Arc<dyn PortalApi>,
    store: Arc<dyn SessionStore>,
    state: watch::Sender<Session>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// A manager whose session is pending restore.
    pub fn new(api: Arc<dyn PortalApi>, store: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(Session::pending());
        Self { api, store, state }
    }

    /// Current session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Token snapshot for an outgoing request.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Copy of the signed-in agent's record.
    #[must_use]
    pub fn current_user(&self) -> Option<AgentUser> {
        self.state.borrow().current_user.clone()
    }

    /// Whether an agent is signed in right now.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Restore the session persisted by a previous run.
    ///
    /// Without a persisted token the session settles unauthenticated and no
    /// request is made. Otherwise the token is verified; anything short of
    /// a valid verification clears both persisted slots. Never fails.
    pub async fn restore(&self) -> Session {
        let _loading = LoadingGuard::start(&self.state);

        let token = self.store.load_token().unwrap_or_else(|err| {
            warn!(error = %err, "could not read persisted session token");
            None
        });
        let Some(token) = token else {
            debug!("no persisted session to restore");
            self.state.send_replace(Session::signed_out());
            return self.snapshot();
        };

        match self.api.verify(&token).await {
            Ok(response) => {
                if let Some(user) = response.into_verified_user() {
                    info!(user_id = %user.id, "session restored");
                    self.cache_user(&user);
                    self.state.send_replace(Session::signed_in(token, user));
                } else {
                    info!("persisted session token is no longer valid");
                    self.forget();
                }
            }
            Err(err) => {
                warn!(error = %err, "session verification failed");
                self.forget();
            }
        }

        self.snapshot()
    }

    /// Authenticate with email and password.
    ///
    /// On success the token and user are persisted and become the session.
    /// On failure the error is returned unchanged and neither the session
    /// user nor the persisted slots are touched.
    ///
    /// # Errors
    /// [`ClientError::Validation`] for a blank email or empty password
    /// (checked before any request), otherwise whatever the login call
    /// returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<AgentUser, ClientError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ClientError::Validation("Email is required".to_string()));
        }
        if password.is_empty() {
            return Err(ClientError::Validation("Password is required".to_string()));
        }

        let _loading = LoadingGuard::start(&self.state);
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let LoginResponse { token, user } = self.api.login(&request).await.inspect_err(|err| {
            info!(error = %err, "login rejected");
        })?;

        if let Err(err) = self.store.save_token(&token) {
            warn!(error = %err, "could not persist session token");
        }
        self.cache_user(&user);
        info!(user_id = %user.id, "logged in");
        self.state
            .send_replace(Session::signed_in(token, user.clone()));
        Ok(user)
    }

    /// Drop the session and both persisted slots. Navigation is up to the
    /// caller.
    pub fn logout(&self) {
        info!("logged out");
        self.forget();
    }

    /// Re-verify the current token and pick up changes to the user record.
    ///
    /// Failures are logged and otherwise ignored; the current user stays as
    /// it was.
    pub async fn refresh_user(&self) {
        let Some(token) = self.token() else {
            debug!("no session to refresh");
            return;
        };

        match self.api.verify(&token).await {
            Ok(response) => {
                let Some(user) = response.into_verified_user() else {
                    warn!("session refresh was not confirmed; keeping current user");
                    return;
                };
                let applied = self.state.send_if_modified(|session| {
                    if session.token.as_deref() != Some(token.as_str()) {
                        return false;
                    }
                    session.current_user = Some(user.clone());
                    true
                });
                if applied {
                    self.cache_user(&user);
                    debug!(user_id = %user.id, "session user refreshed");
                }
            }
            Err(err) => warn!(error = %err, "session refresh failed; keeping current user"),
        }
    }

    /// Run an authenticated call with the current token.
    ///
    /// The token is read once, when the call starts. An
    /// [`ClientError::Unauthorized`] result expires the session before the
    /// error is handed back.
    ///
    /// # Errors
    /// [`ClientError::NotAuthenticated`] without a session, otherwise the
    /// call's own error.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, ClientError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let token = self.token().ok_or(ClientError::NotAuthenticated)?;
        let result = call(token.clone()).await;
        if let Err(ClientError::Unauthorized { .. }) = &result {
            self.expire(&token);
        }
        result
    }

    /// Clear the session if it is still the one `token` belongs to.
    fn expire(&self, token: &str) {
        if self.state.borrow().token.as_deref() == Some(token) {
            info!("session expired; signing out");
            self.forget();
        }
    }

    fn forget(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "could not clear persisted session");
        }
        self.state.send_replace(Session::signed_out());
    }

    fn cache_user(&self, user: &AgentUser) {
        if let Err(err) = self.store.save_user(user) {
            warn!(error = %err, "could not cache session user");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::MemorySessionStore,
        testing::{FakeApi, agent, login_ok, verified},
    };
    use portal_shared::models::VerifyResponse;

    fn manager(api: &Arc<FakeApi>, store: &Arc<MemorySessionStore>) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(api.clone(), store.clone()))
    }

    fn assert_consistent(session: &Session) {
        assert_eq!(session.is_authenticated(), session.current_user().is_some());
    }

    #[tokio::test]
    async fn new_session_is_pending() {
        let session = manager(&FakeApi::new(), &Arc::new(MemorySessionStore::new()));
        let snapshot = session.snapshot();
        assert!(snapshot.is_loading());
        assert!(!snapshot.is_authenticated());
        assert_consistent(&snapshot);
    }

    #[tokio::test]
    async fn restore_without_token_makes_no_request() {
        let api = FakeApi::new();
        let session = manager(&api, &Arc::new(MemorySessionStore::new()));

        let restored = session.restore().await;

        assert!(api.calls().is_empty());
        assert!(!restored.is_loading());
        assert_eq!(restored.current_user(), None);
        assert_consistent(&restored);
    }

    #[tokio::test]
    async fn restore_with_valid_token_authenticates() {
        let api = FakeApi::new();
        api.reply("verify", verified("agent-1"));
        let store = Arc::new(MemorySessionStore::with_token("tok-1"));
        let session = manager(&api, &store);

        let restored = session.restore().await;

        assert!(restored.is_authenticated());
        assert_eq!(restored.token(), Some("tok-1"));
        assert_eq!(restored.agent_id(), Some("agent-1"));
        assert_eq!(api.calls()[0].token.as_deref(), Some("tok-1"));
        assert_eq!(store.load_user().unwrap(), Some(agent("agent-1")));
        assert_consistent(&restored);
    }

    #[tokio::test]
    async fn restore_with_rejected_token_clears_storage() {
        let api = FakeApi::new();
        api.reply(
            "verify",
            VerifyResponse {
                valid: false,
                user: None,
            },
        );
        let store = Arc::new(MemorySessionStore::with_token("stale"));
        let session = manager(&api, &store);

        let restored = session.restore().await;

        assert!(!restored.is_authenticated());
        assert!(!restored.is_loading());
        assert_eq!(restored.token(), None);
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[tokio::test]
    async fn restore_with_valid_flag_but_no_user_is_unauthenticated() {
        let api = FakeApi::new();
        api.reply(
            "verify",
            VerifyResponse {
                valid: true,
                user: None,
            },
        );
        let store = Arc::new(MemorySessionStore::with_token("tok"));
        let session = manager(&api, &store);

        assert!(!session.restore().await.is_authenticated());
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[tokio::test]
    async fn restore_error_degrades_to_signed_out() {
        let api = FakeApi::new();
        api.fail("verify", 500, Some("database unavailable"));
        let store = Arc::new(MemorySessionStore::with_token("tok"));
        let session = manager(&api, &store);

        let restored = session.restore().await;

        assert!(!restored.is_authenticated());
        assert!(!restored.is_loading());
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[tokio::test]
    async fn restore_reports_loading_until_verify_completes() {
        let api = FakeApi::new();
        let release = api.gated_reply("verify", verified("agent-1"));
        let session = manager(&api, &Arc::new(MemorySessionStore::with_token("tok")));

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.restore().await }
        });
        api.wait_for_calls("verify", 1).await;

        let in_flight = session.snapshot();
        assert!(in_flight.is_loading());
        assert!(!in_flight.is_authenticated());

        release.send(()).unwrap();
        let restored = task.await.unwrap();
        assert!(!restored.is_loading());
        assert!(restored.is_authenticated());
    }

    #[tokio::test]
    async fn abandoned_restore_does_not_stay_loading() {
        let api = FakeApi::new();
        let _release = api.gated_reply("verify", verified("agent-1"));
        let session = manager(&api, &Arc::new(MemorySessionStore::with_token("tok")));

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.restore().await }
        });
        api.wait_for_calls("verify", 1).await;
        assert!(session.snapshot().is_loading());

        task.abort();
        let _ = task.await;
        assert!(!session.snapshot().is_loading());
    }

    #[tokio::test]
    async fn login_persists_token_and_user() {
        let api = FakeApi::new();
        api.reply("login", login_ok("tok-9", "agent-9"));
        let store = Arc::new(MemorySessionStore::new());
        let session = manager(&api, &store);
        session.restore().await;

        let user = session.login("  agent-9@example.com ", "secret").await.unwrap();

        assert_eq!(user.id, "agent-9");
        assert_eq!(api.calls()[0].detail, "agent-9@example.com");
        assert_eq!(store.load_token().unwrap().as_deref(), Some("tok-9"));
        assert_eq!(store.load_user().unwrap(), Some(agent("agent-9")));
        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated());
        assert!(!snapshot.is_loading());
        assert_eq!(snapshot.token(), Some("tok-9"));
    }

    #[tokio::test]
    async fn rejected_login_surfaces_server_message() {
        let api = FakeApi::new();
        api.fail("login", 401, Some("Invalid credentials"));
        let store = Arc::new(MemorySessionStore::new());
        let session = manager(&api, &store);
        session.restore().await;

        let err = session.login("a@example.com", "wrong").await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid credentials");
        let snapshot = session.snapshot();
        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.is_loading());
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[tokio::test]
    async fn failed_login_keeps_existing_user() {
        let api = FakeApi::new();
        api.reply("login", login_ok("tok-1", "agent-1"));
        api.fail("login", 401, Some("Invalid credentials"));
        let store = Arc::new(MemorySessionStore::new());
        let session = manager(&api, &store);

        session.login("agent-1@example.com", "right").await.unwrap();
        let before = session.snapshot();
        session.login("other@example.com", "wrong").await.unwrap_err();

        let after = session.snapshot();
        assert_eq!(after.current_user(), before.current_user());
        assert_eq!(after.token(), Some("tok-1"));
        assert!(!after.is_loading());
        assert_eq!(store.load_token().unwrap().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn login_validation_happens_before_any_request() {
        let api = FakeApi::new();
        let session = manager(&api, &Arc::new(MemorySessionStore::new()));
        session.restore().await;

        let err = session.login("   ", "secret").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref message) if message == "Email is required"));

        let err = session.login("a@example.com", "").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref message) if message == "Password is required"));

        assert!(api.calls().is_empty());
        assert!(!session.snapshot().is_loading());
    }

    #[tokio::test]
    async fn login_reports_loading_while_in_flight() {
        let api = FakeApi::new();
        let release = api.gated_reply("login", login_ok("tok", "agent-1"));
        let session = manager(&api, &Arc::new(MemorySessionStore::new()));
        session.restore().await;

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.login("agent-1@example.com", "pw").await }
        });
        api.wait_for_calls("login", 1).await;
        assert!(session.snapshot().is_loading());

        release.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert!(!session.snapshot().is_loading());
    }

    #[tokio::test]
    async fn logout_then_restore_matches_first_launch() {
        let api = FakeApi::new();
        api.reply("login", login_ok("tok", "agent-1"));
        let store = Arc::new(MemorySessionStore::new());
        let session = manager(&api, &store);
        session.login("agent-1@example.com", "pw").await.unwrap();

        session.logout();

        assert!(!session.is_authenticated());
        assert_eq!(store.load_token().unwrap(), None);
        assert_eq!(store.load_user().unwrap(), None);

        let relaunched = manager(&api, &store);
        let restored = relaunched.restore().await;
        assert_eq!(api.call_count("verify"), 0);
        assert!(!restored.is_authenticated());
        assert!(!restored.is_loading());
    }

    #[tokio::test]
    async fn refresh_user_updates_on_success() {
        let api = FakeApi::new();
        api.reply("login", login_ok("tok", "agent-1"));
        let mut renamed = agent("agent-1");
        renamed.first_name = Some("Adaeze".to_string());
        api.reply(
            "verify",
            VerifyResponse {
                valid: true,
                user: Some(renamed.clone()),
            },
        );
        let store = Arc::new(MemorySessionStore::new());
        let session = manager(&api, &store);
        session.login("agent-1@example.com", "pw").await.unwrap();

        session.refresh_user().await;

        assert_eq!(session.current_user(), Some(renamed.clone()));
        assert_eq!(store.load_user().unwrap(), Some(renamed));
    }

    #[tokio::test]
    async fn refresh_user_swallows_failures() {
        let api = FakeApi::new();
        api.reply("login", login_ok("tok", "agent-1"));
        api.fail("verify", 503, None);
        api.reply(
            "verify",
            VerifyResponse {
                valid: false,
                user: None,
            },
        );
        let session = manager(&api, &Arc::new(MemorySessionStore::new()));
        session.login("agent-1@example.com", "pw").await.unwrap();

        session.refresh_user().await;
        session.refresh_user().await;

        assert_eq!(session.current_user(), Some(agent("agent-1")));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_user_without_session_is_a_no_op() {
        let api = FakeApi::new();
        let session = manager(&api, &Arc::new(MemorySessionStore::new()));
        session.restore().await;

        session.refresh_user().await;

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn authorized_requires_session() {
        let session = manager(&FakeApi::new(), &Arc::new(MemorySessionStore::new()));
        session.restore().await;

        let err = session
            .authorized(|_token| async { Ok::<_, ClientError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn authorized_passes_token_and_expires_on_unauthorized() {
        let api = FakeApi::new();
        api.reply("login", login_ok("tok-5", "agent-5"));
        let store = Arc::new(MemorySessionStore::new());
        let session = manager(&api, &store);
        session.login("agent-5@example.com", "pw").await.unwrap();

        let seen = session
            .authorized(|token| async move { Ok::<_, ClientError>(token) })
            .await
            .unwrap();
        assert_eq!(seen, "tok-5");
        assert!(session.is_authenticated());

        let err = session
            .authorized(|_token| async {
                Err::<(), _>(ClientError::from_status(401, Some("Token expired".to_string())))
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Token expired");
        assert!(!session.is_authenticated());
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[tokio::test]
    async fn other_errors_do_not_expire_session() {
        let api = FakeApi::new();
        api.reply("login", login_ok("tok", "agent-1"));
        let session = manager(&api, &Arc::new(MemorySessionStore::new()));
        session.login("agent-1@example.com", "pw").await.unwrap();

        let _ = session
            .authorized(|_token| async { Err::<(), _>(ClientError::from_status(500, None)) })
            .await;

        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let api = FakeApi::new();
        api.reply("login", login_ok("tok", "agent-1"));
        let session = manager(&api, &Arc::new(MemorySessionStore::new()));
        let mut changes = session.subscribe();

        session.restore().await;
        session.login("agent-1@example.com", "pw").await.unwrap();

        assert!(changes.has_changed().unwrap());
        let latest = changes.borrow_and_update().clone();
        assert!(latest.is_authenticated());
        assert_consistent(&latest);
    }
}

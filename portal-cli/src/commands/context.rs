//! Wiring shared by every command: configuration, logging, and the client
//! stack bound to the persisted session.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use portal_client::{
    FetchController, FetchState, FileSessionStore, HttpPortalApi, PortalApi, Session,
    SessionManager,
    actions::Actions,
    resources::Resources,
    routes::{Route, RouteDecision, resolve},
};
use portal_shared::config::{ConfigOverrides, PortalConfig};
use serde::Serialize;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::GlobalArgs;

/// Resolve configuration from the file, environment, and global flags.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or is invalid.
pub fn load_config(args: &GlobalArgs) -> Result<PortalConfig> {
    let overrides = ConfigOverrides {
        api_base_url: args.api_url.clone(),
        storage_dir: args.storage_dir.clone(),
        log_level: args.log_level.clone(),
    };
    PortalConfig::load_config(args.config.as_deref(), overrides)
        .context("failed to load configuration")
}

fn build_env_filter(level: &str) -> EnvFilter {
    let default_level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the configured
/// level.
pub fn init_tracing(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// The client stack for one command invocation.
pub struct Portal {
    /// Resolved configuration.
    pub config: PortalConfig,
    /// Session shared by the controllers below.
    pub session: Arc<SessionManager>,
    /// Read controllers.
    pub resources: Resources,
    /// Write operations.
    pub actions: Actions,
    json: bool,
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("json", &self.json)
            .finish_non_exhaustive()
    }
}

impl Portal {
    /// Build the client stack over the configured API and session directory.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(config: PortalConfig, json: bool) -> Result<Self> {
        let api: Arc<dyn PortalApi> = Arc::new(
            HttpPortalApi::new(config.api_base_url.clone())
                .context("failed to build HTTP client")?,
        );
        let session_dir = config.session_dir();
        debug!(dir = %session_dir.display(), "using session directory");
        let store = Arc::new(FileSessionStore::new(session_dir));
        let session = Arc::new(SessionManager::new(Arc::clone(&api), store));

        Ok(Self {
            resources: Resources::new(Arc::clone(&api), Arc::clone(&session)),
            actions: Actions::new(api, Arc::clone(&session)),
            session,
            config,
            json,
        })
    }

    /// Restore the persisted session and apply the access rules of `route`.
    ///
    /// # Errors
    /// Returns an error when the route would redirect, telling the user how
    /// to get there.
    pub async fn open(&self, route: &Route) -> Result<Session> {
        let session = self.session.restore().await;
        match resolve(&session, route) {
            RouteDecision::Render => Ok(session),
            RouteDecision::RedirectToLogin { return_to } => bail!(
                "not signed in. run `agent-portal login --return-to {return_to}` to continue"
            ),
            RouteDecision::Redirect(target) => {
                let who = session
                    .current_user()
                    .map_or_else(String::new, |user| format!(" as {}", user.email));
                bail!("already signed in{who}; continue at {target}")
            }
            RouteDecision::Pending => bail!("session restore did not finish"),
        }
    }

    /// Drive `controller` with `deps` and return the loaded payload.
    ///
    /// # Errors
    /// Returns the controller's error message, with a sign-in hint when the
    /// failure ended the session.
    pub async fn load<D, T>(&self, controller: &FetchController<D, T>, deps: D) -> Result<Arc<T>>
    where
        D: Clone + PartialEq + Send + 'static,
        T: Send + Sync + 'static,
    {
        let had_session = self.session.is_authenticated();
        if let Some(fetch) = controller.update(deps) {
            fetch.await;
        }

        match controller.state() {
            FetchState::Success(data) => Ok(data),
            FetchState::Failure(message) if had_session && !self.session.is_authenticated() => {
                Err(anyhow!("{message}. run `agent-portal login` to sign in again"))
            }
            FetchState::Failure(message) => Err(anyhow!(message)),
            FetchState::Idle => bail!("{} is not available without a signed-in agent", controller.label()),
            FetchState::Loading { .. } => bail!("{} did not finish loading", controller.label()),
        }
    }

    /// Print `value` as JSON when `--json` was given, otherwise run `human`.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

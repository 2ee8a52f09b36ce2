//! Write operations: applying to jobs, inviting recruits, editing the
//! profile.
//!
//! Inputs are validated before any request. Failures are returned to the
//! caller and leave every cached read untouched.

use std::sync::Arc;

use portal_shared::models::{EnquiryRequest, ProfileUpdate, SendInvitationRequest};
use tracing::info;

use crate::{api::PortalApi, error::ClientError, session::SessionManager};

/// What the agent fills in when applying to a job. Name and email default to
/// the signed-in agent's own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDraft {
    /// Message to the job poster; required.
    pub message: String,
    /// Contact name override.
    pub name: Option<String>,
    /// Contact email override.
    pub email: Option<String>,
    /// Contact phone; defaults to the profile phone.
    pub phone: Option<String>,
}

/// Loose email shape check: one `@` with text on both sides and a dot in the
/// domain.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Write operations bound to one API client and session.
#[derive(Clone)]
pub struct Actions {
    api: Arc<dyn PortalApi>,
    session: Arc<SessionManager>,
}

impl std::fmt::Debug for Actions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actions")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Actions {
    /// Actions that authenticate through `session`.
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>, session: Arc<SessionManager>) -> Self {
        Self { api, session }
    }

    /// Submit an enquiry for `job_id`.
    ///
    /// # Errors
    /// [`ClientError::Validation`] for a missing job id, an empty message or
    /// a malformed email; [`ClientError::Rejected`] when the server does not
    /// record the application; otherwise the request's error.
    pub async fn apply_to_job(&self, job_id: &str, draft: ApplicationDraft) -> Result<(), ClientError> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(ClientError::Validation("Job is required".to_string()));
        }
        let message = draft.message.trim();
        if message.is_empty() {
            return Err(ClientError::Validation("Message is required".to_string()));
        }

        let user = self.session.current_user();
        let name = non_blank(draft.name)
            .or_else(|| user.as_ref().map(portal_shared::models::AgentUser::display_name))
            .ok_or_else(|| ClientError::Validation("Name is required".to_string()))?;
        let email = non_blank(draft.email)
            .or_else(|| user.as_ref().map(|user| user.email.clone()))
            .unwrap_or_default();
        if !is_valid_email(&email) {
            return Err(ClientError::Validation(
                "A valid email address is required".to_string(),
            ));
        }

        let request = EnquiryRequest {
            name,
            email,
            phone: non_blank(draft.phone).or_else(|| user.and_then(|user| user.phone)),
            message: message.to_string(),
        };

        let api = Arc::clone(&self.api);
        let response = self
            .session
            .authorized(|token| async move { api.enquire(&token, job_id, &request).await })
            .await?;
        if !response.success {
            return Err(ClientError::Rejected("Failed to submit application".to_string()));
        }
        info!(job_id, "application submitted");
        Ok(())
    }

    /// Invite a recruit by email under the agent's sponsor code.
    ///
    /// # Errors
    /// [`ClientError::Validation`] for a malformed email,
    /// [`ClientError::Rejected`] when the server reports the invitation was
    /// not sent, otherwise the request's error.
    pub async fn send_invitation(&self, email: &str, name: Option<String>) -> Result<(), ClientError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(ClientError::Validation(
                "A valid email address is required".to_string(),
            ));
        }
        let request = SendInvitationRequest {
            email: email.to_string(),
            name: non_blank(name),
        };

        let api = Arc::clone(&self.api);
        let response = self
            .session
            .authorized(|token| async move { api.send_invitation(&token, &request).await })
            .await?;
        if !response.sent {
            return Err(ClientError::Rejected("Failed to send invitation".to_string()));
        }
        info!("invitation sent");
        Ok(())
    }

    /// Apply a partial profile update, then refresh the session user.
    ///
    /// # Errors
    /// [`ClientError::Validation`] when the patch sets nothing,
    /// [`ClientError::Rejected`] when the server does not apply it, otherwise
    /// the request's error.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ClientError> {
        if update.is_empty() {
            return Err(ClientError::Validation("Nothing to update".to_string()));
        }

        let api = Arc::clone(&self.api);
        let response = self
            .session
            .authorized(|token| async move { api.update_profile(&token, update).await })
            .await?;
        if !response.success {
            return Err(ClientError::Rejected("Failed to update profile".to_string()));
        }
        info!("profile updated");
        self.session.refresh_user().await;
        Ok(())
    }
}

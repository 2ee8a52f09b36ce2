//! Recruiting: sponsor code, invitation history, and sending invitations.

use anyhow::Result;
use portal_client::routes::Route;
use portal_shared::models::Invitation;

use super::context::Portal;

/// List sent invitations, optionally only those still pending.
pub async fn invitations(portal: &Portal, pending_only: bool) -> Result<()> {
    portal.open(&Route::Recruit).await?;

    if pending_only {
        let pending = portal.resources.pending_invitations();
        let list = portal.load(&pending, ()).await?;
        return portal.emit(&*list, |list| {
            if list.invitations.is_empty() {
                println!("No pending invitations.");
            }
            list.invitations.iter().for_each(print_invitation);
        });
    }

    let stats = portal.resources.invitations();
    let stats = portal.load(&stats, ()).await?;
    portal.emit(&*stats, |stats| {
        if let Some(code) = &stats.sponsor_code {
            println!("sponsor code: {code}");
        }
        println!(
            "{} invited, {} joined",
            stats.invitations.len(),
            stats.accepted_count()
        );
        stats.invitations.iter().for_each(print_invitation);
    })
}

/// Invite a recruit by email.
pub async fn invite(portal: &Portal, email: &str, name: Option<String>) -> Result<()> {
    portal.open(&Route::Recruit).await?;
    portal.actions.send_invitation(email, name).await?;
    println!("Invitation sent to {}", email.trim());
    Ok(())
}

fn print_invitation(invitation: &Invitation) {
    let name = invitation.name.as_deref().unwrap_or("-");
    let status = invitation.status.as_deref().unwrap_or("pending");
    println!("{:<32} {:<24} {status}", invitation.email, name);
}

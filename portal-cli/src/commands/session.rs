use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use clap::Args;
use portal_client::routes::{Route, post_login_destination};
use portal_shared::models::AgentUser;
use rpassword::prompt_password;

use super::context::Portal;

/// Credentials for `login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,

    /// Account password; prompted for when omitted
    #[arg(long, env = "AGENT_PORTAL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Page to continue to once signed in (e.g. /earnings)
    #[arg(long, value_name = "PATH")]
    pub return_to: Option<Route>,
}

/// Sign in, prompting for missing credentials.
pub async fn login(portal: &Portal, args: LoginArgs) -> Result<()> {
    portal.open(&Route::Login).await?;

    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => prompt_password("Password: ").context("failed to read password")?,
    };

    let user = portal.session.login(&email, &password).await?;
    let destination = post_login_destination(args.return_to);
    portal.emit(&user, |user| {
        println!("Logged in as {}", user.email);
        print_user(user);
        println!("Continue at {destination}");
    })
}

/// Drop the session, locally and on disk.
pub fn logout(portal: &Portal) {
    portal.session.logout();
    println!(
        "Signed out; cleared session at {}",
        portal.config.session_dir().display()
    );
}

/// Print the signed-in agent, optionally refreshed from the server.
pub async fn whoami(portal: &Portal, refresh: bool) -> Result<()> {
    portal.open(&Route::Dashboard).await?;
    if refresh {
        portal.session.refresh_user().await;
    }
    let Some(user) = portal.session.current_user() else {
        bail!("session ended; run `agent-portal login` to sign in again");
    };
    portal.emit(&user, print_user)
}

pub(crate) fn print_user(user: &AgentUser) {
    println!("name: {}", user.display_name());
    println!("email: {}", user.email);
    if !user.roles.is_empty() {
        println!(
            "roles: {}",
            user.roles
                .iter()
                .map(|role| role.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if let Some(code) = &user.sponsor_code {
        println!("sponsor code: {code}");
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

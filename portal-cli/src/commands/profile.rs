use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use portal_client::routes::Route;
use portal_shared::models::ProfileUpdate;

use super::{context::Portal, session::print_user};

/// View or edit your agent profile.
#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show your profile
    Show,
    /// Change profile fields; only the given fields are sent
    Update(UpdateArgs),
}

/// Profile fields to change.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// New first name
    #[arg(long)]
    pub first_name: Option<String>,
    /// New last name
    #[arg(long)]
    pub last_name: Option<String>,
    /// New phone number
    #[arg(long)]
    pub phone: Option<String>,
    /// New street address
    #[arg(long)]
    pub address: Option<String>,
    /// New city
    #[arg(long)]
    pub city: Option<String>,
    /// New state
    #[arg(long)]
    pub state: Option<String>,
    /// New zip code
    #[arg(long)]
    pub zip_code: Option<String>,
    /// New country
    #[arg(long)]
    pub country: Option<String>,
}

impl From<UpdateArgs> for ProfileUpdate {
    fn from(args: UpdateArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            phone: args.phone,
            address: args.address,
            city: args.city,
            state: args.state,
            zip_code: args.zip_code,
            country: args.country,
        }
    }
}

/// Show or update the profile, then print it.
pub async fn run(portal: &Portal, command: ProfileCommand) -> Result<()> {
    portal.open(&Route::Profile).await?;
    match command {
        ProfileCommand::Show => {}
        ProfileCommand::Update(args) => {
            portal.actions.update_profile(&args.into()).await?;
            println!("Profile updated.");
        }
    }

    let Some(user) = portal.session.current_user() else {
        bail!("session ended; run `agent-portal login` to sign in again");
    };
    portal.emit(&user, |user| {
        print_user(user);
        if let Some(phone) = &user.phone {
            println!("phone: {phone}");
        }
        if let Some(address) = user.formatted_address() {
            println!("address: {address}");
        }
        println!(
            "verified: email {}, phone {}",
            yes_no(user.is_email_verified()),
            yes_no(user.is_phone_verified())
        );
    })
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

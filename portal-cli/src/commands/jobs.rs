//! Job board commands: browsing listings, posted requests, and applications.

use anyhow::Result;
use clap::{Args, Subcommand};
use portal_client::{actions::ApplicationDraft, routes::Route};
use portal_shared::models::{Job, JobFilter};

use super::context::Portal;

/// Browse the job board.
#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// List open jobs
    List(ListArgs),
    /// Show one job by slug
    Show {
        /// Job slug or id
        slug: String,
    },
    /// List the job-type catalogue
    Types,
    /// List jobs you have posted
    Requests,
}

/// Filters and paging for `jobs list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only jobs of this type (see `jobs types`)
    #[arg(long = "type", value_name = "TYPE")]
    pub job_type: Option<String>,

    /// Only jobs in this state
    #[arg(long)]
    pub state: Option<String>,

    /// Only jobs in this city
    #[arg(long)]
    pub city: Option<String>,

    /// Page size; defaults to the configured page size
    #[arg(long)]
    pub limit: Option<u32>,

    /// Number of jobs to skip
    #[arg(long)]
    pub offset: Option<u32>,
}

/// The enquiry sent by `apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Id of the job to apply to
    pub job_id: String,

    /// Message to the poster
    #[arg(long, short)]
    pub message: String,

    /// Contact name; defaults to your profile name
    #[arg(long)]
    pub name: Option<String>,

    /// Contact email; defaults to your account email
    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone; defaults to your profile phone
    #[arg(long)]
    pub phone: Option<String>,
}

/// Dispatch a `jobs` subcommand.
pub async fn run(portal: &Portal, command: JobsCommand) -> Result<()> {
    match command {
        JobsCommand::List(args) => list(portal, args).await,
        JobsCommand::Show { slug } => show(portal, slug).await,
        JobsCommand::Types => types(portal).await,
        JobsCommand::Requests => requests(portal).await,
    }
}

async fn list(portal: &Portal, args: ListArgs) -> Result<()> {
    portal.open(&Route::Jobs).await?;
    let filter = JobFilter {
        job_type: args.job_type,
        state: args.state,
        city: args.city,
        limit: Some(args.limit.unwrap_or(portal.config.page_size)),
        offset: args.offset,
    };

    let jobs = portal.resources.jobs();
    let listing = portal.load(&jobs, filter).await?;
    portal.emit(&*listing, |listing| {
        if listing.jobs.is_empty() {
            println!("No jobs found.");
            return;
        }
        for job in &listing.jobs {
            print_job_line(job);
        }
        println!("{} of {} jobs", listing.jobs.len(), listing.total);
    })
}

async fn show(portal: &Portal, slug: String) -> Result<()> {
    let route = Route::JobDetail(slug.clone());
    portal.open(&route).await?;

    let job = portal.resources.job();
    let detail = portal.load(&job, slug).await?;
    portal.emit(&*detail, |detail| {
        let job = &detail.job;
        println!("{}", job.title);
        println!("id: {}", job.id);
        if let Some(kind) = &job.job_type {
            println!("type: {kind}");
        }
        if let Some(location) = job.location() {
            println!("location: {location}");
        }
        if let Some(rate) = job.pay_rate {
            println!("pay rate: ${rate:.2}/hr");
        }
        if let Some(status) = &job.status {
            println!("status: {status}");
        }
        if let Some(description) = &job.description {
            println!();
            println!("{description}");
        }
    })
}

async fn types(portal: &Portal) -> Result<()> {
    portal.open(&Route::Jobs).await?;
    let catalogue = portal.resources.job_types();
    let types = portal.load(&catalogue, ()).await?;
    portal.emit(&*types, |types| {
        for kind in &types.types {
            println!("{:<20} {}", kind.slug, kind.name);
        }
    })
}

async fn requests(portal: &Portal) -> Result<()> {
    portal.open(&Route::Dashboard).await?;
    let requests = portal.resources.my_requests();
    let posted = portal.load(&requests, ()).await?;
    portal.emit(&*posted, |posted| {
        if posted.jobs.is_empty() {
            println!("You have not posted any jobs.");
        }
        for job in &posted.jobs {
            print_job_line(job);
        }
    })
}

/// Print the jobs you have applied to.
pub async fn applications(portal: &Portal) -> Result<()> {
    portal.open(&Route::Applications).await?;
    let applications = portal.resources.applications();
    let list = portal.load(&applications, ()).await?;
    portal.emit(&*list, |list| {
        if list.applications.is_empty() {
            println!("No applications yet.");
            return;
        }
        for application in &list.applications {
            let title = application
                .job_title
                .as_deref()
                .unwrap_or(&application.job_id);
            let submitted = application
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            println!("{:<10} {:<40} {submitted}", application.status_label(), title);
        }
        println!("{} applications", list.total);
    })
}

/// Apply to a job; signed-in agents only, returning to the application list
/// after login.
pub async fn apply(portal: &Portal, args: ApplyArgs) -> Result<()> {
    portal.open(&Route::Applications).await?;

    let draft = ApplicationDraft {
        message: args.message,
        name: args.name,
        email: args.email,
        phone: args.phone,
    };
    portal.actions.apply_to_job(&args.job_id, draft).await?;
    println!("Application sent for job {}", args.job_id);
    Ok(())
}

fn print_job_line(job: &Job) {
    let location = job.location().unwrap_or_default();
    let rate = job
        .pay_rate
        .map(|rate| format!("${rate:.2}/hr"))
        .unwrap_or_default();
    println!(
        "{:<24} {:<40} {:<20} {rate}",
        job.lookup_key(),
        job.title,
        location
    );
}

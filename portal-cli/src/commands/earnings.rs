use anyhow::Result;
use chrono::Utc;
use portal_client::{earnings::weekly_totals, routes::Route};

use super::context::Portal;

const BAR_WIDTH: f64 = 40.0;

/// Print the weekly earnings chart.
pub async fn run(portal: &Portal, weeks: Option<u32>) -> Result<()> {
    let session = portal.open(&Route::Earnings).await?;
    let weeks = weeks.unwrap_or(portal.config.earnings_weeks);

    let earnings = portal.resources.earnings();
    let summary = portal
        .load(&earnings, session.agent_id().map(str::to_string))
        .await?;

    portal.emit(&*summary, |summary| {
        println!("total earned: ${:.2}", summary.total_earned);
        println!("this week:    ${:.2}", summary.this_week);
        println!("pending:      ${:.2}", summary.pending);

        let buckets = weekly_totals(&summary.commissions, Utc::now().date_naive(), weeks);
        let peak = buckets
            .iter()
            .map(|bucket| bucket.total)
            .fold(0.0_f64, f64::max);
        println!();
        for bucket in &buckets {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let width = if peak > 0.0 {
                (bucket.total / peak * BAR_WIDTH).round() as usize
            } else {
                0
            };
            println!(
                "{}  {:<40} ${:.2}",
                bucket.start.format("%b %d"),
                "#".repeat(width),
                bucket.total
            );
        }

        let pending = summary
            .commissions
            .iter()
            .filter(|commission| commission.is_pending())
            .count();
        if pending > 0 {
            println!();
            println!("{pending} commission(s) awaiting payout");
        }
    })
}

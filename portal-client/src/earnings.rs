//! Weekly commission totals for the earnings chart.

use chrono::{Datelike, Days, NaiveDate};
use portal_shared::{config::MAX_EARNINGS_WEEKS, models::Commission};

/// Total commission for one Monday-to-Sunday week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekBucket {
    /// Monday.
    pub start: NaiveDate,
    /// Sunday.
    pub end: NaiveDate,
    /// Sum of commission amounts credited in the week.
    pub total: f64,
}

/// Monday of the week containing `day`.
#[must_use]
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.weekday().num_days_from_monday()))
}

/// Sum commission amounts into `weeks` consecutive weeks, oldest first,
/// ending with the week that contains `today`.
///
/// `weeks` is capped at [`MAX_EARNINGS_WEEKS`]. Commissions dated outside
/// those weeks are ignored; weeks without commissions total zero.
#[must_use]
pub fn weekly_totals(commissions: &[Commission], today: NaiveDate, weeks: u32) -> Vec<WeekBucket> {
    let current = week_start(today);
    let mut buckets: Vec<WeekBucket> = (0..weeks.min(MAX_EARNINGS_WEEKS))
        .rev()
        .filter_map(|back| {
            let start = current.checked_sub_days(Days::new(7 * u64::from(back)))?;
            Some(WeekBucket {
                start,
                end: start + Days::new(6),
                total: 0.0,
            })
        })
        .collect();

    for commission in commissions {
        let day = commission.created_at.date_naive();
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|bucket| bucket.start <= day && day <= bucket.end)
        {
            bucket.total += commission.amount;
        }
    }

    buckets
}

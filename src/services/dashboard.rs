//! Dashboard aggregates: the trailing twelve-month visit histogram and the
//! headline summary.

use chrono::{DateTime, Datelike, Locale, Months, NaiveDate, Utc};
use tracing::{debug, warn};

use super::Services;
use crate::error::{Error, Result};
use crate::logging::Timer;
use crate::models::{DashboardSummary, MonthlyBucket, MonthlyVisitReport, Visit};

/// Number of months covered by the histogram, current month included
pub const HISTOGRAM_MONTHS: u32 = 12;

fn first_of_month(at: DateTime<Utc>) -> NaiveDate {
    NaiveDate::from_ymd_opt(at.year(), at.month(), 1).unwrap_or_else(|| at.date_naive())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// First day of each histogram month, oldest first
fn bucket_months(now: DateTime<Utc>) -> Vec<NaiveDate> {
    let current = first_of_month(now);
    (0..HISTOGRAM_MONTHS)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .collect()
}

/// Half-open `[start, end)` range covered by the histogram at `now`: from the
/// first day of the earliest month to the first day of the next month
pub fn histogram_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let current = first_of_month(now);
    let start = current
        .checked_sub_months(Months::new(HISTOGRAM_MONTHS - 1))
        .unwrap_or(current);
    let end = current
        .checked_add_months(Months::new(1))
        .unwrap_or(current);
    (start_of_day(start), start_of_day(end))
}

/// Count `visits` into twelve zero-initialised monthly buckets.
///
/// Visits outside the window are ignored. Labels are `"<month abbreviation>
/// <year>"` in `locale`.
pub fn build_monthly_histogram(
    visits: &[Visit],
    now: DateTime<Utc>,
    locale: Locale,
) -> Vec<MonthlyBucket> {
    let months = bucket_months(now);
    let mut buckets: Vec<MonthlyBucket> = months
        .iter()
        .map(|month| MonthlyBucket {
            key: month.format("%Y-%m").to_string(),
            month: month.format_localized("%b %Y", locale).to_string(),
            count: 0,
        })
        .collect();

    let (start, end) = histogram_window(now);
    for visit in visits.iter().filter(|v| v.date >= start && v.date < end) {
        let key = visit.date.format("%Y-%m").to_string();
        if let Some(bucket) = buckets.iter_mut().find(|b| b.key == key) {
            bucket.count += 1;
        }
    }

    buckets
}

impl Services {
    /// Visits per month over the trailing twelve months.
    ///
    /// A store failure yields an empty report carrying the error message.
    pub async fn monthly_visit_histogram(&self, now: DateTime<Utc>) -> MonthlyVisitReport {
        let timer = Timer::start("monthly_visit_histogram");
        let (start, end) = histogram_window(now);

        let report = match self.repos.visits.find_between(start, end).await {
            Ok(visits) => MonthlyVisitReport {
                months: build_monthly_histogram(&visits, now, self.locale),
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "Could not load visits for the monthly histogram");
                MonthlyVisitReport::failed(format!("Visits unavailable: {}", e))
            },
        };

        timer.stop();
        report
    }

    /// Record counts, pets per species and the most recent visits.
    ///
    /// A failing visit store leaves the visit figures empty and sets
    /// `visitError`; any other failure aborts.
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        let owner_count = self.repos.owners.count().await?;
        let pet_count = self.repos.pets.count().await?;
        let vet_count = self.repos.veterinarians.count().await?;
        let pet_types = self.repos.pets.count_by_species().await?;

        let visits = async {
            let count = self.repos.visits.count().await?;
            let recent = self.repos.visits.find_recent(self.recent_visits).await?;
            let recent = self.resolve_visits(recent, true).await?;
            Ok::<_, Error>((count, recent))
        }
        .await;

        let (visit_count, recent_visits, visit_error) = match visits {
            Ok((count, recent)) => (count, recent, None),
            Err(e) => {
                crate::log_error!(e, "Dashboard visit figures unavailable");
                (0, Vec::new(), Some(e.to_string()))
            },
        };

        debug!(owner_count, pet_count, vet_count, visit_count, "Dashboard summary built");

        Ok(DashboardSummary {
            owner_count: non_negative(owner_count),
            pet_count: non_negative(pet_count),
            vet_count: non_negative(vet_count),
            visit_count: non_negative(visit_count),
            pet_types,
            recent_visits,
            visit_error,
        })
    }
}

fn non_negative(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

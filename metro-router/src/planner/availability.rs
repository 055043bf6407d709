//! Operating hours at a station.

use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::{ServiceAvailability, hhmm};
use crate::schedule::{ScheduleError, ScheduleProvider};

/// Check whether `station` has scheduled service at `at`.
///
/// First and last departures are aggregated across every line serving the
/// station on `at`'s date. Late trips of the previous service day that are
/// still running at `at` also count as service. When the station is closed,
/// the suggestion is the first departure of the day (too early) or of the
/// following day (too late, or no service at all that day).
pub async fn check_availability<P: ScheduleProvider>(
    provider: &P,
    station: &str,
    at: NaiveDateTime,
) -> Result<ServiceAvailability, ScheduleError> {
    let date = at.date();
    let today = service_span(provider, station, date).await?;

    if let Some(yesterday) = date.checked_sub_days(Days::new(1)) {
        if let Some((_, late)) = service_span(provider, station, yesterday).await? {
            if late >= at {
                let (first_departure, _) = today.unzip();
                return Ok(ServiceAvailability {
                    first_departure,
                    last_departure: Some(late),
                    is_available: true,
                    suggested_alternative: None,
                    message: format!("late service at {station} runs until {}", hhmm(late)),
                });
            }
        }
    }

    let Some((first, last)) = today else {
        let next = next_first_departure(provider, station, date).await?;
        debug!(station, %date, ?next, "no service on date");
        return Ok(ServiceAvailability {
            suggested_alternative: next,
            ..ServiceAvailability::unavailable(format!("no service at {station} on {date}"))
        });
    };

    let availability = if at < first {
        ServiceAvailability {
            first_departure: Some(first),
            last_departure: Some(last),
            is_available: false,
            suggested_alternative: Some(first),
            message: format!("service at {station} starts at {}", hhmm(first)),
        }
    } else if at > last {
        ServiceAvailability {
            first_departure: Some(first),
            last_departure: Some(last),
            is_available: false,
            suggested_alternative: next_first_departure(provider, station, date).await?,
            message: format!("service at {station} ended at {}", hhmm(last)),
        }
    } else {
        ServiceAvailability {
            first_departure: Some(first),
            last_departure: Some(last),
            is_available: true,
            suggested_alternative: None,
            message: format!(
                "service at {station} runs from {} to {}",
                hhmm(first),
                hhmm(last)
            ),
        }
    };
    Ok(availability)
}

/// Earliest and latest departure at `station` on `date` across its lines.
/// Trips ending at the station don't count.
async fn service_span<P: ScheduleProvider>(
    provider: &P,
    station: &str,
    date: NaiveDate,
) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, ScheduleError> {
    let lines = provider.lines(station).await?;
    let mut span: Option<(NaiveDateTime, NaiveDateTime)> = None;
    for line in lines.iter() {
        let departures = provider.station_schedules(station, line, date).await?;
        let mut boardable = departures.iter().filter(|d| !d.terminates);
        let Some(first) = boardable.next() else {
            continue;
        };
        let last = boardable.last().unwrap_or(first);
        span = Some(match span {
            None => (first.departure, last.departure),
            Some((lo, hi)) => (lo.min(first.departure), hi.max(last.departure)),
        });
    }
    Ok(span)
}

async fn next_first_departure<P: ScheduleProvider>(
    provider: &P,
    station: &str,
    date: NaiveDate,
) -> Result<Option<NaiveDateTime>, ScheduleError> {
    let Some(next) = date.checked_add_days(Days::new(1)) else {
        return Ok(None);
    };
    Ok(service_span(provider, station, next)
        .await?
        .map(|(first, _)| first))
}

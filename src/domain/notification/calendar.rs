//! Calendar helpers evaluated in the scheduler's time zone.

use chrono::{Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::domain::foundation::Timestamp;

/// True when `date` is the last calendar day of its month.
///
/// Computed as the first day of the following month minus one day.
pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    last_day_of_month(date) == date
}

/// Last calendar day of `date`'s month.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}

/// Yesterday's `[00:00, 24:00)` in `tz`, as UTC instants.
pub fn previous_day_window<Tz: TimeZone>(now: Timestamp, tz: &Tz) -> (Timestamp, Timestamp) {
    let today = now.date_in(tz);
    let yesterday = today.pred_opt().unwrap_or(today);
    (start_of_day(yesterday, tz), start_of_day(today, tz))
}

/// First instant of `date` in `tz`.
///
/// Where a DST gap swallows midnight the earliest valid local time after it
/// is used.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Timestamp {
    let midnight = date.and_time(NaiveTime::MIN);
    let mut local = midnight;
    for _ in 0..4 {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return Timestamp::from_datetime(dt.with_timezone(&Utc));
            }
            LocalResult::None => local = local + Duration::minutes(30),
        }
    }
    Timestamp::from_datetime(Utc.from_utc_datetime(&midnight))
}

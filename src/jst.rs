//! JST (UTC+9) timezone helpers. All forecast/comment timestamps are canonicalized to
//! JST at the point of ingestion so downstream code can assume a single timezone.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

pub fn jst_offset() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("9h offset is always valid")
}

/// Re-expresses a `DateTime<Utc>` as the equivalent JST wall-clock time, still represented
/// as `DateTime<Utc>` internally (this crate stores instants, not wall-clock strings;
/// JST-ness only matters when deriving hour-of-day / date-boundary values).
pub fn jst_hour(dt: DateTime<Utc>) -> u32 {
    dt.with_timezone(&jst_offset()).hour()
}

pub fn jst_date(dt: DateTime<Utc>) -> chrono::NaiveDate {
    dt.with_timezone(&jst_offset()).date_naive()
}

pub fn jst_now() -> DateTime<Utc> {
    Utc::now()
}

use chrono::Timelike;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn jst_hour_is_nine_hours_ahead_of_utc() {
        let utc_midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(jst_hour(utc_midnight), 9);
    }

    #[test]
    fn jst_date_rolls_over_at_utc_1500() {
        let just_before = Utc.with_ymd_and_hms(2024, 1, 1, 14, 59, 0).unwrap();
        let just_after = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
        assert_eq!(jst_date(just_before), chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(jst_date(just_after), chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }
}

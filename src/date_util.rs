use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap() - Duration::days(1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap() - Duration::days(1)
    }
}

/// Get the quarter (1-4) for a given date.
pub fn quarter_of(d: NaiveDate) -> u8 {
    ((d.month() - 1) / 3 + 1) as u8
}

/// Monday of the week containing `d`.
pub fn week_start(d: NaiveDate) -> NaiveDate {
    d - Duration::days(d.weekday().num_days_from_monday() as i64)
}

/// First day of the month containing `d`.
pub fn month_start(d: NaiveDate) -> NaiveDate {
    d - Duration::days(d.day0() as i64)
}

/// Midnight UTC at the start of `d`.
pub fn start_of_day(d: NaiveDate) -> DateTime<Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}

/// Last representable nanosecond of `d` in UTC.
pub fn end_of_day(d: NaiveDate) -> DateTime<Utc> {
    start_of_day(d + Duration::days(1)) - Duration::nanoseconds(1)
}

/// Convert a millisecond span to fractional days.
pub fn millis_to_days(ms: i64) -> f64 {
    ms as f64 / MILLIS_PER_DAY as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2025, 1),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert_eq!(
            last_day_of_month(2025, 2),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        ); // Leap year
        assert_eq!(
            last_day_of_month(2025, 12),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()), 1);
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()), 2);
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()), 3);
        assert_eq!(
            quarter_of(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()),
            4
        );
    }

    #[test]
    fn test_week_start() {
        // 2025-01-15 is a Wednesday
        let wed = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(week_start(wed), NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());

        let mon = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();
        assert_eq!(week_start(mon), mon);

        // Sunday belongs to the week that started the previous Monday
        let sun = NaiveDate::from_ymd_opt(2025, 1, 19).unwrap();
        assert_eq!(week_start(sun), mon);
        assert_eq!(week_start(sun).weekday(), Weekday::Mon);

        // Week crossing a year boundary
        let jan1 = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(week_start(jan1), NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
    }

    #[test]
    fn test_month_start() {
        assert_eq!(
            month_start(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert_eq!(
            month_start(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_day_bounds() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(start_of_day(d), Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap());
        let end = end_of_day(d);
        assert_eq!(end.date_naive(), d);
        assert_eq!(
            end + Duration::nanoseconds(1),
            Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_millis_to_days() {
        assert_eq!(millis_to_days(0), 0.0);
        assert_eq!(millis_to_days(MILLIS_PER_DAY * 2), 2.0);
        assert_eq!(millis_to_days(MILLIS_PER_DAY / 2), 0.5);
    }
}

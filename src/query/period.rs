use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc, Weekday};
use regex::Regex;

use crate::date_util::{end_of_day, last_day_of_month, quarter_of, start_of_day};
use crate::error::{Error, Result};

static RE_HALF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-H([12])$").unwrap());
static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

/// A named span of calendar days used to pick the analytics window.
///
/// To-date and rolling periods end on the `today` they were parsed against,
/// so nothing here reads the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Half(i32, u8),
    Quarter(i32, u8),
    Month(i32, u8),
    Week(i32, u8),
    Rolling(u32, NaiveDate),
    YearToDate(i32, NaiveDate),
    QuarterToDate(i32, u8, NaiveDate),
    MonthToDate(i32, u8, NaiveDate),
    WeekToDate(i32, u8, NaiveDate),
}

impl Period {
    /// Parse a period string relative to `today`.
    ///
    /// Supported formats:
    /// - `2025`: year
    /// - `2025-H1`: half
    /// - `2025-Q1`: quarter
    /// - `2025-01`: month
    /// - `2025-W05`: ISO week
    /// - `30d`: rolling last N days, ending today
    /// - `ytd`, `qtd`, `mtd`, `wtd`: current year/quarter/month/week to today
    pub fn parse(s: &str, today: NaiveDate) -> Result<Self> {
        let s = s.trim();

        match s.to_lowercase().as_str() {
            "ytd" => return Ok(Period::YearToDate(today.year(), today)),
            "qtd" => return Ok(Period::QuarterToDate(today.year(), quarter_of(today), today)),
            "mtd" => return Ok(Period::MonthToDate(today.year(), today.month() as u8, today)),
            "wtd" => {
                let iw = today.iso_week();
                return Ok(Period::WeekToDate(iw.year(), iw.week() as u8, today));
            }
            _ => {}
        }

        // Rolling: "30d", "7d", etc.
        if let Some(n) = s.strip_suffix(['d', 'D']) {
            if let Ok(n) = n.parse::<u32>() {
                if n == 0 {
                    return Err(Error::PeriodParse(format!("empty rolling period: {s}")));
                }
                return Ok(Period::Rolling(n, today));
            }
        }

        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Period::Year(year));
            }
        }

        if let Some(caps) = RE_HALF.captures(s) {
            return Ok(Period::Half(number(s, &caps[1])?, number(s, &caps[2])?));
        }

        if let Some(caps) = RE_QUARTER.captures(s) {
            return Ok(Period::Quarter(number(s, &caps[1])?, number(s, &caps[2])?));
        }

        if let Some(caps) = RE_WEEK.captures(s) {
            let year: i32 = number(s, &caps[1])?;
            let week: u8 = number(s, &caps[2])?;
            if NaiveDate::from_isoywd_opt(year, week as u32, Weekday::Mon).is_some() {
                return Ok(Period::Week(year, week));
            }
        }

        if let Some(caps) = RE_MONTH.captures(s) {
            let year: i32 = number(s, &caps[1])?;
            let month: u8 = number(s, &caps[2])?;
            if (1..=12).contains(&month) {
                return Ok(Period::Month(year, month));
            }
        }

        Err(Error::PeriodParse(format!("unrecognized period: {s}")))
    }

    /// Convert to a canonical key string.
    pub fn to_key(&self) -> String {
        match self {
            Period::Year(y) => format!("{y}"),
            Period::Half(y, h) => format!("{y}-H{h}"),
            Period::Quarter(y, q) => format!("{y}-Q{q}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Rolling(n, _) => format!("{n}d"),
            Period::YearToDate(y, _) => format!("{y}-ytd"),
            Period::QuarterToDate(y, q, _) => format!("{y}-Q{q}-td"),
            Period::MonthToDate(y, m, _) => format!("{y}-{m:02}-td"),
            Period::WeekToDate(y, w, _) => format!("{y}-W{w:02}-td"),
        }
    }

    /// Inclusive first and last calendar day of this period.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let range = match *self {
            Period::Year(y) => (ymd(y, 1, 1)?, ymd(y, 12, 31)?),
            Period::Half(y, 1) => (ymd(y, 1, 1)?, ymd(y, 6, 30)?),
            Period::Half(y, _) => (ymd(y, 7, 1)?, ymd(y, 12, 31)?),
            Period::Quarter(y, q) => {
                let start = ymd(y, quarter_start_month(q), 1)?;
                (start, last_day_of_month(y, start.month() + 2))
            }
            Period::Month(y, m) => (ymd(y, m as u32, 1)?, last_day_of_month(y, m as u32)),
            Period::Week(y, w) => {
                let start = iso_monday(y, w)?;
                (start, start + Duration::days(6))
            }
            Period::Rolling(n, as_of) => {
                let back = Days::new(u64::from(n).saturating_sub(1));
                let start = as_of.checked_sub_days(back).ok_or_else(|| {
                    Error::PeriodParse(format!("rolling period {n}d reaches before the calendar"))
                })?;
                (start, as_of)
            }
            Period::YearToDate(y, as_of) => (ymd(y, 1, 1)?, as_of),
            Period::QuarterToDate(y, q, as_of) => (ymd(y, quarter_start_month(q), 1)?, as_of),
            Period::MonthToDate(y, m, as_of) => (ymd(y, m as u32, 1)?, as_of),
            Period::WeekToDate(y, w, as_of) => (iso_monday(y, w)?, as_of),
        };
        Ok(range)
    }

    /// The analytics window: midnight UTC on the first day through the last
    /// nanosecond of the last day.
    pub fn window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let (start, end) = self.date_range()?;
        Ok((start_of_day(start), end_of_day(end)))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

fn number<T: std::str::FromStr>(input: &str, digits: &str) -> Result<T> {
    digits
        .parse()
        .map_err(|_| Error::PeriodParse(format!("invalid number in period: {input}")))
}

/// Zero for an out-of-range quarter, which `ymd` then rejects.
fn quarter_start_month(q: u8) -> u32 {
    match q {
        1..=4 => (q as u32 - 1) * 3 + 1,
        _ => 0,
    }
}

fn ymd(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| Error::PeriodParse(format!("invalid date {y}-{m:02}-{d:02}")))
}

fn iso_monday(y: i32, w: u8) -> Result<NaiveDate> {
    NaiveDate::from_isoywd_opt(y, w as u32, Weekday::Mon)
        .ok_or_else(|| Error::PeriodParse(format!("invalid ISO week {y}-W{w:02}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 14).unwrap()
    }

    fn parse(s: &str) -> Period {
        Period::parse(s, today()).unwrap()
    }

    #[test]
    fn test_parse_calendar_periods() {
        assert_eq!(parse("2025"), Period::Year(2025));
        assert_eq!(parse("2025-H2"), Period::Half(2025, 2));
        assert_eq!(parse("2025-Q1"), Period::Quarter(2025, 1));
        assert_eq!(parse("2025-12"), Period::Month(2025, 12));
        assert_eq!(parse("2025-W05"), Period::Week(2025, 5));
        assert_eq!(parse("2025-W1"), Period::Week(2025, 1));
    }

    #[test]
    fn test_parse_relative_periods() {
        assert_eq!(parse("30d"), Period::Rolling(30, today()));
        assert_eq!(parse(" 7D "), Period::Rolling(7, today()));
        assert_eq!(parse("YTD"), Period::YearToDate(2025, today()));
        assert_eq!(parse("qtd"), Period::QuarterToDate(2025, 3, today()));
        assert_eq!(parse("mtd"), Period::MonthToDate(2025, 8, today()));
        assert_eq!(parse("wtd"), Period::WeekToDate(2025, 33, today()));
    }

    #[test]
    fn test_parse_invalid() {
        for s in ["garbage", "2025-Q5", "2025-13", "0d", "2025-W54", "2021-W53", ""] {
            assert!(
                matches!(Period::parse(s, today()), Err(Error::PeriodParse(_))),
                "{s} should not parse"
            );
        }
    }

    #[test]
    fn test_to_key() {
        assert_eq!(Period::Year(2025).to_key(), "2025");
        assert_eq!(Period::Month(2025, 1).to_key(), "2025-01");
        assert_eq!(Period::Week(2025, 5).to_key(), "2025-W05");
        assert_eq!(parse("30d").to_string(), "30d");
    }

    #[test]
    fn test_date_range_quarter_and_month() {
        let (s, e) = Period::Quarter(2025, 2).date_range().unwrap();
        assert_eq!(s, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(e, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());

        let (s, e) = Period::Month(2024, 2).date_range().unwrap();
        assert_eq!(s, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(e, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_date_range_week() {
        let (s, e) = Period::Week(2025, 1).date_range().unwrap();
        assert_eq!(s.weekday(), Weekday::Mon);
        assert_eq!((e - s).num_days(), 6);
    }

    #[test]
    fn test_rolling_includes_today() {
        let (s, e) = parse("7d").date_range().unwrap();
        assert_eq!(s, NaiveDate::from_ymd_opt(2025, 8, 8).unwrap());
        assert_eq!(e, today());
    }

    #[test]
    fn test_oversized_rolling_period_is_an_error() {
        let period = parse("100000000d");
        assert!(matches!(period.date_range(), Err(Error::PeriodParse(_))));
        assert!(matches!(period.window(), Err(Error::PeriodParse(_))));

        let (s, _) = parse("36500d").date_range().unwrap();
        assert_eq!(s.year(), 1925);
    }

    #[test]
    fn test_window_covers_whole_days() {
        let (start, end) = Period::Month(2025, 6).window().unwrap();
        assert_eq!(start.to_rfc3339(), "2025-06-01T00:00:00+00:00");
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
        assert_eq!(end.timestamp_subsec_nanos(), 999_999_999);
    }
}

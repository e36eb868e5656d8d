use super::group::{count_by, group_by};
use super::percentage;
use super::types::{DailyTrend, MonthlyTrend, Trends, WeeklyTrend};
use crate::date_util::{month_start, week_start};
use crate::model::InsightRecord;

pub fn compute_trends(records: &[InsightRecord]) -> Trends {
    Trends {
        daily: daily_trend(records),
        weekly: weekly_trend(records),
        monthly: monthly_trend(records),
    }
}

/// Records per UTC calendar day of creation, with a running total.
pub fn daily_trend(records: &[InsightRecord]) -> Vec<DailyTrend> {
    let mut cumulative = 0u64;
    count_by(records, |r| Some(r.created_at.date_naive()))
        .into_iter()
        .map(|(date, count)| {
            cumulative += count;
            DailyTrend {
                date,
                count,
                cumulative_count: cumulative,
            }
        })
        .collect()
}

/// Records per Monday-anchored week, with the share completed.
pub fn weekly_trend(records: &[InsightRecord]) -> Vec<WeeklyTrend> {
    group_by(records, |r| Some(week_start(r.created_at.date_naive())))
        .into_iter()
        .map(|(week_start, bucket)| {
            let count = bucket.len() as u64;
            let completed = bucket.iter().filter(|r| r.is_completed()).count() as u64;
            WeeklyTrend {
                week_start,
                count,
                completion_rate: percentage(completed, count),
            }
        })
        .collect()
}

/// Records per calendar month, with the mean priority weight.
pub fn monthly_trend(records: &[InsightRecord]) -> Vec<MonthlyTrend> {
    group_by(records, |r| Some(month_start(r.created_at.date_naive())))
        .into_iter()
        .map(|(month_start, bucket)| {
            let count = bucket.len() as u64;
            let weight: u64 = bucket.iter().map(|r| r.priority.weight()).sum();
            MonthlyTrend {
                month_start,
                count,
                avg_priority_weight: weight as f64 / count as f64,
            }
        })
        .collect()
}

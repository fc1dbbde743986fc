//! View statistics attached to items during enrichment.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Raw statistics as returned by the remote stats query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub total: u64,
    /// Day key (ISO date) to view count.
    pub count_by_day: BTreeMap<String, u64>,
}

/// Derived view statistics stored on an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewStat {
    pub views: u64,
    pub last_7_days_views: u64,
    pub last_30_days_views: u64,
    pub views_by_day: BTreeMap<String, u64>,
}

impl ViewStat {
    /// Build rolling windows relative to `today`.
    ///
    /// A day counts toward an N-day window when it falls on or after
    /// `today - (N - 1)`. Keys that are not dates are skipped.
    pub fn from_snapshot(stat: StatSnapshot, today: NaiveDate) -> Self {
        let last_7_days_views = sum_within_days(&stat.count_by_day, today, 7);
        let last_30_days_views = sum_within_days(&stat.count_by_day, today, 30);

        Self { views: stat.total, last_7_days_views, last_30_days_views, views_by_day: stat.count_by_day }
    }
}

fn sum_within_days(count_by_day: &BTreeMap<String, u64>, today: NaiveDate, days: i64) -> u64 {
    let lower_bound = today - Duration::days(days - 1);

    count_by_day
        .iter()
        .filter_map(|(day, count)| parse_day(day).map(|d| (d, *count)))
        .filter(|(day, _)| *day >= lower_bound)
        .map(|(_, count)| count)
        .sum()
}

/// Parse a day key as either `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_day(day: &str) -> Option<NaiveDate> {
    let day = day.trim();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(day).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, u64)]) -> StatSnapshot {
        StatSnapshot {
            total: entries.iter().map(|(_, c)| c).sum::<u64>() + 100,
            count_by_day: entries.iter().map(|(d, c)| (d.to_string(), *c)).collect(),
        }
    }

    #[test]
    fn test_rolling_windows() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let stat = snapshot(&[
            ("2024-06-30", 1),
            ("2024-06-24", 2),  // day 7, inside the 7-day window
            ("2024-06-23", 4),  // day 8
            ("2024-06-01", 8),  // day 30
            ("2024-05-31", 16), // day 31
        ]);

        let view = ViewStat::from_snapshot(stat, today);
        assert_eq!(view.last_7_days_views, 3);
        assert_eq!(view.last_30_days_views, 15);
        assert_eq!(view.views, 131);
        assert_eq!(view.views_by_day.len(), 5);
    }

    #[test]
    fn test_unparsable_keys_are_skipped() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let stat = snapshot(&[("not-a-date", 50), ("2024-13-01", 50), ("2024-06-29", 5)]);

        let view = ViewStat::from_snapshot(stat, today);
        assert_eq!(view.last_7_days_views, 5);
        assert_eq!(view.last_30_days_views, 5);
        assert!(view.views_by_day.contains_key("not-a-date"));
    }

    #[test]
    fn test_parse_day_rfc3339() {
        assert_eq!(parse_day("2024-06-29T00:00:00.000Z"), NaiveDate::from_ymd_opt(2024, 6, 29));
        assert_eq!(parse_day("2024-06-29"), NaiveDate::from_ymd_opt(2024, 6, 29));
        assert_eq!(parse_day("yesterday"), None);
    }
}

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 默认查询窗口 (天)
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// 单次查询允许的最大跨度 (天)
pub const MAX_WINDOW_DAYS: i64 = 366;

/// 闭区间日期范围 [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidDateRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }

        let range = Self { start, end };
        if range.len_days() > MAX_WINDOW_DAYS {
            return Err(AppError::InvalidDateRange(format!(
                "range of {} days exceeds the {} day limit",
                range.len_days(),
                MAX_WINDOW_DAYS
            )));
        }

        Ok(range)
    }

    /// 以 `today` 结尾的最近 `days` 天
    pub fn last_days(today: NaiveDate, days: i64) -> Result<Self, AppError> {
        let start = today
            .checked_sub_signed(Duration::days(days.max(1) - 1))
            .ok_or_else(|| AppError::InvalidDateRange(format!("{} days before {} is out of range", days, today)))?;
        Ok(Self { start, end: today })
    }

    /// 从可选的查询参数解析, 缺省部分按最近 30 天补齐
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, AppError> {
        match (start, end) {
            (None, None) => Self::last_days(today, DEFAULT_WINDOW_DAYS),
            (Some(start), None) => Self::new(start, today.max(start)),
            (None, Some(end)) => Self::last_days(end, DEFAULT_WINDOW_DAYS),
            (Some(start), Some(end)) => Self::new(start, end),
        }
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.len_days()).map(move |offset| start + Duration::days(offset))
    }

    /// Shopify created_at_min (含)
    pub fn created_at_min(&self) -> String {
        format!("{}T00:00:00Z", self.start)
    }

    /// Shopify created_at_max (含)
    pub fn created_at_max(&self) -> String {
        format!("{}T23:59:59Z", self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_to_last_thirty_days() {
        let range = DateRange::resolve(None, None, date(2024, 3, 31)).unwrap();
        assert_eq!(range.start, date(2024, 3, 2));
        assert_eq!(range.end, date(2024, 3, 31));
        assert_eq!(range.len_days(), 30);
        assert_eq!(range.days().count(), 30);
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange(_)));
    }

    #[test]
    fn rejects_oversized_range() {
        assert!(DateRange::new(date(2022, 1, 1), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn extreme_end_date_is_rejected_not_panicking() {
        let err = DateRange::resolve(None, Some(NaiveDate::MIN), date(2024, 3, 31)).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange(_)));
        assert!(DateRange::last_days(NaiveDate::MIN, 7).is_err());
    }

    #[test]
    fn end_only_window_ends_on_end() {
        let range = DateRange::resolve(None, Some(date(2024, 3, 31)), date(2024, 6, 1)).unwrap();
        assert_eq!(range.start, date(2024, 3, 2));
        assert_eq!(range.len_days(), 30);
    }

    #[test]
    fn single_day_range_is_inclusive() {
        let range = DateRange::new(date(2024, 1, 5), date(2024, 1, 5)).unwrap();
        assert!(range.contains(date(2024, 1, 5)));
        assert!(!range.contains(date(2024, 1, 6)));
        assert_eq!(range.created_at_min(), "2024-01-05T00:00:00Z");
        assert_eq!(range.created_at_max(), "2024-01-05T23:59:59Z");
    }
}

//! 各广告平台的花费读取实现

pub mod google;
pub mod meta;

pub use google::GoogleAdsProvider;
pub use meta::MetaAdsProvider;

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{DailySpend, SpendReport};

/// 汇总 (日期, 花费) 条目: 所有条目计入总额, 有日期的按日合并
pub(crate) fn collect_report<I>(entries: I) -> SpendReport
where
    I: IntoIterator<Item = (Option<NaiveDate>, BigDecimal)>,
{
    let mut total = BigDecimal::zero();
    let mut daily: BTreeMap<NaiveDate, BigDecimal> = BTreeMap::new();

    for (date, spend) in entries {
        total += &spend;
        if let Some(date) = date {
            *daily.entry(date).or_insert_with(BigDecimal::zero) += spend;
        }
    }

    SpendReport {
        total,
        daily: daily
            .into_iter()
            .map(|(date, spend)| DailySpend { date, spend })
            .collect(),
    }
}

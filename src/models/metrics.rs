use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::AdPlatform;

/// 订单汇总指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_revenue: BigDecimal,
    #[serde(rename = "totalCOGS")]
    pub total_cogs: BigDecimal,
    pub gross_profit: BigDecimal,
    pub new_customer_revenue: BigDecimal,
    pub returning_customer_revenue: BigDecimal,
    pub order_count: u64,
    pub average_order_value: BigDecimal,
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self {
            total_revenue: BigDecimal::zero(),
            total_cogs: BigDecimal::zero(),
            gross_profit: BigDecimal::zero(),
            new_customer_revenue: BigDecimal::zero(),
            returning_customer_revenue: BigDecimal::zero(),
            order_count: 0,
            average_order_value: BigDecimal::zero(),
        }
    }
}

/// 单日广告花费
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub spend: BigDecimal,
}

/// 单次广告平台读取结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpendReport {
    pub total: BigDecimal,
    pub daily: Vec<DailySpend>,
}

/// 按平台汇总的广告花费
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpend {
    pub platform: AdPlatform,
    pub total: BigDecimal,
    pub daily: Vec<DailySpend>,
}

/// 广告花费汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSpendSummary {
    pub total_ad_spend: BigDecimal,
    pub breakdown: Vec<PlatformSpend>,
}

impl AdSpendSummary {
    /// 某日所有平台花费之和
    pub fn spend_on(&self, date: NaiveDate) -> BigDecimal {
        self.breakdown
            .iter()
            .flat_map(|p| p.daily.iter())
            .filter(|d| d.date == date)
            .fold(BigDecimal::zero(), |acc, d| acc + &d.spend)
    }
}

/// 图表数据点 (每日)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub revenue: BigDecimal,
    pub cogs: BigDecimal,
    pub ad_spend: BigDecimal,
    pub net_profit: BigDecimal,
}

/// 仪表盘完整结果: 订单指标 + 广告花费 + 净利润/利润率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: DashboardMetrics,
    pub ad_spend: AdSpendSummary,
    pub net_profit: BigDecimal,
    /// 净利润 / 收入, 百分比
    pub margin: BigDecimal,
    pub chart: Vec<ChartPoint>,
}

use bigdecimal::{BigDecimal, Zero};
use std::sync::Arc;
use std::time::Duration;

use crate::db::Repository;
use crate::error::{AppError, AppResult, SourceError};
use crate::models::{
    AdSpendSummary, ChartPoint, DashboardMetrics, DashboardSummary, DateRange, Order, StoreSettings,
};
use crate::service::ad_spend::AdSpendAggregator;
use crate::service::order_aggregator::{aggregate_orders_detailed, OrderAggregate};
use crate::service::shopify::OrderSource;

/// 仪表盘服务: 并发拉取订单与广告花费, 合成利润指标
pub struct DashboardService {
    repo: Arc<dyn Repository>,
    orders: Arc<dyn OrderSource>,
    ads: AdSpendAggregator,
    orders_timeout: Duration,
}

impl DashboardService {
    pub fn new(
        repo: Arc<dyn Repository>,
        orders: Arc<dyn OrderSource>,
        ads: AdSpendAggregator,
        orders_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            orders,
            ads,
            orders_timeout,
        }
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    /// 完整仪表盘: 订单指标 + 广告花费 + 净利润/利润率 + 每日图表
    pub async fn summary(&self, shop: &str, range: &DateRange) -> AppResult<DashboardSummary> {
        let access_token = self.access_token(shop).await?;
        let (settings, accounts) = tokio::try_join!(
            self.repo.load_settings(shop),
            self.repo.list_ad_accounts(shop)
        )?;

        // 订单与广告花费互不依赖, 并发执行
        let (orders, ad_spend) = tokio::join!(
            self.fetch_orders(shop, &access_token, range),
            self.ads.aggregate(&accounts, range)
        );

        let aggregate = aggregate_orders_detailed(&orders, settings.as_ref());
        let summary = compose(aggregate, ad_spend, range);

        tracing::info!(
            "Shop {}: 仪表盘 {} ~ {}, 订单 {}, 收入 {}, 广告 {}, 净利润 {}",
            shop,
            range.start,
            range.end,
            summary.metrics.order_count,
            summary.metrics.total_revenue,
            summary.ad_spend.total_ad_spend,
            summary.net_profit
        );
        Ok(summary)
    }

    /// 仅订单指标
    pub async fn order_metrics(&self, shop: &str, range: &DateRange) -> AppResult<DashboardMetrics> {
        let access_token = self.access_token(shop).await?;
        let settings: Option<StoreSettings> = self.repo.load_settings(shop).await?;
        let orders = self.fetch_orders(shop, &access_token, range).await;
        Ok(aggregate_orders_detailed(&orders, settings.as_ref()).metrics)
    }

    /// 仅广告花费
    pub async fn ad_spend(&self, shop: &str, range: &DateRange) -> AppResult<AdSpendSummary> {
        self.access_token(shop).await?;
        let accounts = self.repo.list_ad_accounts(shop).await?;
        Ok(self.ads.aggregate(&accounts, range).await)
    }

    async fn access_token(&self, shop: &str) -> AppResult<String> {
        self.repo
            .shop_access_token(shop)
            .await?
            .ok_or_else(|| AppError::ShopNotFound(shop.to_string()))
    }

    /// 拉取订单并按下单时间排序 (新老客户划分依赖该顺序, 无时间的排在最后)
    ///
    /// 拉取失败或超时按空订单处理, 仪表盘其余部分照常计算
    async fn fetch_orders(&self, shop: &str, access_token: &str, range: &DateRange) -> Vec<Order> {
        let result = tokio::time::timeout(
            self.orders_timeout,
            self.orders.fetch_orders(shop, access_token, range),
        )
        .await
        .unwrap_or(Err(SourceError::Timeout(self.orders_timeout)));

        match result {
            Ok(mut orders) => {
                orders.sort_by_key(|o| (o.created_at.is_none(), o.created_at));
                orders
            }
            Err(e) => {
                tracing::warn!(shop = %shop, error = %e, "订单拉取失败, 按 0 订单计算");
                Vec::new()
            }
        }
    }
}

/// 百分比, 收入为 0 时为 0
fn margin_percent(net_profit: &BigDecimal, revenue: &BigDecimal) -> BigDecimal {
    if revenue.is_zero() {
        return BigDecimal::zero();
    }
    (net_profit.clone() * BigDecimal::from(100) / revenue.clone()).round(2)
}

/// 合成仪表盘结果
///
/// 净利润 = 毛利润 - 广告花费; 利润率 = 净利润 / 收入 * 100
pub fn compose(aggregate: OrderAggregate, ad_spend: AdSpendSummary, range: &DateRange) -> DashboardSummary {
    let OrderAggregate { metrics, daily } = aggregate;

    let net_profit = &metrics.gross_profit - &ad_spend.total_ad_spend;
    let margin = margin_percent(&net_profit, &metrics.total_revenue);

    let chart = range
        .days()
        .map(|date| {
            let (revenue, cogs) = daily
                .get(&date)
                .map(|d| (d.revenue.clone(), d.cogs.clone()))
                .unwrap_or_else(|| (BigDecimal::zero(), BigDecimal::zero()));
            let spend = ad_spend.spend_on(date);
            let net_profit = &revenue - &cogs - &spend;
            ChartPoint {
                date,
                revenue,
                cogs,
                ad_spend: spend,
                net_profit,
            }
        })
        .collect();

    DashboardSummary {
        start_date: range.start,
        end_date: range.end,
        metrics,
        ad_spend,
        net_profit,
        margin,
        chart,
    }
}

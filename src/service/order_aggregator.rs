use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use crate::models::{DashboardMetrics, LineItem, Order, StoreSettings};

/// 解析十进制金额字符串, 缺失或非数字按 0 处理
pub fn parse_amount(raw: Option<&str>) -> BigDecimal {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| BigDecimal::from_str(s).ok())
        .unwrap_or_else(BigDecimal::zero)
}

/// 解析单位成本: 自定义 SKU 成本 > 单价 * 默认百分比 > 0
pub fn resolve_unit_cogs(item: &LineItem, settings: Option<&StoreSettings>) -> BigDecimal {
    let Some(settings) = settings else {
        return BigDecimal::zero();
    };

    if let Some(cost) = item.sku_key().and_then(|sku| settings.unit_cost_for(sku)) {
        return cost.clone();
    }

    if settings.default_cogs_percentage > BigDecimal::zero() {
        let price = parse_amount(item.price.as_deref());
        return price * &settings.default_cogs_percentage / BigDecimal::from(100);
    }

    BigDecimal::zero()
}

/// 单个订单的 COGS
pub fn order_cogs(order: &Order, settings: Option<&StoreSettings>) -> BigDecimal {
    order.line_items.iter().fold(BigDecimal::zero(), |acc, item| {
        acc + resolve_unit_cogs(item, settings) * BigDecimal::from(item.units())
    })
}

/// 已出现过的客户 (按遍历顺序首次出现即为新客户)
#[derive(Debug, Default)]
pub struct CustomerLedger {
    seen: HashSet<String>,
}

impl CustomerLedger {
    /// 首次出现返回 true
    pub fn first_seen(&mut self, customer: String) -> bool {
        self.seen.insert(customer)
    }

    pub fn distinct_customers(&self) -> usize {
        self.seen.len()
    }
}

/// 单日订单汇总 (图表用)
#[derive(Debug, Clone, PartialEq)]
pub struct DayTotals {
    pub revenue: BigDecimal,
    pub cogs: BigDecimal,
}

/// 订单聚合结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderAggregate {
    pub metrics: DashboardMetrics,
    pub daily: BTreeMap<NaiveDate, DayTotals>,
}

/// 折叠累加器
#[derive(Debug, Default)]
struct OrderTotals {
    aggregate: OrderAggregate,
    ledger: CustomerLedger,
}

impl OrderTotals {
    fn push(mut self, order: &Order, cogs: BigDecimal) -> Self {
        let revenue = parse_amount(order.total_price.as_deref());
        let metrics = &mut self.aggregate.metrics;

        metrics.order_count += 1;
        metrics.total_revenue += &revenue;
        metrics.total_cogs += &cogs;

        if let Some(customer) = order.customer_key() {
            if self.ledger.first_seen(customer) {
                metrics.new_customer_revenue += &revenue;
            } else {
                metrics.returning_customer_revenue += &revenue;
            }
        }

        if let Some(date) = order.order_date() {
            let day = self.aggregate.daily.entry(date).or_insert_with(|| DayTotals {
                revenue: BigDecimal::zero(),
                cogs: BigDecimal::zero(),
            });
            day.revenue += revenue;
            day.cogs += cogs;
        }

        self
    }

    fn finish(mut self) -> OrderAggregate {
        let metrics = &mut self.aggregate.metrics;
        metrics.gross_profit = &metrics.total_revenue - &metrics.total_cogs;
        metrics.average_order_value = if metrics.order_count > 0 {
            (metrics.total_revenue.clone() / BigDecimal::from(metrics.order_count)).round(2)
        } else {
            BigDecimal::zero()
        };

        tracing::debug!(
            "订单聚合完成: {} 个订单, {} 个客户",
            metrics.order_count,
            self.ledger.distinct_customers()
        );
        self.aggregate
    }
}

/// 聚合订单, 同时产出按日汇总
///
/// 各订单的 COGS 互不依赖, 并行计算; 新老客户划分依赖输入顺序, 顺序折叠
pub fn aggregate_orders_detailed(orders: &[Order], settings: Option<&StoreSettings>) -> OrderAggregate {
    let cogs: Vec<BigDecimal> = orders
        .par_iter()
        .map(|order| order_cogs(order, settings))
        .collect();

    orders
        .iter()
        .zip(cogs)
        .fold(OrderTotals::default(), |totals, (order, cogs)| totals.push(order, cogs))
        .finish()
}

/// 聚合订单为仪表盘指标
pub fn aggregate_orders(orders: &[Order], settings: Option<&StoreSettings>) -> DashboardMetrics {
    aggregate_orders_detailed(orders, settings).metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn item(sku: Option<&str>, quantity: i64, price: &str) -> LineItem {
        LineItem {
            sku: sku.map(str::to_string),
            quantity,
            price: Some(price.to_string()),
        }
    }

    fn order(id: u64, total: &str, email: Option<&str>, items: Vec<LineItem>) -> Order {
        Order {
            id,
            total_price: Some(total.to_string()),
            email: email.map(str::to_string),
            created_at: None,
            line_items: items,
        }
    }

    fn settings(pct: &str, custom: &[(&str, &str)]) -> StoreSettings {
        StoreSettings {
            default_cogs_percentage: dec(pct),
            custom_cogs: custom
                .iter()
                .map(|(sku, cost)| (sku.to_string(), dec(cost)))
                .collect(),
        }
    }

    #[test]
    fn gross_profit_is_revenue_minus_cogs() {
        let orders = vec![
            order(1, "100.00", Some("a@x.com"), vec![item(Some("A"), 2, "40.00")]),
            order(2, "59.99", None, vec![item(Some("B"), 1, "59.99")]),
            order(3, "abc", Some("b@x.com"), vec![item(None, 3, "10.00")]),
        ];
        let s = settings("25", &[("A", "12.50")]);

        let m = aggregate_orders(&orders, Some(&s));
        assert_eq!(m.total_revenue, dec("159.99"));
        // A: 2 * 12.50, B: 59.99 * 25%, 无 SKU: 3 * 10 * 25%
        assert_eq!(m.total_cogs, dec("25.00") + dec("14.9975") + dec("7.50"));
        assert_eq!(m.gross_profit, &m.total_revenue - &m.total_cogs);
        assert_eq!(m.order_count, 3);
    }

    #[test]
    fn custom_sku_cost_wins_over_percentage() {
        let s = settings("90", &[("MUG", "3.10")]);
        let cost = resolve_unit_cogs(&item(Some("MUG"), 1, "20.00"), Some(&s));
        assert_eq!(cost, dec("3.10"));
    }

    #[test]
    fn percentage_applies_to_unknown_sku() {
        let s = settings("40", &[("MUG", "3.10")]);
        let cost = resolve_unit_cogs(&item(Some("CAP"), 1, "20.00"), Some(&s));
        assert_eq!(cost, dec("8"));
    }

    #[test]
    fn no_settings_means_zero_cogs() {
        let orders = vec![order(1, "50", Some("a@x.com"), vec![item(Some("A"), 5, "10")])];
        let m = aggregate_orders(&orders, None);
        assert_eq!(m.total_cogs, BigDecimal::zero());
        assert_eq!(m.gross_profit, dec("50"));
    }

    #[test]
    fn zero_quantity_contributes_nothing() {
        let s = settings("50", &[("A", "99.00")]);
        let o = order(1, "0", None, vec![item(Some("A"), 0, "1000.00"), item(None, 0, "500")]);
        assert_eq!(order_cogs(&o, Some(&s)), BigDecimal::zero());
    }

    #[test]
    fn malformed_price_is_zero() {
        let s = settings("50", &[]);
        assert_eq!(resolve_unit_cogs(&item(None, 1, "N/A"), Some(&s)), BigDecimal::zero());
        assert_eq!(parse_amount(Some("NaN")), BigDecimal::zero());
        assert_eq!(parse_amount(None), BigDecimal::zero());
        assert_eq!(parse_amount(Some(" 12.5 ")), dec("12.5"));
    }

    #[test]
    fn classification_follows_arrival_order() {
        let a = order(1, "30.00", Some("repeat@x.com"), vec![]);
        let b = order(2, "70.00", Some("REPEAT@x.com"), vec![]);

        let forward = aggregate_orders(&[a.clone(), b.clone()], None);
        assert_eq!(forward.new_customer_revenue, dec("30.00"));
        assert_eq!(forward.returning_customer_revenue, dec("70.00"));

        let reversed = aggregate_orders(&[b, a], None);
        assert_eq!(reversed.new_customer_revenue, dec("70.00"));
        assert_eq!(reversed.returning_customer_revenue, dec("30.00"));
    }

    #[test]
    fn orders_without_email_are_in_neither_bucket() {
        let orders = vec![
            order(1, "10", Some("a@x.com"), vec![]),
            order(2, "15", None, vec![]),
        ];
        let m = aggregate_orders(&orders, None);
        assert_eq!(m.new_customer_revenue, dec("10"));
        assert_eq!(m.returning_customer_revenue, BigDecimal::zero());
        assert!(&m.new_customer_revenue + &m.returning_customer_revenue <= m.total_revenue);
    }

    #[test]
    fn average_order_value_without_orders_is_zero() {
        let m = aggregate_orders(&[], None);
        assert_eq!(m.order_count, 0);
        assert_eq!(m.average_order_value, BigDecimal::zero());
        assert_eq!(m, DashboardMetrics::default());
    }

    #[test]
    fn average_order_value_is_rounded_to_cents() {
        let orders = vec![
            order(1, "10", None, vec![]),
            order(2, "10", None, vec![]),
            order(3, "0", None, vec![]),
        ];
        let m = aggregate_orders(&orders, None);
        assert_eq!(m.average_order_value, dec("6.67"));
    }

    #[test]
    fn daily_totals_bucket_by_order_date() {
        let mut first = order(1, "20", None, vec![item(None, 1, "20")]);
        first.created_at = Some("2024-05-01T09:00:00+02:00".parse().unwrap());
        let mut second = order(2, "5", None, vec![]);
        second.created_at = Some("2024-05-01T23:30:00+02:00".parse().unwrap());
        let undated = order(3, "100", None, vec![]);

        let agg = aggregate_orders_detailed(&[first, second, undated], Some(&settings("10", &[])));
        let day = &agg.daily[&NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()];
        assert_eq!(day.revenue, dec("25"));
        assert_eq!(day.cogs, dec("2"));
        assert_eq!(agg.daily.len(), 1);
        assert_eq!(agg.metrics.total_revenue, dec("125"));
    }
}

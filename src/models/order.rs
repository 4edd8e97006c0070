use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 订单快照 (Shopify orders.json 中的单条记录)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub total_price: Option<String>,   // 十进制字符串
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// 订单明细行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<String>,         // 单价, 十进制字符串
}

impl Order {
    /// 客户标识: 去空白并转小写后的邮箱, 空邮箱视为无
    pub fn customer_key(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_ascii_lowercase)
    }

    /// 下单日期 (UTC, 与订单查询的 created_at 边界一致)
    pub fn order_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|ts| ts.with_timezone(&Utc).date_naive())
    }
}

impl LineItem {
    pub fn sku_key(&self) -> Option<&str> {
        self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// 负数数量按 0 处理
    pub fn units(&self) -> i64 {
        self.quantity.max(0)
    }
}

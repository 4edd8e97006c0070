//! Shopify Admin REST API 订单读取

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ShopifyConfig;
use crate::error::SourceError;
use crate::models::{DateRange, Order};
use crate::service::http::{build_client, check_status};

/// 只请求聚合需要的字段
const ORDER_FIELDS: &str = "id,total_price,email,created_at,line_items";

/// 翻页上限 (250 * 400 = 10 万订单)
const MAX_PAGES: usize = 400;

/// 订单数据源
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// 拉取店铺在日期范围内的订单, 按创建时间升序
    async fn fetch_orders(&self, shop: &str, access_token: &str, range: &DateRange) -> Result<Vec<Order>, SourceError>;
}

/// Shopify Admin API 客户端
pub struct ShopifyClient {
    client: reqwest::Client,
    api_version: String,
    order_status: String,
    page_limit: u32,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrdersPage {
    #[serde(default)]
    orders: Vec<Order>,
}

impl ShopifyClient {
    pub fn from_config(config: &ShopifyConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(config.timeout())?,
            api_version: config.api_version.clone(),
            order_status: config.order_status.clone(),
            page_limit: config.page_limit.clamp(1, 250),
            base_url: config.base_url.as_ref().map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    fn orders_url(&self, shop: &str) -> String {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => format!("https://{}", shop),
        };
        format!("{}/admin/api/{}/orders.json", base, self.api_version)
    }
}

/// 从 Link 头中取 rel="next" 的 URL
pub(crate) fn next_page_url(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let url = pieces.next()?.trim();
        let is_next = pieces.any(|p| p.trim().eq_ignore_ascii_case("rel=\"next\""));
        if is_next {
            Some(url.trim_start_matches('<').trim_end_matches('>').to_string())
        } else {
            None
        }
    })
}

#[async_trait]
impl OrderSource for ShopifyClient {
    async fn fetch_orders(&self, shop: &str, access_token: &str, range: &DateRange) -> Result<Vec<Order>, SourceError> {
        let limit = self.page_limit.to_string();
        let created_at_min = range.created_at_min();
        let created_at_max = range.created_at_max();

        let mut request = self
            .client
            .get(self.orders_url(shop))
            .header("X-Shopify-Access-Token", access_token)
            .query(&[
                ("status", self.order_status.as_str()),
                ("created_at_min", created_at_min.as_str()),
                ("created_at_max", created_at_max.as_str()),
                ("limit", limit.as_str()),
                ("fields", ORDER_FIELDS),
                ("order", "created_at asc"),
            ]);

        let mut orders = Vec::new();
        for page_no in 1..=MAX_PAGES {
            let response = check_status(request.send().await?, "shopify").await?;
            let next = response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);

            let page: OrdersPage = response.json().await?;
            tracing::debug!("Shop {}: 第 {} 页, {} 个订单", shop, page_no, page.orders.len());
            orders.extend(page.orders);

            match next {
                Some(url) if page_no < MAX_PAGES => {
                    request = self.client.get(url).header("X-Shopify-Access-Token", access_token);
                }
                Some(_) => {
                    tracing::warn!("Shop {}: 订单超过 {} 页, 截断", shop, MAX_PAGES);
                    break;
                }
                None => break,
            }
        }

        tracing::info!("Shop {}: 拉取订单 {} 个 ({} ~ {})", shop, orders.len(), range.start, range.end);
        Ok(orders)
    }
}

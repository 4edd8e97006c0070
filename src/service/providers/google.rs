//! Google Ads API
//!
//! 通过 `googleAds:searchStream` 执行 GAQL 查询, 按日读取 `metrics.cost_micros`

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;

use super::collect_report;
use crate::config::AdsConfig;
use crate::error::SourceError;
use crate::models::{AdAccount, AdPlatform, DateRange, SpendReport};
use crate::service::ad_spend::AdSpendProvider;
use crate::service::http::{build_client, check_status};

pub struct GoogleAdsProvider {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    developer_token: Option<String>,
    login_customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchStreamBatch {
    #[serde(default)]
    results: Vec<GoogleAdsRow>,
}

#[derive(Debug, Deserialize)]
struct GoogleAdsRow {
    #[serde(default)]
    segments: Option<Segments>,
    #[serde(default)]
    metrics: Option<Metrics>,
}

#[derive(Debug, Deserialize)]
struct Segments {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metrics {
    #[serde(default)]
    cost_micros: Option<Micros>,
}

/// int64 在 JSON 中通常编码为字符串
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Micros {
    Text(String),
    Number(i64),
}

impl Micros {
    /// 微单位转金额 (除以 1_000_000, 精确)
    fn to_amount(&self) -> BigDecimal {
        let raw = match self {
            Micros::Text(s) => s.trim().to_string(),
            Micros::Number(n) => n.to_string(),
        };
        BigDecimal::from_str(&format!("{}e-6", raw)).unwrap_or_else(|_| BigDecimal::zero())
    }
}

/// 客户 ID 去掉分隔符: 123-456-7890 -> 1234567890
fn normalize_customer_id(id: &str) -> String {
    id.chars().filter(char::is_ascii_digit).collect()
}

fn spend_query(range: &DateRange) -> String {
    format!(
        "SELECT segments.date, metrics.cost_micros FROM customer WHERE segments.date BETWEEN '{}' AND '{}'",
        range.start, range.end
    )
}

fn report_from_batches(batches: &[SearchStreamBatch]) -> SpendReport {
    collect_report(batches.iter().flat_map(|b| b.results.iter()).map(|row| {
        let date = row
            .segments
            .as_ref()
            .and_then(|s| s.date.as_deref())
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let spend = row
            .metrics
            .as_ref()
            .and_then(|m| m.cost_micros.as_ref())
            .map(Micros::to_amount)
            .unwrap_or_else(BigDecimal::zero);
        (date, spend)
    }))
}

impl GoogleAdsProvider {
    pub fn from_config(config: &AdsConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(config.timeout())?,
            base_url: config.google_base_url.trim_end_matches('/').to_string(),
            api_version: config.google_api_version.clone(),
            developer_token: config.google_developer_token.clone(),
            login_customer_id: config.google_login_customer_id.clone(),
        })
    }

    fn search_stream_url(&self, account_id: &str) -> String {
        format!(
            "{}/{}/customers/{}/googleAds:searchStream",
            self.base_url,
            self.api_version,
            normalize_customer_id(account_id)
        )
    }
}

#[async_trait]
impl AdSpendProvider for GoogleAdsProvider {
    fn platform(&self) -> AdPlatform {
        AdPlatform::Google
    }

    async fn fetch_spend(&self, account: &AdAccount, range: &DateRange) -> Result<SpendReport, SourceError> {
        let developer_token = self
            .developer_token
            .as_deref()
            .ok_or(SourceError::MissingConfig("ads.google_developer_token"))?;

        let mut request = self
            .client
            .post(self.search_stream_url(&account.account_id))
            .bearer_auth(&account.access_token)
            .header("developer-token", developer_token)
            .json(&serde_json::json!({ "query": spend_query(range) }));

        if let Some(login) = &self.login_customer_id {
            request = request.header("login-customer-id", normalize_customer_id(login));
        }

        let response = check_status(request.send().await?, "google").await?;
        let batches: Vec<SearchStreamBatch> = response.json().await?;

        Ok(report_from_batches(&batches))
    }
}

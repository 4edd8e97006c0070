//! Meta (Facebook) Marketing API
//!
//! 读取 `act_{id}/insights` 的账户级日花费, 按 `paging.next` 翻页

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::collect_report;
use crate::config::AdsConfig;
use crate::error::SourceError;
use crate::models::{AdAccount, AdPlatform, DateRange, SpendReport};
use crate::service::ad_spend::AdSpendProvider;
use crate::service::http::{build_client, check_status};
use crate::service::order_aggregator::parse_amount;

/// 翻页上限, 防止异常 paging 导致死循环
const MAX_PAGES: usize = 50;

pub struct MetaAdsProvider {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

#[derive(Debug, Deserialize)]
struct InsightsPage {
    #[serde(default)]
    data: Vec<InsightRow>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct InsightRow {
    #[serde(default)]
    spend: Option<String>,
    #[serde(default)]
    date_start: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

impl MetaAdsProvider {
    pub fn from_config(config: &AdsConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(config.timeout())?,
            base_url: config.meta_base_url.trim_end_matches('/').to_string(),
            api_version: config.meta_api_version.clone(),
        })
    }

    fn insights_url(&self, account_id: &str) -> String {
        let id = account_id.trim().trim_start_matches("act_");
        format!("{}/{}/act_{}/insights", self.base_url, self.api_version, id)
    }
}

fn report_from_rows(rows: &[InsightRow]) -> SpendReport {
    collect_report(rows.iter().map(|row| {
        let date = row
            .date_start
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        (date, parse_amount(row.spend.as_deref()))
    }))
}

#[async_trait]
impl AdSpendProvider for MetaAdsProvider {
    fn platform(&self) -> AdPlatform {
        AdPlatform::Meta
    }

    async fn fetch_spend(&self, account: &AdAccount, range: &DateRange) -> Result<SpendReport, SourceError> {
        let time_range = serde_json::json!({
            "since": range.start.to_string(),
            "until": range.end.to_string(),
        })
        .to_string();

        let mut request = self
            .client
            .get(self.insights_url(&account.account_id))
            .bearer_auth(&account.access_token)
            .query(&[
                ("fields", "spend"),
                ("level", "account"),
                ("time_increment", "1"),
                ("time_range", time_range.as_str()),
            ]);

        let mut rows = Vec::new();
        for page_no in 1..=MAX_PAGES {
            let response = check_status(request.send().await?, "meta").await?;
            let page: InsightsPage = response.json().await?;
            rows.extend(page.data);

            match page.paging.and_then(|p| p.next) {
                Some(next) if page_no < MAX_PAGES => {
                    request = self.client.get(next).bearer_auth(&account.access_token);
                }
                Some(_) => {
                    tracing::warn!(account = %account.account_id, "meta insights exceeded {} pages, truncating", MAX_PAGES);
                    break;
                }
                None => break,
            }
        }

        Ok(report_from_rows(&rows))
    }
}

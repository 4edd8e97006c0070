use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AdsConfig;
use crate::error::SourceError;
use crate::models::{AdAccount, AdPlatform, AdSpendSummary, DailySpend, DateRange, PlatformSpend, SpendReport};
use crate::service::providers::{GoogleAdsProvider, MetaAdsProvider};

/// 广告平台花费读取接口
///
/// 每个平台一个实现, 由 [`AdSpendAggregator`] 按账户所属平台分派
#[async_trait]
pub trait AdSpendProvider: Send + Sync {
    fn platform(&self) -> AdPlatform;

    /// 读取单个账户在日期范围内的花费
    async fn fetch_spend(&self, account: &AdAccount, range: &DateRange) -> Result<SpendReport, SourceError>;
}

/// 广告花费聚合
///
/// 平台之间并发, 同一平台内的账户顺序读取; 单次调用失败或超时按 0 计入, 不影响其他调用
pub struct AdSpendAggregator {
    providers: HashMap<AdPlatform, Arc<dyn AdSpendProvider>>,
    call_timeout: Duration,
}

impl AdSpendAggregator {
    pub fn new(call_timeout: Duration) -> Self {
        Self {
            providers: HashMap::new(),
            call_timeout,
        }
    }

    /// 注册平台实现, 同一平台后注册的覆盖先注册的
    pub fn with_provider(mut self, provider: Arc<dyn AdSpendProvider>) -> Self {
        self.providers.insert(provider.platform(), provider);
        self
    }

    /// 按配置注册 Meta 和 Google 实现
    pub fn from_config(config: &AdsConfig) -> Result<Self, SourceError> {
        let meta = MetaAdsProvider::from_config(config)?;
        let google = GoogleAdsProvider::from_config(config)?;

        Ok(Self::new(config.timeout())
            .with_provider(Arc::new(meta))
            .with_provider(Arc::new(google)))
    }

    pub fn platforms(&self) -> Vec<AdPlatform> {
        let mut platforms: Vec<_> = self.providers.keys().copied().collect();
        platforms.sort();
        platforms
    }

    /// 汇总所有账户的广告花费
    pub async fn aggregate(&self, accounts: &[AdAccount], range: &DateRange) -> AdSpendSummary {
        // 1. 按平台分组 (BTreeMap 保证 breakdown 顺序稳定)
        let mut by_platform: BTreeMap<AdPlatform, Vec<&AdAccount>> = BTreeMap::new();
        for account in accounts {
            by_platform.entry(account.platform).or_default().push(account);
        }

        // 2. 平台间并发
        let breakdown: Vec<PlatformSpend> = join_all(
            by_platform
                .into_iter()
                .map(|(platform, accounts)| self.aggregate_platform(platform, accounts, range)),
        )
        .await;

        // 3. 汇总
        let total_ad_spend = breakdown
            .iter()
            .fold(BigDecimal::zero(), |acc, p| acc + &p.total);

        tracing::info!(
            "广告花费汇总完成: {} 个账户, {} 个平台, 总花费 {}",
            accounts.len(),
            breakdown.len(),
            total_ad_spend
        );

        AdSpendSummary {
            total_ad_spend,
            breakdown,
        }
    }

    async fn aggregate_platform(
        &self,
        platform: AdPlatform,
        accounts: Vec<&AdAccount>,
        range: &DateRange,
    ) -> PlatformSpend {
        let mut total = BigDecimal::zero();
        let mut daily: BTreeMap<NaiveDate, BigDecimal> = BTreeMap::new();

        for account in accounts {
            let report = self.fetch_one(account, range).await;
            total += report.total;
            for day in report.daily {
                *daily.entry(day.date).or_insert_with(BigDecimal::zero) += day.spend;
            }
        }

        PlatformSpend {
            platform,
            total,
            daily: daily
                .into_iter()
                .map(|(date, spend)| DailySpend { date, spend })
                .collect(),
        }
    }

    /// 单次外部调用, 任何失败都降级为零值
    async fn fetch_one(&self, account: &AdAccount, range: &DateRange) -> SpendReport {
        let Some(provider) = self.providers.get(&account.platform) else {
            tracing::warn!(
                platform = %account.platform,
                account = %account.account_id,
                "{}",
                SourceError::NoProvider(account.platform)
            );
            return SpendReport::default();
        };

        match tokio::time::timeout(self.call_timeout, provider.fetch_spend(account, range)).await {
            Ok(Ok(report)) => {
                tracing::debug!(
                    platform = %account.platform,
                    account = %account.account_id,
                    total = %report.total,
                    "ad spend fetched"
                );
                report
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    platform = %account.platform,
                    account = %account.account_id,
                    error = %e,
                    "ad spend fetch failed, counting as zero"
                );
                SpendReport::default()
            }
            Err(_) => {
                tracing::warn!(
                    platform = %account.platform,
                    account = %account.account_id,
                    error = %SourceError::Timeout(self.call_timeout),
                    "ad spend fetch timed out, counting as zero"
                );
                SpendReport::default()
            }
        }
    }
}

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use dashmap::DashMap;
use indexmap::IndexMap;

use super::repository::Repository;
use crate::error::AppResult;
use crate::models::{AdAccount, StoreSettings};

#[derive(Debug, Default, Clone)]
struct ShopRecord {
    access_token: Option<String>,
    settings: Option<StoreSettings>,
    ad_accounts: Vec<AdAccount>,
}

/// 内存仓储 (测试及无数据库的本地运行)
#[derive(Debug, Default)]
pub struct MemoryRepository {
    shops: DashMap<String, ShopRecord>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记已安装店铺
    pub fn install_shop(&self, shop: &str, access_token: &str) {
        self.shops.entry(shop.to_string()).or_default().access_token = Some(access_token.to_string());
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn shop_access_token(&self, shop: &str) -> AppResult<Option<String>> {
        Ok(self.shops.get(shop).and_then(|r| r.access_token.clone()))
    }

    async fn load_settings(&self, shop: &str) -> AppResult<Option<StoreSettings>> {
        Ok(self.shops.get(shop).and_then(|r| r.settings.clone()))
    }

    async fn save_settings(&self, shop: &str, settings: &StoreSettings) -> AppResult<()> {
        self.shops.entry(shop.to_string()).or_default().settings = Some(settings.clone());
        Ok(())
    }

    async fn merge_custom_cogs(
        &self,
        shop: &str,
        entries: &IndexMap<String, BigDecimal>,
    ) -> AppResult<StoreSettings> {
        let mut record = self.shops.entry(shop.to_string()).or_default();
        let settings = record.settings.get_or_insert_with(StoreSettings::default);
        for (sku, cost) in entries {
            settings.custom_cogs.insert(sku.clone(), cost.clone());
        }
        Ok(settings.clone())
    }

    async fn list_ad_accounts(&self, shop: &str) -> AppResult<Vec<AdAccount>> {
        Ok(self
            .shops
            .get(shop)
            .map(|r| r.ad_accounts.clone())
            .unwrap_or_default())
    }

    async fn link_ad_account(&self, shop: &str, account: &AdAccount) -> AppResult<()> {
        let mut record = self.shops.entry(shop.to_string()).or_default();
        let existing = record
            .ad_accounts
            .iter()
            .position(|a| a.platform == account.platform && a.account_id == account.account_id);
        match existing {
            Some(idx) => record.ad_accounts[idx].access_token = account.access_token.clone(),
            None => record.ad_accounts.push(account.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdPlatform;
    use std::str::FromStr;

    #[tokio::test]
    async fn merge_keeps_existing_settings() {
        let repo = MemoryRepository::new();
        let mut settings = StoreSettings {
            default_cogs_percentage: BigDecimal::from(30),
            ..Default::default()
        };
        settings.custom_cogs.insert("A".to_string(), BigDecimal::from(1));
        repo.save_settings("demo.myshopify.com", &settings).await.unwrap();

        let mut entries = IndexMap::new();
        entries.insert("A".to_string(), BigDecimal::from_str("2.5").unwrap());
        entries.insert("B".to_string(), BigDecimal::from(4));
        let merged = repo.merge_custom_cogs("demo.myshopify.com", &entries).await.unwrap();

        assert_eq!(merged.default_cogs_percentage, BigDecimal::from(30));
        assert_eq!(merged.custom_cogs.len(), 2);
        assert_eq!(merged.custom_cogs["A"], BigDecimal::from_str("2.5").unwrap());
        assert_eq!(repo.load_settings("demo.myshopify.com").await.unwrap(), Some(merged));
    }

    #[tokio::test]
    async fn relinking_an_account_replaces_its_token() {
        let repo = MemoryRepository::new();
        let mut account = AdAccount {
            platform: AdPlatform::Meta,
            account_id: "act_1".to_string(),
            access_token: "old".to_string(),
        };
        repo.link_ad_account("s", &account).await.unwrap();
        account.access_token = "new".to_string();
        repo.link_ad_account("s", &account).await.unwrap();

        let accounts = repo.list_ad_accounts("s").await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].access_token, "new");
    }

    #[tokio::test]
    async fn unknown_shop_has_nothing() {
        let repo = MemoryRepository::new();
        assert!(repo.shop_access_token("nope").await.unwrap().is_none());
        assert!(repo.load_settings("nope").await.unwrap().is_none());
        assert!(repo.list_ad_accounts("nope").await.unwrap().is_empty());

        repo.install_shop("yes", "shpat_123");
        assert_eq!(repo.shop_access_token("yes").await.unwrap().as_deref(), Some("shpat_123"));
    }
}

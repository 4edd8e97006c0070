use async_trait::async_trait;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use sqlx::PgPool;

use super::queries;
use super::repository::Repository;
use crate::error::AppResult;
use crate::models::{AdAccount, StoreSettings};

/// Postgres 仓储
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn shop_access_token(&self, shop: &str) -> AppResult<Option<String>> {
        Ok(queries::get_shop_token(&self.pool, shop).await?)
    }

    async fn load_settings(&self, shop: &str) -> AppResult<Option<StoreSettings>> {
        let Some(row) = queries::get_settings_row(&self.pool, shop).await? else {
            return Ok(None);
        };
        let cogs = queries::list_custom_cogs(&self.pool, shop).await?;
        Ok(Some(queries::settings_from_rows(row, cogs)))
    }

    async fn save_settings(&self, shop: &str, settings: &StoreSettings) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        queries::upsert_settings_row(&mut tx, shop, &settings.default_cogs_percentage).await?;
        let removed = queries::delete_custom_cogs(&mut tx, shop).await?;
        queries::upsert_custom_cogs(&mut tx, shop, settings.custom_cogs.iter()).await?;

        tx.commit().await?;
        tracing::info!(
            "Shop {}: 设置已保存, 自定义 COGS {} 条 (替换 {} 条)",
            shop,
            settings.custom_cogs.len(),
            removed
        );
        Ok(())
    }

    async fn merge_custom_cogs(
        &self,
        shop: &str,
        entries: &IndexMap<String, BigDecimal>,
    ) -> AppResult<StoreSettings> {
        let mut tx = self.pool.begin().await?;

        queries::ensure_settings_row(&mut tx, shop).await?;
        queries::upsert_custom_cogs(&mut tx, shop, entries.iter()).await?;

        tx.commit().await?;

        let row = queries::get_settings_row(&self.pool, shop).await?;
        let cogs = queries::list_custom_cogs(&self.pool, shop).await?;
        Ok(row
            .map(|row| queries::settings_from_rows(row, cogs))
            .unwrap_or_default())
    }

    async fn list_ad_accounts(&self, shop: &str) -> AppResult<Vec<AdAccount>> {
        let rows = queries::list_ad_accounts(&self.pool, shop).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row.platform.parse() {
                Ok(platform) => Some(AdAccount {
                    platform,
                    account_id: row.account_id,
                    access_token: row.access_token,
                }),
                Err(e) => {
                    tracing::warn!("Shop {}: 跳过广告账户 {}: {}", shop, row.account_id, e);
                    None
                }
            })
            .collect())
    }

    async fn link_ad_account(&self, shop: &str, account: &AdAccount) -> AppResult<()> {
        queries::upsert_ad_account(&self.pool, shop, account).await?;
        tracing::info!(
            "Shop {}: 已关联 {} 广告账户 {}",
            shop,
            account.platform,
            account.account_id
        );
        Ok(())
    }
}

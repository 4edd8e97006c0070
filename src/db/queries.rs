use bigdecimal::BigDecimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

use crate::models::{AdAccount, StoreSettings};

/// store_settings 行
#[derive(Debug, Clone, FromRow)]
pub struct SettingsRow {
    pub default_cogs_percentage: BigDecimal,
}

/// custom_cogs 行
#[derive(Debug, Clone, FromRow)]
pub struct CustomCogsRow {
    pub sku: String,
    pub unit_cost: BigDecimal,
}

/// ad_accounts 行
#[derive(Debug, Clone, FromRow)]
pub struct AdAccountRow {
    pub platform: String,
    pub account_id: String,
    pub access_token: String,
}

/// 查询店铺访问令牌
pub async fn get_shop_token(pool: &PgPool, shop: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT access_token
        FROM shops
        WHERE shop = $1
        "#
    )
    .bind(shop)
    .fetch_optional(pool)
    .await
}

/// 查询店铺设置主行
pub async fn get_settings_row(pool: &PgPool, shop: &str) -> Result<Option<SettingsRow>, sqlx::Error> {
    sqlx::query_as::<_, SettingsRow>(
        r#"
        SELECT default_cogs_percentage
        FROM store_settings
        WHERE shop = $1
        "#
    )
    .bind(shop)
    .fetch_optional(pool)
    .await
}

/// 查询店铺全部自定义 COGS
pub async fn list_custom_cogs(pool: &PgPool, shop: &str) -> Result<Vec<CustomCogsRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomCogsRow>(
        r#"
        SELECT sku, unit_cost
        FROM custom_cogs
        WHERE shop = $1
        ORDER BY sku
        "#
    )
    .bind(shop)
    .fetch_all(pool)
    .await
}

/// 写入设置主行 (不存在则创建)
pub async fn upsert_settings_row(
    tx: &mut Transaction<'_, Postgres>,
    shop: &str,
    default_cogs_percentage: &BigDecimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO store_settings (shop, default_cogs_percentage, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (shop) DO UPDATE
        SET default_cogs_percentage = EXCLUDED.default_cogs_percentage,
            updated_at = now()
        "#
    )
    .bind(shop)
    .bind(default_cogs_percentage)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// 确保设置主行存在, 已存在时不改动百分比
pub async fn ensure_settings_row(tx: &mut Transaction<'_, Postgres>, shop: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO store_settings (shop)
        VALUES ($1)
        ON CONFLICT (shop) DO NOTHING
        "#
    )
    .bind(shop)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// 删除店铺全部自定义 COGS
pub async fn delete_custom_cogs(tx: &mut Transaction<'_, Postgres>, shop: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM custom_cogs WHERE shop = $1")
        .bind(shop)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// 批量写入自定义 COGS (每 1000 条分块, 已存在的 SKU 覆盖)
pub async fn upsert_custom_cogs<'a, I>(
    tx: &mut Transaction<'_, Postgres>,
    shop: &str,
    entries: I,
) -> Result<(), sqlx::Error>
where
    I: IntoIterator<Item = (&'a String, &'a BigDecimal)>,
{
    let entries: Vec<_> = entries.into_iter().collect();
    if entries.is_empty() {
        return Ok(());
    }

    tracing::debug!("写入自定义 COGS, {} 条记录", entries.len());
    let start_time = std::time::Instant::now();

    for chunk in entries.chunks(1000) {
        let mut query_builder = QueryBuilder::<Postgres>::new("INSERT INTO custom_cogs (shop, sku, unit_cost) ");
        query_builder.push_values(chunk, |mut b, (sku, cost)| {
            b.push_bind(shop).push_bind(sku.as_str()).push_bind((*cost).clone());
        });
        query_builder.push(" ON CONFLICT (shop, sku) DO UPDATE SET unit_cost = EXCLUDED.unit_cost");
        query_builder.build().execute(&mut **tx).await?;
    }

    tracing::debug!("自定义 COGS 写入完成, 耗时: {:?}", start_time.elapsed());
    Ok(())
}

/// 查询店铺已关联的广告账户
pub async fn list_ad_accounts(pool: &PgPool, shop: &str) -> Result<Vec<AdAccountRow>, sqlx::Error> {
    sqlx::query_as::<_, AdAccountRow>(
        r#"
        SELECT platform, account_id, access_token
        FROM ad_accounts
        WHERE shop = $1
        ORDER BY platform, linked_at
        "#
    )
    .bind(shop)
    .fetch_all(pool)
    .await
}

/// 关联广告账户 (已存在则更新令牌)
pub async fn upsert_ad_account(pool: &PgPool, shop: &str, account: &AdAccount) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ad_accounts (shop, platform, account_id, access_token)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (shop, platform, account_id) DO UPDATE
        SET access_token = EXCLUDED.access_token
        "#
    )
    .bind(shop)
    .bind(account.platform.as_str())
    .bind(&account.account_id)
    .bind(&account.access_token)
    .execute(pool)
    .await?;
    Ok(())
}

/// 由主行和 COGS 行组装设置
pub fn settings_from_rows(row: SettingsRow, cogs: Vec<CustomCogsRow>) -> StoreSettings {
    StoreSettings {
        default_cogs_percentage: row.default_cogs_percentage,
        custom_cogs: cogs.into_iter().map(|c| (c.sku, c.unit_cost)).collect(),
    }
}

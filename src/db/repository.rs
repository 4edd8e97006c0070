use async_trait::async_trait;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;

use crate::error::AppResult;
use crate::models::{AdAccount, StoreSettings};

/// 店铺数据仓储: 访问令牌、COGS 设置、广告账户
#[async_trait]
pub trait Repository: Send + Sync {
    /// 已安装店铺的 Shopify 访问令牌, 未安装返回 None
    async fn shop_access_token(&self, shop: &str) -> AppResult<Option<String>>;

    /// 店铺设置, 从未保存过返回 None
    async fn load_settings(&self, shop: &str) -> AppResult<Option<StoreSettings>>;

    /// 整体覆盖保存设置 (自定义 COGS 以传入为准)
    async fn save_settings(&self, shop: &str, settings: &StoreSettings) -> AppResult<()>;

    /// 合并自定义 COGS (CSV 导入), 返回合并后的设置
    async fn merge_custom_cogs(
        &self,
        shop: &str,
        entries: &IndexMap<String, BigDecimal>,
    ) -> AppResult<StoreSettings>;

    async fn list_ad_accounts(&self, shop: &str) -> AppResult<Vec<AdAccount>>;

    /// 关联广告账户, 同平台同账户重复关联时更新令牌
    async fn link_ad_account(&self, shop: &str, account: &AdAccount) -> AppResult<()>;
}

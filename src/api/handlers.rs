use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{AdAccount, AdSpendSummary, DashboardMetrics, DashboardSummary, DateRange, StoreSettings};
use crate::service::{parse_cogs_csv, CogsImportReport};
use axum::{
    body::Bytes,
    extract::{Json, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 店铺参数
#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub shop: String,
}

/// 店铺 + 日期范围参数 (闭区间, 缺省为最近 30 天)
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub shop: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeQuery {
    fn range(&self) -> AppResult<DateRange> {
        DateRange::resolve(self.start, self.end, Utc::now().date_naive())
    }
}

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 完整仪表盘
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<DashboardSummary>> {
    let range = query.range()?;
    let summary = state.dashboard.summary(&query.shop, &range).await?;
    Ok(Json(summary))
}

/// 订单指标
pub async fn get_order_metrics(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<DashboardMetrics>> {
    let range = query.range()?;
    let metrics = state.dashboard.order_metrics(&query.shop, &range).await?;
    Ok(Json(metrics))
}

/// 广告花费
pub async fn get_ad_spend(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<AdSpendSummary>> {
    let range = query.range()?;
    let summary = state.dashboard.ad_spend(&query.shop, &range).await?;
    Ok(Json(summary))
}

/// 查询设置, 从未保存过返回默认值
pub async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> AppResult<Json<StoreSettings>> {
    state.require_shop(&query.shop).await?;
    let settings = state
        .dashboard
        .repository()
        .load_settings(&query.shop)
        .await?
        .unwrap_or_default();
    Ok(Json(settings))
}

/// 保存设置
pub async fn save_settings(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    Json(settings): Json<StoreSettings>,
) -> AppResult<Json<ApiResponse>> {
    state.require_shop(&query.shop).await?;

    let settings = settings.normalized()?;
    settings.validate()?;

    state
        .dashboard
        .repository()
        .save_settings(&query.shop, &settings)
        .await?;

    Ok(Json(ApiResponse::ok(format!(
        "Saved settings with {} custom COGS entries",
        settings.custom_cogs.len()
    ))))
}

/// 上传 COGS CSV (请求体即文件内容), 合并进现有设置
pub async fn upload_cogs_csv(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    body: Bytes,
) -> AppResult<Json<CogsImportReport>> {
    state.require_shop(&query.shop).await?;

    let import = parse_cogs_csv(&body)?;
    if !import.entries.is_empty() {
        state
            .dashboard
            .repository()
            .merge_custom_cogs(&query.shop, &import.entries)
            .await?;
    }

    Ok(Json(import.report()))
}

/// 已关联的广告账户 (不含令牌)
pub async fn list_ad_accounts(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> AppResult<Json<Vec<AdAccount>>> {
    state.require_shop(&query.shop).await?;
    let accounts = state
        .dashboard
        .repository()
        .list_ad_accounts(&query.shop)
        .await?;
    Ok(Json(accounts))
}

/// 关联广告账户
pub async fn link_ad_account(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    Json(account): Json<AdAccount>,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    state.require_shop(&query.shop).await?;

    let account = AdAccount {
        platform: account.platform,
        account_id: account.account_id.trim().to_string(),
        access_token: account.access_token.trim().to_string(),
    };
    if account.account_id.is_empty() {
        return Err(AppError::InvalidAdAccount("accountId is required".to_string()));
    }
    if account.access_token.is_empty() {
        return Err(AppError::InvalidAdAccount("accessToken is required".to_string()));
    }

    state
        .dashboard
        .repository()
        .link_ad_account(&query.shop, &account)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(format!(
            "Linked {} account {}",
            account.platform, account.account_id
        ))),
    ))
}

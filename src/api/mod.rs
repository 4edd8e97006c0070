pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::{AppError, AppResult};
use crate::service::DashboardService;

pub use handlers::*;

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
}

impl AppState {
    pub fn new(dashboard: Arc<DashboardService>) -> Self {
        Self { dashboard }
    }

    /// 店铺必须已安装
    pub(crate) async fn require_shop(&self, shop: &str) -> AppResult<()> {
        self.dashboard
            .repository()
            .shop_access_token(shop)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::ShopNotFound(shop.to_string()))
    }
}

/// 构建路由
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/dashboard/orders", get(get_order_metrics))
        .route("/api/dashboard/ad-spend", get(get_ad_spend))
        .route("/api/settings", get(get_settings).put(save_settings))
        .route("/api/settings/cogs-csv", post(upload_cogs_csv))
        .route("/api/ad-accounts", get(list_ad_accounts).post(link_ad_account))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}

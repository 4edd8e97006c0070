use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::AdPlatform;

/// 外部数据源 (Shopify / 广告平台) 调用错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP 客户端初始化失败
    #[error("failed to initialize HTTP client: {0}")]
    Init(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited by {0}")]
    RateLimited(&'static str),

    #[error("{source_name} returned status {status}: {body}")]
    Status {
        source_name: &'static str,
        status: u16,
        body: String,
    },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// 配置中缺少调用所需的参数
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("no provider registered for platform {0}")]
    NoProvider(AdPlatform),
}

/// 应用错误, 直接映射为 HTTP 响应
#[derive(Debug, Error)]
pub enum AppError {
    #[error("shop not found: {0}")]
    ShopNotFound(String),

    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("invalid ad account: {0}")]
    InvalidAdAccount(String),

    #[error("invalid CSV upload: {0}")]
    InvalidCsv(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ShopNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidDateRange(_)
            | AppError::InvalidSettings(_)
            | AppError::InvalidAdAccount(_)
            | AppError::InvalidCsv(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Migrate(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = ErrorResponse {
            success: false,
            message: format!("Error: {}", self),
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

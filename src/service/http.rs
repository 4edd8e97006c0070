//! 外部 HTTP 调用的公共部分

use std::time::Duration;

use crate::error::SourceError;

const USER_AGENT: &str = concat!("profit-dashboard/", env!("CARGO_PKG_VERSION"));

/// 构建带超时的 HTTP 客户端
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Init(e.to_string()))
}

/// 非 2xx 响应转为错误, 响应体截断后保留用于日志
pub(crate) async fn check_status(
    response: reqwest::Response,
    source_name: &'static str,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Err(
            SourceError::AuthFailed(format!("{} rejected the access token ({})", source_name, status)),
        ),
        reqwest::StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited(source_name)),
        _ => {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(512)
                .collect();
            Err(SourceError::Status {
                source_name,
                status: status.as_u16(),
                body,
            })
        }
    }
}

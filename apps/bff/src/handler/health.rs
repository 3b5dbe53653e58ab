//! # ヘルスチェックハンドラ
//!
//! BFF の稼働状態を確認するためのエンドポイント。
//!
//! - `/health`: Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready`: Readiness Check（上流 API の疎通を確認）
//!
//! レスポンス型は [`relaygate_shared::HealthResponse`] / [`relaygate_shared::ReadinessResponse`] を参照。

use std::{sync::Arc, time::Duration};

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
};
use relaygate_shared::{CheckStatus, HealthResponse, ReadinessResponse};

use crate::client::{UpstreamRequest, UpstreamTransport};

/// 上流疎通確認のタイムアウト
const UPSTREAM_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// BFF のヘルスチェックエンドポイント
#[utoipa::path(
   get,
   path = "/health",
   tag = "health",
   responses(
      (status = 200, description = "サーバー稼働中", body = HealthResponse)
   )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub transport: Arc<dyn UpstreamTransport>,
}

/// BFF の Readiness Check エンドポイント
///
/// 上流 API の `GET /health` を呼び、500 未満の応答があれば利用可能とみなす。
/// OK → 200、失敗 → 503。
#[utoipa::path(
   get,
   path = "/health/ready",
   tag = "health",
   responses(
      (status = 200, description = "上流 API 稼働中", body = ReadinessResponse),
      (status = 503, description = "上流 API が利用不可", body = ReadinessResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let upstream = check_upstream(state.transport.as_ref()).await;

    let response = ReadinessResponse::from_checks([("upstream", upstream)]);

    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

async fn check_upstream(transport: &dyn UpstreamTransport) -> CheckStatus {
    let probe = transport.send(UpstreamRequest::new(Method::GET, "/health"));
    match tokio::time::timeout(UPSTREAM_PROBE_TIMEOUT, probe).await {
        Ok(Ok(response)) if !response.status.is_server_error() => CheckStatus::Ok,
        Ok(Ok(response)) => {
            tracing::warn!(status = %response.status, "上流のヘルスチェックが失敗");
            CheckStatus::Error
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "上流のヘルスチェックで接続エラー");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!("上流のヘルスチェックがタイムアウト");
            CheckStatus::Error
        }
    }
}

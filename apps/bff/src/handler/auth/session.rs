//! 現在のユーザー

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use relaygate_domain::credential::SubjectId;
use serde::Serialize;
use utoipa::ToSchema;

use super::AuthState;
use crate::{
    client::UpstreamRequest,
    error::{session_expired_response, upstream_failure_response},
    handler::proxy::upstream_response,
};

/// 上流の「自分は誰か」エンドポイント
pub const UPSTREAM_ME_PATH: &str = "/auth/me";

/// 現在のユーザー情報
///
/// 上流の `GET /auth/me` の応答と同じ形。本文は通常そのまま透過する。
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id:         i64,
    pub email:      String,
    pub name:       String,
    pub subject_id: Option<i64>,
}

impl MeResponse {
    /// モックモードの合成ユーザー
    fn mock(subject_id: Option<SubjectId>) -> Self {
        let id = subject_id.map_or(0, |s| s.as_i64());
        Self {
            id,
            email: format!("user{id}@example.com"),
            name: format!("Mock User {id}"),
            subject_id: subject_id.map(|s| s.as_i64()),
        }
    }
}

/// GET /api/auth/me
///
/// リフレッシュは行わない。上流が 401 を返したら SESSION_EXPIRED とする。
#[utoipa::path(
   get,
   path = "/api/auth/me",
   tag = "auth",
   security(("session_auth" = [])),
   responses(
      (status = 200, description = "現在のユーザー情報", body = MeResponse),
      (status = 401, description = "セッション切れ", body = crate::error::ClientErrorBody),
      (status = 502, description = "上流に接続できない", body = relaygate_shared::ErrorResponse),
      (status = 504, description = "上流がタイムアウト", body = relaygate_shared::ErrorResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<Arc<AuthState>>, headers: HeaderMap) -> Response {
    let Some(credential) = state.sessions.open(&headers).credential() else {
        return session_expired_response();
    };

    if state.mock_mode {
        return Json(MeResponse::mock(credential.subject_id())).into_response();
    }

    let request = UpstreamRequest::new(Method::GET, UPSTREAM_ME_PATH);
    match state.engine.send_once(request, Some(&credential)).await {
        Ok(response) if response.status == StatusCode::UNAUTHORIZED => session_expired_response(),
        Ok(response) => upstream_response(response),
        Err(e) => upstream_failure_response("現在ユーザー取得", &e),
    }
}

//! ログアウト

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, Method},
    response::{IntoResponse, Redirect},
};
use relaygate_shared::{
    event_log::{error, event},
    log_business_event,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::AuthState;
use crate::{client::UpstreamRequest, session::SessionCookies};

/// 上流のログアウトエンドポイント
pub const UPSTREAM_LOGOUT_PATH: &str = "/auth/logout";

/// ログアウトレスポンス
#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /api/auth/logout
///
/// 上流のセッションを失効させ（失敗しても続行）、ローカルの認証状態を破棄する。
#[utoipa::path(
   post,
   path = "/api/auth/logout",
   tag = "auth",
   responses(
      (status = 200, description = "ログアウト完了", body = LogoutResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<Arc<AuthState>>, headers: HeaderMap) -> impl IntoResponse {
    let cookies = end_session(&state, &headers).await;
    (cookies, Json(LogoutResponse { success: true }))
}

/// GET /api/auth/logout
///
/// リンクからのログアウト。完了後 `/` へリダイレクトする。
#[utoipa::path(
   get,
   path = "/api/auth/logout",
   tag = "auth",
   responses(
      (status = 307, description = "ログアウト完了、/ へリダイレクト")
   )
)]
#[tracing::instrument(skip_all)]
pub async fn logout_redirect(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cookies = end_session(&state, &headers).await;
    (cookies, Redirect::temporary("/"))
}

async fn end_session(state: &AuthState, headers: &HeaderMap) -> SessionCookies {
    let cookies = state.sessions.open(headers);
    let credential = cookies.credential();

    if let Some(credential) = credential.as_ref().filter(|_| !state.mock_mode) {
        let request = UpstreamRequest::new(Method::POST, UPSTREAM_LOGOUT_PATH);
        if let Err(e) = state.engine.send_once(request, Some(credential)).await {
            tracing::warn!(
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = error::kind::UPSTREAM_LOGOUT,
                "上流のログアウトに失敗（ローカルのセッションは破棄する）: {}",
                e
            );
        }
    }

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::LOGOUT,
        event.result = event::result::SUCCESS,
        event.subject_id = ?credential.as_ref().and_then(|c| c.subject_id()),
        "ログアウト"
    );

    cookies.destroy()
}

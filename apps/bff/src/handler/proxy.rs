//! # プロキシハンドラ
//!
//! `/api/{*path}` へのリクエストを、セッションの認証情報付きで
//! 上流の `/{path}?{query}` へ転送する。
//!
//! | 状況 | レスポンス |
//! |------|------------|
//! | `/api/auth` 配下 | 400（専用エンドポイントを使う） |
//! | 認証情報なし | 401 SESSION_EXPIRED（上流は呼ばない） |
//! | モックモード | `{"message":"Mock response",...}` |
//! | 上流が 5xx 未満を返した | ステータス・本文をそのまま返す |
//! | リフレッシュ失敗 | 401 SESSION_EXPIRED |
//! | タイムアウト / 接続エラー / 上流 5xx | 504 / 502 |

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use relaygate_shared::canonical_log::UpstreamSummary;
use serde_json::json;

use crate::{
    client::UpstreamResponse,
    error::{dedicated_auth_endpoint_response, session_expired_response, upstream_failure_response},
    proxy::{ForwardOutcome, ForwardRequest, ForwardingEngine, headers::passthrough_response_headers},
    session::SessionStore,
};

/// プロキシのマウントポイント
const PROXY_PREFIX: &str = "/api";

/// プロキシハンドラの共有状態
pub struct ProxyState {
    pub engine:    Arc<ForwardingEngine>,
    pub sessions:  Arc<SessionStore>,
    pub mock_mode: bool,
}

/// 上流 API へのプロキシ
#[utoipa::path(
   get,
   path = "/api/{path}",
   tag = "proxy",
   params(("path" = String, Path, description = "上流 API のパス")),
   responses(
      (status = 200, description = "上流の応答をそのまま返す"),
      (status = 400, description = "認証系パスは専用エンドポイントを使う", body = crate::error::ClientErrorBody),
      (status = 401, description = "セッション切れ", body = crate::error::ClientErrorBody),
      (status = 502, description = "上流に接続できない", body = relaygate_shared::ErrorResponse),
      (status = 504, description = "上流がタイムアウト", body = relaygate_shared::ErrorResponse)
   ),
   security(("session_auth" = []))
)]
#[tracing::instrument(skip_all, fields(%method, path = %uri.path()))]
pub async fn proxy(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(PROXY_PREFIX)
        .unwrap_or(uri.path());
    if is_auth_path(path) {
        return dedicated_auth_endpoint_response();
    }

    let cookies = state.sessions.open(&headers);
    let Some(credential) = cookies.credential() else {
        return session_expired_response();
    };

    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    if state.mock_mode {
        return Json(json!({
            "message": "Mock response",
            "path": path_and_query,
            "method": method.as_str(),
        }))
        .into_response();
    }

    let request = ForwardRequest {
        body: json_body(&method, &body),
        method,
        path_and_query,
        headers,
    };

    let forwarded = state.engine.forward(request, &credential).await;
    let summary = UpstreamSummary {
        status:    match &forwarded.outcome {
            ForwardOutcome::Response(upstream) => Some(upstream.status.as_u16()),
            _ => None,
        },
        attempts:  forwarded.attempts,
        refreshed: forwarded.renewed.is_some(),
    };
    let mut response = match forwarded.outcome {
        ForwardOutcome::Response(upstream) => upstream_response(upstream),
        ForwardOutcome::SessionExpired => session_expired_response(),
        ForwardOutcome::Failed(e) => upstream_failure_response("プロキシ", &e),
    };
    response.extensions_mut().insert(summary);

    match forwarded.renewed {
        Some(renewed) => (cookies.persist(&renewed), response).into_response(),
        None => response,
    }
}

/// `auth` または `auth/...`（先頭の `/` は除く）
fn is_auth_path(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    path == "auth" || path.starts_with("auth/")
}

/// GET / HEAD 以外で、本文が JSON として解釈できるときだけ転送する
fn json_body(method: &Method, body: &Bytes) -> Option<serde_json::Value> {
    if *method == Method::GET || *method == Method::HEAD || body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

/// 上流の応答をブラウザ向けレスポンスに変換する
///
/// 本文のバイト列は再エンコードしない。
pub(crate) fn upstream_response(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = passthrough_response_headers(&upstream.headers);
    response
}

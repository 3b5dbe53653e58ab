//! # BFF エラーハンドリング
//!
//! BFF の各ハンドラが共通で使うエラーレスポンスの組み立てを集約する。
//!
//! | 状況 | レスポンス |
//! |------|------------|
//! | 認証情報なし・リフレッシュ失敗 | 401 `{"error":"SESSION_EXPIRED","redirect":...}` |
//! | 専用エンドポイントのある `/api/auth/*` へのプロキシ | 400 `{"error":"Use dedicated auth endpoints"}` |
//! | 上流タイムアウト | 504 Problem Details |
//! | 上流に接続できない・上流 5xx | 502 Problem Details |
//! | ハンドシェイクの失敗 | 307 `/error-page?code=<code>` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use relaygate_domain::error_code::AuthErrorCode;
use relaygate_shared::{ErrorResponse, event_log::error};
use serde::Serialize;
use utoipa::ToSchema;

use crate::client::UpstreamError;

/// セッション切れを示すエラー識別子
pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";

/// エラーページのパス
pub const ERROR_PAGE_PATH: &str = "/error-page";

/// プログラム向けの簡易エラー本文
///
/// `redirect` はブラウザが次に遷移すべきパス。
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientErrorBody {
    pub error:    String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// エラーページの URL（`/error-page?code=<code>`）
pub fn error_page_location(code: AuthErrorCode) -> String {
    format!("{ERROR_PAGE_PATH}?code={code}")
}

/// エラーページへリダイレクトする
pub fn redirect_to_error_page(code: AuthErrorCode) -> Redirect {
    Redirect::temporary(&error_page_location(code))
}

/// 401 SESSION_EXPIRED レスポンス
///
/// 認証情報がない、またはリフレッシュに失敗した場合に返す。再試行はしない。
pub fn session_expired_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ClientErrorBody {
            error:    SESSION_EXPIRED.to_string(),
            redirect: Some(error_page_location(AuthErrorCode::SessionExpired)),
        }),
    )
        .into_response()
}

/// 400 レスポンス（認証系パスのプロキシ禁止）
pub fn dedicated_auth_endpoint_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ClientErrorBody {
            error:    "Use dedicated auth endpoints".to_string(),
            redirect: None,
        }),
    )
        .into_response()
}

/// 上流呼び出しの失敗をログに記録し、502 / 504 レスポンスに変換する
///
/// 認証切れとは区別し、決して 401 にはしない。
pub fn upstream_failure_response(context: &str, err: &UpstreamError) -> Response {
    match err {
        UpstreamError::Timeout => {
            tracing::error!(
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = error::kind::UPSTREAM_TIMEOUT,
                "{}で上流がタイムアウト",
                context
            );
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorResponse::upstream_timeout()),
            )
                .into_response()
        }
        other => {
            tracing::error!(
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = error::kind::UPSTREAM_UNAVAILABLE,
                "{}で上流呼び出しに失敗: {}",
                context,
                other
            );
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::upstream_unavailable(
                    "上流サービスを一時的に利用できません",
                )),
            )
                .into_response()
        }
    }
}

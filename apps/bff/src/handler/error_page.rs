//! # エラー表示ハンドラ
//!
//! 認証フローの失敗時のリダイレクト先。コードに対応するメッセージと
//! 再ログイン用の URL を返す。

use axum::{Json, extract::Query};
use relaygate_domain::error_code::AuthErrorCode;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::auth::LOGIN_PATH;

/// エラー表示のクエリパラメータ
#[derive(Debug, Deserialize, IntoParams)]
pub struct ErrorPageQuery {
    /// エラーコード（未知の値は `default` として扱う）
    pub code: Option<String>,
}

/// エラー表示レスポンス
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPageResponse {
    pub code:      String,
    pub message:   String,
    pub login_url: String,
}

/// GET /error-page
#[utoipa::path(
   get,
   path = "/error-page",
   tag = "auth",
   params(ErrorPageQuery),
   responses(
      (status = 200, description = "エラー内容", body = ErrorPageResponse)
   )
)]
pub async fn error_page(Query(query): Query<ErrorPageQuery>) -> Json<ErrorPageResponse> {
    let code = AuthErrorCode::from_query(query.code.as_deref());
    Json(ErrorPageResponse {
        code:      code.to_string(),
        message:   code.message().to_string(),
        login_url: LOGIN_PATH.to_string(),
    })
}

//! ログイン開始

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use relaygate_domain::return_to::ReturnTo;
use relaygate_shared::{event_log::event, log_business_event};
use serde::Deserialize;
use url::Url;
use utoipa::IntoParams;

use super::AuthState;
use crate::config::SsoConfig;

/// 戻り先の指定がないときの遷移先
const DEFAULT_LANDING: &str = "/dashboard";

/// 認可リクエストで要求するスコープ
const SCOPE: &str = "openid profile email";

/// ログイン開始のクエリパラメータ
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// ログイン後の戻り先（同一オリジンの絶対パスのみ有効）
    pub return_to: Option<String>,
}

/// GET /api/auth/login
///
/// 戻り先は、クエリの `returnTo`、ルートガードが記録した戻り先、`/dashboard` の順に採用する。
#[utoipa::path(
   get,
   path = "/api/auth/login",
   tag = "auth",
   params(LoginQuery),
   responses(
      (status = 307, description = "ID プロバイダの認可エンドポイントへリダイレクト")
   )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Response {
    let cookies = state.sessions.open(&headers);
    let fallback = cookies.return_to().unwrap_or_else(default_landing);
    let return_to = ReturnTo::parse_or(query.return_to.as_deref(), &fallback);

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::LOGIN_STARTED,
        event.result = event::result::SUCCESS,
        event.path = %return_to,
        "ログインを開始"
    );

    let location = authorization_url(&state.sso, &return_to);
    (
        cookies.remember_return_to(&return_to),
        Redirect::temporary(location.as_str()),
    )
        .into_response()
}

fn default_landing() -> ReturnTo {
    ReturnTo::parse(DEFAULT_LANDING).unwrap_or_else(ReturnTo::root)
}

/// ID プロバイダの認可エンドポイント URL
pub fn authorization_url(sso: &SsoConfig, return_to: &ReturnTo) -> Url {
    let mut url = sso.base_url.clone();
    let path = format!("{}/authorize", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut()
        .append_pair("client_id", &sso.client_id)
        .append_pair("redirect_uri", &sso.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", SCOPE)
        .append_pair("state", return_to.as_str());
    url
}

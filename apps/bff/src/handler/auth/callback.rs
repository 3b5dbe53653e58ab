//! ID プロバイダからのコールバック

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use relaygate_domain::{
    credential::{CredentialPair, SubjectId},
    error_code::AuthErrorCode,
    return_to::ReturnTo,
};
use relaygate_shared::{
    event_log::{error, event},
    log_business_event,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::AuthState;
use crate::{
    client::{UpstreamRequest, parse_token_grant},
    error::redirect_to_error_page,
};

/// 上流のログインエンドポイント
pub const UPSTREAM_LOGIN_PATH: &str = "/auth/login";

/// 受け付ける `requestType`
const LOGIN_REQUEST_TYPE: &str = "login";

/// コールバックのクエリパラメータ
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    /// 要求種別（`login` のみ受け付ける）
    pub request_type: Option<String>,
    /// 会員コード（サブジェクト ID、整数）
    pub member_cd:    Option<String>,
    /// サービスコード（ログ出力のみ）
    pub service_code: Option<String>,
    /// ID プロバイダのトークン（受け取るが検証はしない）
    pub st:           Option<String>,
}

/// GET /api/auth/callback, GET /callback
///
/// 会員コードを上流の `POST /auth/login` でトークンと交換し、セッションに保存する。
/// 戻り先マーカーを消費して、記録された戻り先（なければ `/`）へリダイレクトする。
#[utoipa::path(
   get,
   path = "/api/auth/callback",
   tag = "auth",
   params(CallbackParams),
   responses(
      (status = 307, description = "戻り先、または /error-page?code=<code> へリダイレクト")
   )
)]
#[tracing::instrument(skip_all)]
pub async fn callback(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    tracing::debug!(
        service_code = ?params.service_code,
        has_provider_token = params.st.is_some(),
        "ID プロバイダからのコールバック"
    );

    let credential = match validate(&params) {
        Ok(subject_id) => exchange(&state, subject_id).await,
        Err(code) => Err(code),
    };
    let credential = match credential {
        Ok(credential) => credential,
        Err(code) => {
            log_business_event!(
                event.category = event::category::AUTH,
                event.action = event::action::LOGIN_FAILURE,
                event.result = event::result::FAILURE,
                event.reason = %code,
                "ログインに失敗"
            );
            return redirect_to_error_page(code).into_response();
        }
    };

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::LOGIN_SUCCESS,
        event.result = event::result::SUCCESS,
        event.subject_id = ?credential.subject_id(),
        "ログイン成功"
    );

    let cookies = state.sessions.open(&headers);
    let destination = cookies.return_to().unwrap_or_else(ReturnTo::root);
    (
        cookies.persist(&credential).forget_return_to(),
        Redirect::temporary(destination.as_str()),
    )
        .into_response()
}

/// 要求種別と会員コードを検証する
fn validate(params: &CallbackParams) -> Result<SubjectId, AuthErrorCode> {
    if params.request_type.as_deref() != Some(LOGIN_REQUEST_TYPE) {
        return Err(AuthErrorCode::InvalidRequestType);
    }
    params
        .member_cd
        .as_deref()
        .and_then(|value| SubjectId::parse(value).ok())
        .ok_or(AuthErrorCode::MissingMemberCode)
}

/// 会員コードを認証情報ペアと交換する
async fn exchange(state: &AuthState, subject_id: SubjectId) -> Result<CredentialPair, AuthErrorCode> {
    if state.mock_mode {
        return mock_credential(subject_id);
    }

    let request = UpstreamRequest::new(Method::POST, UPSTREAM_LOGIN_PATH)
        .with_json(serde_json::json!({ "subjectId": subject_id.as_i64() }));

    match state.engine.send_once(request, None).await {
        Ok(response) if response.status == StatusCode::OK => parse_token_grant(&response)
            .and_then(|grant| CredentialPair::issue(grant, Some(subject_id)).ok())
            .ok_or_else(|| {
                tracing::warn!("上流ログインの応答にトークンがありません");
                AuthErrorCode::LoginFailed
            }),
        Ok(response) => {
            tracing::warn!(status = %response.status, "上流ログインが拒否されました");
            Err(AuthErrorCode::LoginFailed)
        }
        Err(e) => {
            tracing::error!(
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = error::kind::UPSTREAM_UNAVAILABLE,
                "上流ログインの呼び出しに失敗: {}",
                e
            );
            Err(AuthErrorCode::CallbackError)
        }
    }
}

/// モックモードの認証情報
fn mock_credential(subject_id: SubjectId) -> Result<CredentialPair, AuthErrorCode> {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    CredentialPair::new(
        format!("mock_access_token_{subject_id}_{millis}"),
        format!("mock_refresh_token_{subject_id}_{millis}"),
        Some(subject_id),
    )
    .map_err(|_| AuthErrorCode::CallbackError)
}

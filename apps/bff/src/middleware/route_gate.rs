//! # ルートガード
//!
//! ハンドラより先に実行され、保護ルートへの未認証アクセスを
//! 再認証フローへ迂回させる。
//!
//! ```text
//! リクエスト ─▶ 保護ルート? ─No─▶ Allowed
//!                  │Yes
//!                  ▼
//!            有効な認証情報? ─Yes─▶ Allowed
//!                  │No
//!                  ▼
//!              Diverted（戻り先マーカーを書き、/error-page?code=unauthorized へ）
//! ```
//!
//! 判定は読み取りのみ。同じリクエストとセッションなら何度評価しても同じ結果になる。

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use relaygate_domain::{error_code::AuthErrorCode, return_to::ReturnTo};
use relaygate_shared::{event_log::event, log_business_event};

use crate::{
    error::redirect_to_error_page,
    session::{CredentialResolver, SessionStore},
};

/// ログイン必須のパスプレフィックス一覧
///
/// プレフィックスはパスセグメント単位で一致させる
/// （`/dashboard` は `/dashboard/x` に一致し、`/dashboards` には一致しない）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRoutes(Vec<String>);

impl Default for ProtectedRoutes {
    fn default() -> Self {
        Self(vec!["/dashboard".to_string(), "/mypage".to_string()])
    }
}

impl ProtectedRoutes {
    /// カンマ区切りの文字列からパースする
    ///
    /// 空要素は無視し、先頭に `/` を補い末尾の `/` を除く。
    pub fn parse(value: &str) -> Self {
        Self(
            value
                .split(',')
                .map(|prefix| prefix.trim().trim_end_matches('/'))
                .filter(|prefix| !prefix.is_empty())
                .map(|prefix| {
                    if prefix.starts_with('/') {
                        prefix.to_string()
                    } else {
                        format!("/{prefix}")
                    }
                })
                .collect(),
        )
    }

    pub fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// ルートガードの判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Diverted,
}

impl GateDecision {
    /// 判定する
    ///
    /// 認証情報の確認は保護ルートの場合だけ行う。
    pub fn evaluate(
        routes: &ProtectedRoutes,
        path: &str,
        has_live_credential: impl FnOnce() -> bool,
    ) -> Self {
        if !routes.matches(path) || has_live_credential() {
            Self::Allowed
        } else {
            Self::Diverted
        }
    }
}

/// ルートガード用の状態
pub struct RouteGateState {
    pub protected_routes: ProtectedRoutes,
    pub resolver:         CredentialResolver,
    pub sessions:         Arc<SessionStore>,
}

/// ルートガードミドルウェア
pub async fn route_gate(
    State(state): State<Arc<RouteGateState>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = GateDecision::evaluate(&state.protected_routes, request.uri().path(), || {
        state.resolver.resolve(request.headers()).is_some()
    });

    if decision == GateDecision::Allowed {
        return next.run(request).await;
    }

    let destination = request
        .uri()
        .path_and_query()
        .map_or(request.uri().path(), |pq| pq.as_str());
    let return_to = ReturnTo::parse(destination).unwrap_or_else(ReturnTo::root);

    log_business_event!(
        event.category = event::category::AUTH,
        event.action = event::action::ROUTE_DIVERTED,
        event.result = event::result::FAILURE,
        event.path = %return_to,
        "未認証のため保護ルートから迂回"
    );

    let cookies = state
        .sessions
        .open(request.headers())
        .remember_return_to(&return_to);
    (cookies, redirect_to_error_page(AuthErrorCode::Unauthorized)).into_response()
}

//! 認証情報の解決

use std::sync::Arc;

use axum::http::HeaderMap;
use relaygate_domain::credential::CredentialPair;

use super::SessionStore;

/// リクエストから現在の認証情報ペアを解決する
///
/// 起動時に選んだ [`TokenStrategy`](super::TokenStrategy) に従い、暗号化セッション
/// または生トークン Cookie を読む。次の場合は `None`（認証情報なし）:
///
/// - Cookie がない、または復号できない
/// - `isLoggedIn` が false
/// - アクセストークン・リフレッシュトークンのどちらかが空
///
/// 読み取りのみで、Cookie の状態は変更しない。
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<SessionStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self, headers: &HeaderMap) -> Option<CredentialPair> {
        self.store.open(headers).credential()
    }
}

//! # 上流クライアントファクトリ
//!
//! 認証情報を付与した上流クライアントを組み立てる。
//! セッション状態は読まず、書かない。

use std::sync::Arc;

use axum::http::{
    HeaderName,
    HeaderValue,
    header::{AUTHORIZATION, COOKIE},
};
use relaygate_domain::credential::CredentialPair;
use relaygate_shared::event_log::error;

use super::{UpstreamError, UpstreamRequest, UpstreamResponse, UpstreamTransport};
use crate::{
    middleware::request_id::stamp_request_id,
    session::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, TokenStrategy},
};

/// 上流クライアントファクトリ
pub struct UpstreamClientFactory {
    transport: Arc<dyn UpstreamTransport>,
    strategy:  TokenStrategy,
}

impl UpstreamClientFactory {
    pub fn new(transport: Arc<dyn UpstreamTransport>, strategy: TokenStrategy) -> Self {
        Self {
            transport,
            strategy,
        }
    }

    /// 通常の API 呼び出し用クライアントを作る
    ///
    /// 認証情報があれば、Cookie 転送方式ではペアを `Cookie` ヘッダーに、
    /// それ以外ではアクセストークンを `Authorization: Bearer` に載せる。
    pub fn build(&self, credential: Option<&CredentialPair>) -> UpstreamClient {
        let attachment = credential.and_then(|credential| {
            if self.strategy.forwards_cookies() {
                cookie_attachment(credential)
            } else {
                bearer_attachment(credential.access_token())
            }
        });
        self.client(attachment)
    }

    /// `POST /auth/refresh` 用クライアントを作る
    ///
    /// 古いリフレッシュトークンで認証する。
    pub fn build_for_refresh(&self, credential: &CredentialPair) -> UpstreamClient {
        let attachment = if self.strategy.forwards_cookies() {
            cookie_attachment(credential)
        } else {
            bearer_attachment(credential.refresh_token())
        };
        self.client(attachment)
    }

    /// 上流のトランスポート（ヘルスチェック用）
    pub fn transport(&self) -> Arc<dyn UpstreamTransport> {
        self.transport.clone()
    }

    fn client(&self, attachment: Option<(HeaderName, HeaderValue)>) -> UpstreamClient {
        UpstreamClient {
            transport: self.transport.clone(),
            attachment,
        }
    }
}

/// 認証情報付きの上流クライアント
pub struct UpstreamClient {
    transport:  Arc<dyn UpstreamTransport>,
    attachment: Option<(HeaderName, HeaderValue)>,
}

impl UpstreamClient {
    /// リクエストを送る
    ///
    /// 500 未満のステータスはすべて `Ok`（4xx はデータであって失敗ではない）。
    /// 5xx は [`UpstreamError::ServerError`] になる。
    pub async fn send(
        &self,
        mut request: UpstreamRequest,
    ) -> Result<UpstreamResponse, UpstreamError> {
        if let Some((name, value)) = &self.attachment {
            request.headers.insert(name.clone(), value.clone());
        }
        stamp_request_id(&mut request.headers);

        let response = self.transport.send(request).await?;
        if response.status.is_server_error() {
            return Err(UpstreamError::ServerError(response.status));
        }
        Ok(response)
    }
}

fn bearer_attachment(token: &str) -> Option<(HeaderName, HeaderValue)> {
    sensitive_value(format!("Bearer {token}")).map(|value| (AUTHORIZATION, value))
}

fn cookie_attachment(credential: &CredentialPair) -> Option<(HeaderName, HeaderValue)> {
    sensitive_value(format!(
        "{ACCESS_TOKEN_COOKIE}={}; {REFRESH_TOKEN_COOKIE}={}",
        credential.access_token(),
        credential.refresh_token()
    ))
    .map(|value| (COOKIE, value))
}

/// ログやデバッグ出力に値が出ないようにしたヘッダー値
fn sensitive_value(raw: String) -> Option<HeaderValue> {
    match HeaderValue::from_str(&raw) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => {
            tracing::warn!(
                error.category = error::category::INFRASTRUCTURE,
                error.kind = error::kind::SESSION,
                "トークンにヘッダーとして使えない文字が含まれているため付与しません"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_utils::{ScriptedTransport, json_response};

    fn pair() -> CredentialPair {
        CredentialPair::new("acc", "ref", None).unwrap()
    }

    fn header(transport: &ScriptedTransport, name: HeaderName) -> Option<String> {
        transport.requests()[0]
            .headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_bearer方式ではアクセストークンをauthorizationに付与する() {
        let transport = Arc::new(ScriptedTransport::new());
        let sut = UpstreamClientFactory::new(transport.clone(), TokenStrategy::SealedSession);

        sut.build(Some(&pair()))
            .send(UpstreamRequest::new(Method::GET, "/posts"))
            .await
            .unwrap();

        assert_eq!(header(&transport, AUTHORIZATION).as_deref(), Some("Bearer acc"));
        assert_eq!(header(&transport, COOKIE), None);
    }

    #[tokio::test]
    async fn test_cookie転送方式ではペアをcookieヘッダーに付与する() {
        let transport = Arc::new(ScriptedTransport::new());
        let sut = UpstreamClientFactory::new(transport.clone(), TokenStrategy::CookieForward);

        sut.build(Some(&pair()))
            .send(UpstreamRequest::new(Method::GET, "/posts"))
            .await
            .unwrap();

        assert_eq!(
            header(&transport, COOKIE).as_deref(),
            Some("access_token=acc; refresh_token=ref")
        );
        assert_eq!(header(&transport, AUTHORIZATION), None);
    }

    #[tokio::test]
    async fn test_認証情報なしではヘッダーを付与しない() {
        let transport = Arc::new(ScriptedTransport::new());
        let sut = UpstreamClientFactory::new(transport.clone(), TokenStrategy::Bearer);

        sut.build(None)
            .send(UpstreamRequest::new(Method::POST, "/auth/login"))
            .await
            .unwrap();

        assert_eq!(header(&transport, AUTHORIZATION), None);
    }

    #[tokio::test]
    async fn test_リフレッシュ用クライアントはリフレッシュトークンで認証する() {
        let transport = Arc::new(ScriptedTransport::new());
        let sut = UpstreamClientFactory::new(transport.clone(), TokenStrategy::Bearer);

        sut.build_for_refresh(&pair())
            .send(UpstreamRequest::new(Method::POST, "/auth/refresh"))
            .await
            .unwrap();

        assert_eq!(header(&transport, AUTHORIZATION).as_deref(), Some("Bearer ref"));
    }

    #[tokio::test]
    async fn test_4xxは成功として返り5xxはエラーになる() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .on(
                    Method::GET,
                    "/missing",
                    json_response(StatusCode::NOT_FOUND, serde_json::json!({})),
                )
                .on(
                    Method::GET,
                    "/broken",
                    json_response(StatusCode::BAD_GATEWAY, serde_json::json!({})),
                ),
        );
        let sut = UpstreamClientFactory::new(transport, TokenStrategy::Bearer).build(None);

        let missing = sut
            .send(UpstreamRequest::new(Method::GET, "/missing"))
            .await
            .unwrap();
        let broken = sut.send(UpstreamRequest::new(Method::GET, "/broken")).await;

        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(
            broken.unwrap_err(),
            UpstreamError::ServerError(StatusCode::BAD_GATEWAY)
        );
    }
}

//! 転送・401 検出・リフレッシュ・再送

use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use relaygate_domain::credential::CredentialPair;

use super::{
    RefreshCoordinator,
    RefreshOutcome,
    headers::forwardable_request_headers,
};
use crate::client::{UpstreamClientFactory, UpstreamError, UpstreamRequest, UpstreamResponse};

/// 転送するリクエスト
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method:         Method,
    /// 上流側のパスとクエリ文字列（例: `/posts?page=2`）
    pub path_and_query: String,
    /// ブラウザから受け取ったヘッダー（除外前）
    pub headers:        HeaderMap,
    pub body:           Option<serde_json::Value>,
}

impl ForwardRequest {
    fn into_upstream(self) -> UpstreamRequest {
        let mut request = UpstreamRequest::new(self.method, self.path_and_query);
        request.headers = forwardable_request_headers(&self.headers);
        request.body = self.body;
        request
    }
}

/// 転送の最終結果
#[derive(Debug, Clone)]
pub enum ForwardOutcome {
    /// 上流の応答（再送後の 401 も含む）
    Response(UpstreamResponse),
    /// リフレッシュに失敗した
    SessionExpired,
    /// タイムアウト・接続エラー・上流 5xx
    Failed(UpstreamError),
}

/// 転送結果と、リフレッシュで得た新しい認証情報
#[derive(Debug, Clone)]
pub struct Forwarded {
    pub outcome:  ForwardOutcome,
    /// 呼び出し側がセッションに保存すべき認証情報
    pub renewed:  Option<CredentialPair>,
    /// 上流への送信回数（リフレッシュ呼び出しは含まない）
    pub attempts: u8,
}

impl Forwarded {
    fn without_renewal(outcome: ForwardOutcome) -> Self {
        Self {
            outcome,
            renewed: None,
            attempts: 1,
        }
    }
}

/// 転送エンジン
pub struct ForwardingEngine {
    factory:     Arc<UpstreamClientFactory>,
    coordinator: Arc<RefreshCoordinator>,
}

impl ForwardingEngine {
    pub fn new(factory: Arc<UpstreamClientFactory>, coordinator: Arc<RefreshCoordinator>) -> Self {
        Self {
            factory,
            coordinator,
        }
    }

    /// リクエストを転送する
    ///
    /// 401 を受けたらリフレッシュし、元のリクエストを 1 回だけ再送する。
    /// 再送がまた 401 でも、それ以上リフレッシュせずそのまま返す。
    /// タイムアウトは再送しない。
    pub async fn forward(&self, request: ForwardRequest, credential: &CredentialPair) -> Forwarded {
        let request = request.into_upstream();

        let first = match self.send_once(request.clone(), Some(credential)).await {
            Ok(response) => response,
            Err(e) => return Forwarded::without_renewal(ForwardOutcome::Failed(e)),
        };
        if first.status != StatusCode::UNAUTHORIZED {
            return Forwarded::without_renewal(ForwardOutcome::Response(first));
        }

        tracing::debug!(path = request.path(), "上流が 401 を返したためリフレッシュする");

        let renewed = match self.coordinator.refresh_once(credential).await {
            RefreshOutcome::Success { credential } => credential,
            RefreshOutcome::Failure { .. } => {
                return Forwarded::without_renewal(ForwardOutcome::SessionExpired);
            }
        };

        let outcome = match self.send_once(request, Some(&renewed)).await {
            Ok(response) => ForwardOutcome::Response(response),
            Err(e) => ForwardOutcome::Failed(e),
        };
        Forwarded {
            outcome,
            renewed: Some(renewed),
            attempts: 2,
        }
    }

    /// リフレッシュなしで 1 回だけ送る
    ///
    /// 認証ハンドシェイクや現在ユーザー取得で使う。
    pub async fn send_once(
        &self,
        request: UpstreamRequest,
        credential: Option<&CredentialPair>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.factory.build(credential).send(request).await
    }
}

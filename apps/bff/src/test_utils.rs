//! テスト用ヘルパー
//!
//! 上流のスクリプト化スタブ、設定、Cookie の受け渡しをまとめる。

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{
        HeaderMap,
        HeaderValue,
        Method,
        StatusCode,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Cookie;
use bytes::Bytes;
use relaygate_domain::credential::CredentialPair;
use serde_json::Value;

use crate::{
    client::{
        UpstreamClientFactory,
        UpstreamError,
        UpstreamRequest,
        UpstreamResponse,
        UpstreamTransport,
    },
    config::BffConfig,
    handler::AuthState,
    proxy::{ForwardingEngine, RefreshCoordinator},
    session::SessionStore,
};

pub const TEST_SESSION_SECRET: &str = "0123456789abcdef0123456789abcdef";

/// テスト用の設定（必須項目のみ）
pub fn test_config() -> BffConfig {
    test_config_with(&[])
}

/// テスト用の設定（一部を上書き）
pub fn test_config_with(vars: &[(&str, &str)]) -> BffConfig {
    let mut map: HashMap<String, String> = HashMap::from([
        ("BFF_PORT".to_string(), "13000".to_string()),
        ("UPSTREAM_URL".to_string(), "http://upstream.invalid".to_string()),
        ("SESSION_SECRET".to_string(), TEST_SESSION_SECRET.to_string()),
        ("SSO_URL".to_string(), "https://sso.example.com".to_string()),
        ("SSO_CLIENT_ID".to_string(), "relaygate-test".to_string()),
        (
            "SSO_REDIRECT_URI".to_string(),
            "http://localhost:13000/api/auth/callback".to_string(),
        ),
    ]);
    for (k, v) in vars {
        map.insert((*k).to_string(), (*v).to_string());
    }
    BffConfig::from_lookup(|name| map.get(name).cloned()).unwrap()
}

/// 設定どおりに組み立てた転送エンジン
pub fn engine(config: &BffConfig, transport: Arc<dyn UpstreamTransport>) -> Arc<ForwardingEngine> {
    let factory = Arc::new(UpstreamClientFactory::new(transport, config.token_strategy));
    Arc::new(ForwardingEngine::new(
        factory.clone(),
        Arc::new(RefreshCoordinator::new(factory)),
    ))
}

/// 認証ハンドラの共有状態
pub fn auth_state(config: &BffConfig, transport: Arc<dyn UpstreamTransport>) -> Arc<AuthState> {
    Arc::new(AuthState {
        engine:    engine(config, transport),
        sessions:  Arc::new(SessionStore::new(&config.session, config.token_strategy)),
        sso:       config.sso.clone(),
        mock_mode: config.mock_mode,
    })
}

/// JSON 本文の上流応答
pub fn json_response(status: StatusCode, body: Value) -> Result<UpstreamResponse, UpstreamError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(UpstreamResponse {
        status,
        headers,
        body: Bytes::from(body.to_string()),
    })
}

type Scripted = Result<UpstreamResponse, UpstreamError>;

/// 応答を台本どおりに返す上流スタブ
///
/// `METHOD path` ごとに応答を積む。積んだ応答は先頭から順に返し、最後の 1 件は
/// 繰り返し返す。台本のない呼び出しには `200 {}` を返す。
/// 受け取ったリクエストはすべて記録する。
#[derive(Default)]
pub struct ScriptedTransport {
    scripts:  Mutex<HashMap<String, VecDeque<Scripted>>>,
    delays:   HashMap<String, Duration>,
    requests: Mutex<Vec<UpstreamRequest>>,
}

fn script_key(method: &Method, path: &str) -> String {
    format!("{method} {path}")
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, response: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(script_key(&method, path))
            .or_default()
            .push_back(response);
        self
    }

    /// 応答を返す前に待機させる
    pub fn delay(mut self, method: Method, path: &str, delay: Duration) -> Self {
        self.delays.insert(script_key(&method, path), delay);
        self
    }

    /// 記録したリクエスト
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// 指定したエンドポイントの呼び出し回数
    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path() == path)
            .count()
    }
}

#[async_trait]
impl UpstreamTransport for ScriptedTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let key = script_key(&request.method, request.path());
        self.requests.lock().unwrap().push(request);

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => json_response(StatusCode::OK, serde_json::json!({})),
        }
    }
}

/// レスポンスの `Set-Cookie` ヘッダー値の一覧
pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// レスポンスの `Set-Cookie` からブラウザが次に送る `Cookie` ヘッダーを作る
///
/// `Max-Age=0`（削除）の Cookie は送らない。
pub fn cookie_header_from(headers: &HeaderMap) -> HeaderMap {
    let pairs: Vec<String> = set_cookies(headers)
        .iter()
        .map(|raw| Cookie::parse(raw.clone()).unwrap())
        .filter(|cookie| cookie.max_age() != Some(time::Duration::ZERO))
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect();

    let mut request_headers = HeaderMap::new();
    if !pairs.is_empty() {
        request_headers.insert(COOKIE, HeaderValue::from_str(&pairs.join("; ")).unwrap());
    }
    request_headers
}

/// 認証情報を保存済みのセッションを持つリクエストヘッダー
pub fn session_headers(config: &BffConfig, credential: &CredentialPair) -> HeaderMap {
    let store = SessionStore::new(&config.session, config.token_strategy);
    let cookies = store.open(&HeaderMap::new()).persist(credential);
    cookie_header_from((cookies, ()).into_response().headers())
}

/// レスポンス本文を JSON として読む
pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 空本文のリクエスト
pub fn request(method: Method, uri: &str, headers: HeaderMap) -> axum::http::Request<Body> {
    let mut request = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    request.headers_mut().extend(headers);
    request
}

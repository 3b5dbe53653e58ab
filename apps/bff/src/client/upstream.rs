//! # 上流トランスポート
//!
//! 上流 API に 1 リクエストを送り、ステータス・ヘッダー・本文をそのまま返す。
//! ステータスの解釈（5xx をエラーとみなす等）は [`UpstreamClient`](super::UpstreamClient) が行う。

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// 上流呼び出しのエラー
///
/// いずれも「認証情報の問題」ではない。401 は [`UpstreamResponse`] として返る。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// タイムアウト
    #[error("上流サービスの応答がタイムアウトしました")]
    Timeout,

    /// 接続できない
    #[error("上流サービスに接続できません: {0}")]
    Unavailable(String),

    /// 上流が 5xx を返した
    #[error("上流サービスがエラーを返しました: {0}")]
    ServerError(StatusCode),

    /// その他のネットワークエラー
    #[error("ネットワークエラー: {0}")]
    Network(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_connect() {
            UpstreamError::Unavailable(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

/// 上流へのリクエスト
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method:         Method,
    /// `/` で始まるパスとクエリ文字列（例: `/posts?page=2`）
    pub path_and_query: String,
    pub headers:        HeaderMap,
    /// JSON 本文（GET/HEAD では常に `None`）
    pub body:           Option<serde_json::Value>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// クエリ文字列を除いたパス
    pub fn path(&self) -> &str {
        self.path_and_query
            .split_once('?')
            .map_or(self.path_and_query.as_str(), |(path, _)| path)
    }
}

/// 上流からの応答
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    pub body:    Bytes,
}

impl UpstreamResponse {
    /// 本文を JSON としてデシリアライズする
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// 上流トランスポートトレイト
///
/// テスト時にスタブを使用できるようトレイトで定義。
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// reqwest による上流トランスポート
///
/// 固定タイムアウト付き。リダイレクトは追わず、3xx もそのまま返す。
pub struct HttpUpstreamTransport {
    client:   reqwest::Client,
    base_url: String,
}

impl HttpUpstreamTransport {
    /// 新しいトランスポートを作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: 上流 API のベース URL（例: `http://localhost:8080`）
    /// - `timeout`: 1 リクエストあたりのタイムアウト
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UpstreamTransport for HttpUpstreamTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = format!("{}{}", self.base_url, request.path_and_query);

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

//! # Request ID の上流への引き継ぎ
//!
//! `SetRequestIdLayer` が採番（またはクライアント提供値を採用）した Request ID を
//! [`store_request_id`] が task-local に置き、[`stamp_request_id`] が上流への
//! リクエストヘッダーに書き込む。
//!
//! 書き込みは [`UpstreamClient`](crate::client::UpstreamClient) が行うので、
//! トランスポートの実装によらず必ず付く。リフレッシュは最初に到着した
//! リクエストのタスク上で実行されるため、その Request ID が付く。

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use relaygate_shared::observability::REQUEST_ID_HEADER;
use tower_http::request_id::RequestId;

tokio::task_local! {
    static REQUEST_ID: HeaderValue;
}

/// 現在のリクエストの Request ID
///
/// task-local スコープ外（起動時の呼び出しやテスト）では `None`。
pub fn current_request_id() -> Option<HeaderValue> {
    REQUEST_ID.try_with(HeaderValue::clone).ok()
}

/// Request ID を task-local に保存するミドルウェア
///
/// `SetRequestIdLayer` より内側に置く。
pub async fn store_request_id(request: Request<Body>, next: Next) -> Response {
    match request.extensions().get::<RequestId>() {
        Some(id) => {
            let value = id.header_value().clone();
            REQUEST_ID.scope(value, next.run(request)).await
        }
        None => next.run(request).await,
    }
}

/// 現在の Request ID を上流向けヘッダーに書き込む
///
/// ブラウザから来た同名ヘッダーは転送前に除外済みなので、ここで上書きする。
pub fn stamp_request_id(headers: &mut HeaderMap) {
    if let Some(id) = current_request_id() {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), id);
    }
}

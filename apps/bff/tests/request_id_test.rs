//! # Request ID レイヤーのテスト
//!
//! `build_app` が組み立てたレイヤー構成（SetRequestIdLayer + PropagateRequestIdLayer +
//! カスタム make_span_with）が正しく動作することを検証する。
//!
//! - 採番した `X-Request-Id` は UUID v7 で、リクエストごとに異なる
//! - クライアント提供の `X-Request-Id` はそのまま返す
//! - ルートガードの迂回や上流障害のレスポンスにも付く

use std::{sync::Arc, time::Duration};

use axum::{Router, body::Body};
use http::{Request, StatusCode};
use relaygate_bff::{app_builder::build_app, client::HttpUpstreamTransport, config::BffConfig};
use tower::ServiceExt;

/// テスト用のアプリケーションを構築する
///
/// 上流には接続しないエンドポイントだけを叩く。
fn test_app() -> Router {
    let config = BffConfig::from_lookup(|name| {
        let value = match name {
            "BFF_PORT" => "13000",
            "UPSTREAM_URL" => "http://127.0.0.1:1",
            "SESSION_SECRET" => "request-id-test-secret-0123456789abcdef",
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap();
    let transport = HttpUpstreamTransport::new(&config.upstream_url, Duration::from_secs(1)).unwrap();
    build_app(&config, Arc::new(transport))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn request_id_of(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get("x-request-id")
        .expect("レスポンスに x-request-id ヘッダーが含まれること")
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_採番したrequest_idはuuid_v7でレスポンスに載る() {
    let response = test_app().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = request_id_of(&response);
    let uuid = uuid::Uuid::parse_str(request_id)
        .unwrap_or_else(|_| panic!("有効な UUID であること: {request_id}"));
    assert_eq!(uuid.get_version(), Some(uuid::Version::SortRand));
}

#[tokio::test]
async fn test_リクエストごとに別のrequest_idを採番する() {
    let app = test_app();

    let first = app.clone().oneshot(get("/health")).await.unwrap();
    let second = app.oneshot(get("/health")).await.unwrap();

    assert_ne!(request_id_of(&first), request_id_of(&second));
}

#[tokio::test]
async fn test_クライアント提供のrequest_idはそのまま返す() {
    let mut request = get("/error-page?code=unauthorized");
    request
        .headers_mut()
        .insert("x-request-id", "client-provided-request-id-123".parse().unwrap());

    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(request_id_of(&response), "client-provided-request-id-123");
}

#[tokio::test]
async fn test_ルートガードの迂回レスポンスにもrequest_idが付く() {
    let response = test_app().oneshot(get("/dashboard")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(!request_id_of(&response).is_empty());
}

#[tokio::test]
async fn test_上流に届かないreadinessにもrequest_idが付く() {
    let response = test_app().oneshot(get("/health/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!request_id_of(&response).is_empty());
}

//! # キャッシュ制御ミドルウェア
//!
//! トークンを含みうる応答や認証リダイレクトがブラウザ・中間プロキシに
//! キャッシュされないよう、`Cache-Control: no-store` を全レスポンスに設定する。

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

/// レスポンスに `Cache-Control: no-store` を付与する
///
/// 上流が返した `Cache-Control` も上書きする。
pub async fn no_cache(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_既存のcache_controlをno_storeで上書きする() {
        let app = Router::new()
            .route(
                "/cached",
                get(|| async { ([(header::CACHE_CONTROL, "max-age=3600")], "body") }),
            )
            .layer(from_fn(no_cache));

        let response = app
            .oneshot(Request::builder().uri("/cached").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }
}

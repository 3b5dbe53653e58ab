//! 転送時のヘッダー規則
//!
//! 除外リストはデータとして定義し、監査・テストしやすくしている。

use axum::http::{
    HeaderMap,
    HeaderName,
    header::{
        AUTHORIZATION,
        CONNECTION,
        CONTENT_ENCODING,
        CONTENT_LENGTH,
        CONTENT_TYPE,
        COOKIE,
        HOST,
        LOCATION,
        SET_COOKIE,
        TRANSFER_ENCODING,
    },
};

/// 上流へ転送しないリクエストヘッダー（ホップバイホップとブラウザ由来の認証情報）
///
/// 上流への認証情報はセッションから付け直す。
pub const EXCLUDED_REQUEST_HEADERS: [HeaderName; 6] = [
    HOST,
    CONNECTION,
    HeaderName::from_static("keep-alive"),
    TRANSFER_ENCODING,
    COOKIE,
    AUTHORIZATION,
];

/// 転送時に付け直すリクエストヘッダー
///
/// 本文は JSON として再エンコードされ、Request ID はトランスポートが付与する。
pub const REGENERATED_REQUEST_HEADERS: [HeaderName; 2] = [
    CONTENT_LENGTH,
    HeaderName::from_static("x-request-id"),
];

/// ブラウザへ透過する上流のレスポンスヘッダー
pub const PASSTHROUGH_RESPONSE_HEADERS: [HeaderName; 4] =
    [CONTENT_TYPE, CONTENT_ENCODING, LOCATION, SET_COOKIE];

/// 上流へ転送するリクエストヘッダー
pub fn forwardable_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    for name in EXCLUDED_REQUEST_HEADERS
        .iter()
        .chain(REGENERATED_REQUEST_HEADERS.iter())
    {
        headers.remove(name);
    }
    headers
}

/// ブラウザへ返すレスポンスヘッダー
///
/// 同名ヘッダーが複数ある場合（`Set-Cookie` 等）もすべて残す。
pub fn passthrough_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in &PASSTHROUGH_RESPONSE_HEADERS {
        for value in upstream.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

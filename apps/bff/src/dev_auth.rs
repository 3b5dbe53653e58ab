//! # 開発用ログイン（DevAuth）
//!
//! ID プロバイダなしでログインフローを通すための仕組み。
//! ID プロバイダのリダイレクトを模擬し、`/callback` へ会員コード付きで遷移させる。
//!
//! ## 使い方
//!
//! 1. 環境変数 `DEV_AUTH_ENABLED=true` を設定して BFF を起動
//! 2. ブラウザで `/dev/login?memberCd=40` を開く
//! 3. `MOCK_MODE=true` と併用すると上流 API なしでログイン状態になる
//!
//! ## 安全策
//!
//! - `dev-auth` feature が無効なビルドではコンパイルされない
//! - `DEV_AUTH_ENABLED` が設定されていない場合はルートを登録しない
//! - リリースビルドで `DEV_AUTH_ENABLED=true` の場合は起動エラー
//! - 本番環境では絶対に有効にしないこと

use axum::{
    Router,
    extract::Query,
    response::Redirect,
    routing::get,
};
use serde::Deserialize;

/// 開発用会員コード
pub const DEV_MEMBER_CD: &str = "40";

/// 開発用サービスコード
pub const DEV_SERVICE_CODE: &str = "5000";

/// ID プロバイダのトークンの代わりに渡す値
pub const DEV_PROVIDER_TOKEN: &str = "MOCK_SSO_TOKEN";

/// 開発用ログインのクエリパラメータ
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevLoginQuery {
    pub member_cd:    Option<String>,
    pub service_code: Option<String>,
}

/// 開発用ログインのルート
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/dev/login", get(dev_login))
}

/// GET /dev/login
///
/// ID プロバイダのコールバックを模擬してリダイレクトする。
pub async fn dev_login(Query(query): Query<DevLoginQuery>) -> Redirect {
    tracing::warn!("DevAuth: 開発用ログインを実行します");
    Redirect::temporary(&callback_location(&query))
}

fn callback_location(query: &DevLoginQuery) -> String {
    let member_cd = query.member_cd.as_deref().unwrap_or(DEV_MEMBER_CD);
    let service_code = query.service_code.as_deref().unwrap_or(DEV_SERVICE_CODE);
    let params = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("requestType", "login")
        .append_pair("serviceCode", service_code)
        .append_pair("memberCd", member_cd)
        .append_pair("st", DEV_PROVIDER_TOKEN)
        .finish();
    format!("/callback?{params}")
}

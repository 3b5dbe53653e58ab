//! # BFF 自身のエンドポイントの OpenAPI 記述
//!
//! ハンドラの `#[utoipa::path]` から組み立てる。`/api/{path}` は上流 API への
//! 透過プロキシなので、個々の上流エンドポイントは記述しない。
//! YAML は `cargo run -p relaygate-bff --bin generate-openapi` で出力する。

use utoipa::{
    Modify,
    OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::{
    handler::{auth, error_page, health, proxy},
    session::SESSION_COOKIE,
};

#[derive(OpenApi)]
#[openapi(
   info(
      title = "Relaygate BFF API",
      description = "セッションに紐づくトークンで上流 API を仲介する BFF"
   ),
   paths(
      // health
      health::health_check,
      health::readiness_check,
      // auth
      auth::login::login,
      auth::callback::callback,
      auth::logout::logout,
      auth::logout::logout_redirect,
      auth::session::me,
      error_page::error_page,
      // proxy
      proxy::proxy,
   ),
   components(schemas(
      relaygate_shared::ErrorResponse,
      crate::error::ClientErrorBody,
   )),
   tags(
      (name = "health", description = "ヘルスチェック"),
      (name = "auth", description = "認証"),
      (name = "proxy", description = "上流 API へのプロキシ"),
   ),
   modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// `session_auth`: 暗号化セッション Cookie
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "session_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE,
                "ログイン時に発行される暗号化セッション Cookie（トークン方式が sealed-session の場合）",
            ))),
        );
    }
}

//! # OpenAPI 仕様テスト
//!
//! utoipa から生成される OpenAPI 仕様の整合性を検証する。

use relaygate_bff::openapi::ApiDoc;
use utoipa::OpenApi;

#[test]
fn test_openapi仕様がパニックせず生成される() {
   let doc = ApiDoc::openapi();
   // パニックしなければ成功
   let _yaml = doc.to_yaml().unwrap();
}

#[test]
fn test_全パスが含まれている() {
   let doc = ApiDoc::openapi();
   let paths: Vec<&str> = doc.paths.paths.keys().map(|k| k.as_str()).collect();

   // 8 パス（9 ハンドラ、ログアウトは GET / POST の 2 メソッド）
   assert_eq!(paths.len(), 8, "パス数が 8 であること: {paths:?}");

   assert!(paths.contains(&"/health"));
   assert!(paths.contains(&"/health/ready"));
   assert!(paths.contains(&"/api/auth/login"));
   assert!(paths.contains(&"/api/auth/callback"));
   assert!(paths.contains(&"/api/auth/logout"));
   assert!(paths.contains(&"/api/auth/me"));
   assert!(paths.contains(&"/error-page"));
   assert!(paths.contains(&"/api/{path}"));
}

#[test]
fn test_ログアウトはgetとpostの両方を持つ() {
   let doc = ApiDoc::openapi();
   let logout = doc
      .paths
      .paths
      .get("/api/auth/logout")
      .expect("/api/auth/logout が存在すること");

   assert!(logout.get.is_some());
   assert!(logout.post.is_some());
}

#[test]
fn test_session_authセキュリティスキームが含まれている() {
   let doc = ApiDoc::openapi();
   let components = doc.components.as_ref().expect("components が存在すること");
   assert!(
      components.security_schemes.contains_key("session_auth"),
      "session_auth セキュリティスキームが存在すること"
   );
}

#[test]
fn test_全タグが含まれている() {
   let doc = ApiDoc::openapi();
   let tags: Vec<&str> = doc
      .tags
      .as_ref()
      .expect("tags が存在すること")
      .iter()
      .map(|t| t.name.as_str())
      .collect();

   assert_eq!(tags, vec!["health", "auth", "proxy"]);
}

#[test]
fn test_エラーレスポンスのスキーマが登録されている() {
   let doc = ApiDoc::openapi();
   let components = doc.components.as_ref().expect("components が存在すること");
   let schemas: Vec<&String> = components.schemas.keys().collect();

   assert!(
      components.schemas.contains_key("ErrorResponse"),
      "ErrorResponse スキーマが存在すること: {schemas:?}"
   );
   assert!(
      components.schemas.contains_key("ClientErrorBody"),
      "ClientErrorBody スキーマが存在すること: {schemas:?}"
   );
}

#[test]
fn test_バージョンはパッケージのバージョン() {
   let doc = ApiDoc::openapi();

   assert_eq!(doc.info.title, "Relaygate BFF API");
   assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));
}

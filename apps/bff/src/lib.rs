//! # Relaygate BFF (Backend for Frontend) ライブラリ
//!
//! ブラウザと上流 API の間に立ち、セッションに紐づくトークンで
//! すべてのリクエストを仲介するエッジ層のコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: ルーターと依存関係の組み立て
//! - `client`: 上流 API クライアント（トランスポート、クライアントファクトリ）
//! - `config`: 環境変数からの設定読み込み
//! - `dev_auth`: ID プロバイダを模擬する開発用ログイン（`dev-auth` feature 有効時のみ）
//! - `error`: エラーレスポンスの組み立て
//! - `handler`: HTTP ハンドラ（認証ハンドシェイク、プロキシ、ヘルスチェック）
//! - `middleware`: ミドルウェア（ルートガード、Request ID、キャッシュ制御）
//! - `openapi`: OpenAPI 仕様定義
//! - `proxy`: 転送エンジンとトークンリフレッシュの単一実行制御
//! - `session`: 暗号化セッション Cookie と認証情報の解決

pub mod app_builder;
pub mod client;
pub mod config;
#[cfg(feature = "dev-auth")]
pub mod dev_auth;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod openapi;
pub mod proxy;
pub mod session;

#[cfg(test)]
pub(crate) mod test_utils;

//! # Relaygate ドメイン層
//!
//! BFF が扱う認証情報とセッションのモデルを定義する。
//!
//! ## 設計方針
//!
//! - I/O を一切含まない純粋な型のみを配置する
//! - 「トークンが片方だけ存在する」といった不正な状態を型で排除する
//! - トークン文字列はログに出さない（`Debug` 出力をマスクする）
//!
//! ## モジュール構成
//!
//! - [`credential`] - 認証情報ペア（アクセストークン + リフレッシュトークン）
//! - [`session`] - 暗号化 Cookie に保存するセッションレコード
//! - [`error_code`] - エラーページに渡すエラーコード
//! - [`return_to`] - 認証後の戻り先パス
//! - [`error`] - ドメイン層で発生するエラーの定義
//!
//! ## 使用例
//!
//! ```rust
//! use relaygate_domain::{credential::CredentialPair, session::SessionRecord};
//!
//! let pair = CredentialPair::new("access", "refresh", None).unwrap();
//! let record = SessionRecord::logged_in(&pair);
//! assert_eq!(record.credential(), Some(pair));
//! ```

pub mod credential;
pub mod error;
pub mod error_code;
pub mod return_to;
pub mod session;

pub use error::DomainError;

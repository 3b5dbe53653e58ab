//! # 認証ハンドラ
//!
//! ID プロバイダとのハンドシェイクのうち、クライアント側の半分を担う。
//!
//! ## エンドポイント
//!
//! - `GET /api/auth/login` - ID プロバイダの認可エンドポイントへリダイレクト
//! - `GET /api/auth/callback`, `GET /callback` - 会員コードを上流のトークンと交換し、セッションに保存
//! - `POST /api/auth/logout` - ログアウト（JSON 応答）
//! - `GET /api/auth/logout` - ログアウト（`/` へリダイレクト）
//! - `GET /api/auth/me` - 現在のユーザー情報を取得
//!
//! ## フロー
//!
//! ```text
//! login ──▶ ID プロバイダ ──▶ callback ──POST /auth/login──▶ 上流
//!   │                            │
//!   └ auth_return_to を記録       └ セッション保存、auth_return_to を消して戻り先へ
//! ```

use std::sync::Arc;

use crate::{config::SsoConfig, proxy::ForwardingEngine, session::SessionStore};

pub mod callback;
pub mod login;
pub mod logout;
pub mod session;

pub use callback::callback;
pub use login::login;
pub use logout::{logout, logout_redirect};
pub use session::me;

/// ログイン開始エンドポイントのパス
pub const LOGIN_PATH: &str = "/api/auth/login";

/// 認証ハンドラの共有状態
pub struct AuthState {
    pub engine:    Arc<ForwardingEngine>,
    pub sessions:  Arc<SessionStore>,
    pub sso:       SsoConfig,
    pub mock_mode: bool,
}

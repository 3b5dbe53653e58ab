//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュールで re-export し、フラットな API を提供
//! - 転送とリフレッシュは [`ForwardingEngine`](crate::proxy::ForwardingEngine) に委譲し、
//!   ハンドラはセッション Cookie の読み書きとレスポンスの組み立てに集中する
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `auth`: 認証ハンドシェイク（ログイン開始、コールバック、ログアウト、現在ユーザー）
//! - `error_page`: エラー表示
//! - `proxy`: 上流 API へのプロキシ

pub mod auth;
pub mod error_page;
pub mod health;
pub mod proxy;

pub use auth::{AuthState, callback, login, logout, logout_redirect, me};
pub use error_page::error_page;
pub use health::{ReadinessState, health_check, readiness_check};
pub use proxy::{ProxyState, proxy};

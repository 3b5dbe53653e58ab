//! # セッションと認証情報の解決
//!
//! ブラウザが持つ Cookie から認証情報を取り出し、更新結果を Cookie に書き戻す。
//!
//! - [`TokenStrategy`]: トークンをどこに保持し、上流へどう渡すか（起動時に 1 つ選択）
//! - [`SessionStore`] / [`SessionCookies`]: 暗号化セッション Cookie・生トークン Cookie・
//!   戻り先マーカー Cookie の読み書き
//! - [`CredentialResolver`]: リクエストから現在の認証情報ペアを解決する

mod cookies;
mod resolver;
mod strategy;

pub use cookies::{
    ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
    RETURN_TO_COOKIE,
    SESSION_COOKIE,
    SessionCookies,
    SessionStore,
};
pub use resolver::CredentialResolver;
pub use strategy::TokenStrategy;

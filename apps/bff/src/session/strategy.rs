//! トークン保持方式

use strum::{Display, EnumString};

/// トークンの保持・送信方式
///
/// | 方式 | 保持場所 | 上流への送信 |
/// |------|----------|--------------|
/// | `SealedSession` | 暗号化セッション Cookie | `Authorization: Bearer` |
/// | `Bearer` | 生の `access_token` / `refresh_token` Cookie | `Authorization: Bearer` |
/// | `CookieForward` | 生の `access_token` / `refresh_token` Cookie | `Cookie` ヘッダー |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum TokenStrategy {
    #[default]
    SealedSession,
    Bearer,
    CookieForward,
}

impl TokenStrategy {
    /// 暗号化セッション Cookie に保持するか
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::SealedSession)
    }

    /// 上流へ `Cookie` ヘッダーで認証情報を送るか
    pub fn forwards_cookies(&self) -> bool {
        matches!(self, Self::CookieForward)
    }
}

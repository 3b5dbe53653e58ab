//! # エラーコード
//!
//! 認証フローの失敗時にエラーページへ渡すコード。
//! `/error-page?code=<code>` の `code` に入る値の固定列挙。

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// 認証エラーコード
///
/// 失敗の分岐ごとに異なるコードを割り当て、運用者が
/// ID プロバイダの設定ミスと上流の拒否を区別できるようにする。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum AuthErrorCode {
    /// コールバックの `requestType` が `login` でない
    InvalidRequestType,
    /// コールバックに会員コードがない
    MissingMemberCode,
    /// 上流ログインが 200 以外を返した
    LoginFailed,
    /// コールバック処理中の予期しないエラー
    CallbackError,
    /// セッション切れ
    SessionExpired,
    /// 保護ルートへの未認証アクセス
    Unauthorized,
    /// 不明なエラー
    Default,
}

impl AuthErrorCode {
    /// クエリ文字列の値から解釈する
    ///
    /// 未知の値や未指定は [`AuthErrorCode::Default`] になる。
    pub fn from_query(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::Default)
    }

    /// 利用者向けの表示メッセージ
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidRequestType => "不正なリクエストです。",
            Self::MissingMemberCode => "会員情報が不足しています。",
            Self::LoginFailed => "ログインに失敗しました。",
            Self::CallbackError => "認証処理中にエラーが発生しました。",
            Self::SessionExpired => "セッションの有効期限が切れました。",
            Self::Unauthorized => "認証が必要です。",
            Self::Default => "不明なエラーが発生しました。",
        }
    }
}

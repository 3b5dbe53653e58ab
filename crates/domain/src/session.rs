//! # セッションレコード
//!
//! 暗号化 Cookie に保存される値を定義する。
//!
//! JSON 表現は `{accessToken, refreshToken, subjectId, isLoggedIn}`。

use serde::{Deserialize, Serialize};

use crate::credential::{CredentialPair, SubjectId};

/// セッションレコード
///
/// 認証情報ペアに `is_logged_in` フラグを加えたもの。
///
/// # 不変条件
///
/// - `is_logged_in == true` なら両トークンが揃っている
/// - 逆は成り立たなくてもよい（ログアウト処理の途中など）
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token:  Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject_id:    Option<SubjectId>,
    #[serde(default)]
    is_logged_in:  bool,
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("subject_id", &self.subject_id)
            .field("is_logged_in", &self.is_logged_in)
            .finish()
    }
}

impl SessionRecord {
    /// ログイン済みのレコードを作成する
    pub fn logged_in(credential: &CredentialPair) -> Self {
        Self {
            access_token:  Some(credential.access_token().to_string()),
            refresh_token: Some(credential.refresh_token().to_string()),
            subject_id:    credential.subject_id(),
            is_logged_in:  true,
        }
    }

    /// 現在の認証情報を取り出す
    ///
    /// 未ログイン、またはトークンが欠けている場合は `None`。
    pub fn credential(&self) -> Option<CredentialPair> {
        if !self.is_logged_in {
            return None;
        }
        CredentialPair::from_parts(
            self.access_token.as_deref(),
            self.refresh_token.as_deref(),
            self.subject_id,
        )
    }

    /// 認証情報ペアを丸ごと差し替える
    ///
    /// 片方のトークンだけが更新された状態は作らない。
    pub fn replace_credential(&mut self, credential: &CredentialPair) {
        *self = Self {
            subject_id: credential.subject_id().or(self.subject_id),
            ..Self::logged_in(credential)
        };
    }

    pub fn subject_id(&self) -> Option<SubjectId> {
        self.subject_id
    }

    pub fn is_logged_in(&self) -> bool {
        self.is_logged_in
    }
}

//! # 認証情報
//!
//! 上流 API の呼び出しに使うトークンペアを定義する。
//!
//! ## 含まれる型
//!
//! | 型 | 用途 |
//! |---|------|
//! | [`SubjectId`] | ログインユーザーの識別子（ID プロバイダの会員コード） |
//! | [`CredentialPair`] | アクセストークン + リフレッシュトークンの組 |
//! | [`TokenGrant`] | 上流が発行したトークン（ログイン・リフレッシュの応答） |
//!
//! # セキュリティ
//!
//! いずれの型も Debug 出力ではトークンの値をマスクする。

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// サブジェクト ID（値オブジェクト）
///
/// ID プロバイダから渡される会員コード。上流 API へのログイン時に使用する。
///
/// # 使用例
///
/// ```rust
/// use relaygate_domain::credential::SubjectId;
///
/// let id = SubjectId::parse(" 40 ").unwrap();
/// assert_eq!(id.as_i64(), 40);
/// assert!(SubjectId::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct SubjectId(i64);

impl SubjectId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// 文字列からサブジェクト ID をパースする
    ///
    /// 前後の空白は無視する。整数として解釈できない場合は
    /// `DomainError::Validation` を返す。
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        value.trim().parse::<i64>().map(Self).map_err(|_| {
            DomainError::Validation(format!("サブジェクト ID が整数ではありません: {value}"))
        })
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// 認証情報ペア
///
/// 1 つの認証済みセッションに紐づくアクセストークンとリフレッシュトークン。
///
/// # 不変条件
///
/// - アクセストークン・リフレッシュトークンはどちらも空でない
/// - 片方だけのペアは存在しない（[`CredentialPair::from_parts`] は `None` を返す）
/// - 更新は [`CredentialPair::renew`] で両トークンを一度に差し替える
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    access_token:  String,
    refresh_token: String,
    subject_id:    Option<SubjectId>,
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("subject_id", &self.subject_id)
            .finish()
    }
}

impl CredentialPair {
    /// 認証情報ペアを作成する
    ///
    /// # エラー
    ///
    /// いずれかのトークンが空文字列の場合は `DomainError::Validation` を返す。
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        subject_id: Option<SubjectId>,
    ) -> Result<Self, DomainError> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        if access_token.is_empty() {
            return Err(DomainError::Validation(
                "アクセストークンは必須です".to_string(),
            ));
        }
        if refresh_token.is_empty() {
            return Err(DomainError::Validation(
                "リフレッシュトークンは必須です".to_string(),
            ));
        }
        Ok(Self {
            access_token,
            refresh_token,
            subject_id,
        })
    }

    /// 保存されていた断片から認証情報ペアを復元する
    ///
    /// どちらかのトークンが欠けている、または空の場合は `None`（認証情報なし）。
    pub fn from_parts(
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        subject_id: Option<SubjectId>,
    ) -> Option<Self> {
        Self::new(access_token?, refresh_token?, subject_id).ok()
    }

    /// 上流が発行したトークンから新しいセッションの認証情報を作成する
    ///
    /// ログイン応答はリフレッシュトークンを必ず含む必要がある。
    pub fn issue(grant: TokenGrant, subject_id: Option<SubjectId>) -> Result<Self, DomainError> {
        let refresh_token = grant.refresh_token.ok_or_else(|| {
            DomainError::Validation("ログイン応答にリフレッシュトークンがありません".to_string())
        })?;
        Self::new(grant.access_token, refresh_token, subject_id)
    }

    /// リフレッシュ結果を反映した新しいペアを返す
    ///
    /// 両トークンを同時に差し替える。上流がリフレッシュトークンを
    /// ローテーションしなかった場合のみ、既存のリフレッシュトークンをそのまま残す。
    pub fn renew(&self, grant: TokenGrant) -> Self {
        Self {
            access_token:  grant.access_token,
            refresh_token: grant
                .refresh_token
                .unwrap_or_else(|| self.refresh_token.clone()),
            subject_id:    self.subject_id,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn subject_id(&self) -> Option<SubjectId> {
        self.subject_id
    }
}

/// 上流が発行したトークン
///
/// `POST /auth/login` と `POST /auth/refresh` の応答から取り出した値。
/// リフレッシュトークンは省略されうる（ローテーションなし）。
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    access_token:  String,
    refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl TokenGrant {
    /// 発行トークンを作成する
    ///
    /// 空のリフレッシュトークンは「ローテーションなし」として扱う。
    ///
    /// # エラー
    ///
    /// アクセストークンが空の場合は `DomainError::Validation` を返す。
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Result<Self, DomainError> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(DomainError::Validation(
                "アクセストークンは必須です".to_string(),
            ));
        }
        Ok(Self {
            access_token,
            refresh_token: refresh_token.filter(|token| !token.is_empty()),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

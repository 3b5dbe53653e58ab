//! # 戻り先パス
//!
//! 認証完了後にリダイレクトする先を表す値オブジェクト。

use derive_more::Display;

/// 認証後の戻り先パス（値オブジェクト）
///
/// # 不変条件
///
/// - `/` で始まる同一オリジンのパス
/// - `//` で始まるプロトコル相対 URL や、`\` を含むパスは受け付けない
///
/// オープンリダイレクトを防ぐため、条件を満たさない値は
/// [`ReturnTo::parse_or`] で既定値に置き換える。
///
/// # 使用例
///
/// ```rust
/// use relaygate_domain::return_to::ReturnTo;
///
/// let fallback = ReturnTo::root();
/// assert_eq!(ReturnTo::parse_or(Some("/dashboard"), &fallback).as_str(), "/dashboard");
/// assert_eq!(ReturnTo::parse_or(Some("https://evil.example"), &fallback).as_str(), "/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct ReturnTo(String);

impl ReturnTo {
    /// 戻り先として安全なパスなら作成する
    pub fn parse(value: &str) -> Option<Self> {
        let is_safe = value.starts_with('/')
            && !value.starts_with("//")
            && !value.contains('\\')
            && !value.chars().any(char::is_control);
        is_safe.then(|| Self(value.to_string()))
    }

    /// パースに失敗したら既定値を使う
    pub fn parse_or(value: Option<&str>, fallback: &ReturnTo) -> Self {
        value
            .and_then(Self::parse)
            .unwrap_or_else(|| fallback.clone())
    }

    /// ルートパス `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

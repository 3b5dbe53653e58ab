//! # ドメイン層エラー定義
//!
//! 値オブジェクトの生成時に検出される不正な入力を表現するエラー型。

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ハンドラ層でこのエラーを受け取り、エラーページへのリダイレクトや
/// HTTP レスポンスに変換する。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がドメインのルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - トークンが空文字列
    /// - サブジェクト ID が整数として解釈できない
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}

//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! BFF 自身が生成するエラーのレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は BFF の責務（shared に axum 依存を入れない）
//! - よく使うエラー種別は便利コンストラクタで提供し、URI のハードコードを排除
//!
//! 上流 API が返したエラー本文はこの型に詰め替えず、そのまま透過する。

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://relaygate.example.com/errors";

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"upstream-timeout"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title: title.into(),
            status,
            detail: detail.into(),
        }
    }

    /// 502 Bad Gateway（上流に接続できない、または上流が 5xx を返した）
    pub fn upstream_unavailable(detail: impl Into<String>) -> Self {
        Self::new("upstream-unavailable", "Bad Gateway", 502, detail)
    }

    /// 504 Gateway Timeout（上流呼び出しがタイムアウトした）
    pub fn upstream_timeout() -> Self {
        Self::new(
            "upstream-timeout",
            "Gateway Timeout",
            504,
            "上流サービスの応答がタイムアウトしました",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_で全フィールドが正しく設定される() {
        let error = ErrorResponse::new("custom-error", "Custom Error", 418, "カスタムエラー");

        assert_eq!(
            error.error_type,
            "https://relaygate.example.com/errors/custom-error"
        );
        assert_eq!(error.title, "Custom Error");
        assert_eq!(error.status, 418);
        assert_eq!(error.detail, "カスタムエラー");
    }

    #[test]
    fn test_upstream_timeout_が504を返す() {
        let error = ErrorResponse::upstream_timeout();

        assert_eq!(
            error.error_type,
            "https://relaygate.example.com/errors/upstream-timeout"
        );
        assert_eq!(error.status, 504);
    }

    #[test]
    fn test_jsonシリアライズでtypeフィールド名が正しい() {
        let error = ErrorResponse::upstream_unavailable("接続できません");
        let json = serde_json::to_value(&error).unwrap();

        // serde(rename = "type") で `error_type` → `type` に変換される
        assert_eq!(
            json,
            serde_json::json!({
                "type": "https://relaygate.example.com/errors/upstream-unavailable",
                "title": "Bad Gateway",
                "status": 502,
                "detail": "接続できません"
            })
        );
    }
}

//! # ヘルスチェックのレスポンス型
//!
//! - Liveness（`/health`）: プロセスが応答できるか。依存先は見ない
//! - Readiness（`/health/ready`）: 依存先（上流 API）に到達できるか
//!
//! `checks` は名前順に並ぶ（`BTreeMap`）ので、JSON 出力が安定する。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Liveness のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    /// 常に `"healthy"`
    pub status:  String,
    /// パッケージのバージョン
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            status:  "healthy".to_string(),
            version: version.into(),
        }
    }
}

/// 個別チェックの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CheckStatus {
    Ok,
    Error,
}

/// Readiness 全体の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ReadinessStatus {
    Ready,
    NotReady,
}

/// Readiness のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReadinessResponse {
    pub status: ReadinessStatus,
    /// チェック名 → 結果
    pub checks: BTreeMap<String, CheckStatus>,
}

impl ReadinessResponse {
    /// 個別チェックの結果から組み立てる
    ///
    /// すべて `Ok` のときだけ `Ready`。チェックが 1 つもなければ `Ready`。
    pub fn from_checks<I, K>(checks: I) -> Self
    where
        I: IntoIterator<Item = (K, CheckStatus)>,
        K: Into<String>,
    {
        let checks: BTreeMap<String, CheckStatus> =
            checks.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let status = if checks.values().all(|s| *s == CheckStatus::Ok) {
            ReadinessStatus::Ready
        } else {
            ReadinessStatus::NotReady
        };
        Self { status, checks }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ReadinessStatus::Ready
    }
}

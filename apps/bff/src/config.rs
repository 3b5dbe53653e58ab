//! # BFF 設定
//!
//! 環境変数から BFF サーバーの設定を読み込む。
//!
//! 読み込みは起動時の 1 回だけ。不正な値はフォールバックせず起動エラーにする。
//! 値の解釈は [`BffConfig::from_lookup`] に集約し、プロセスの環境変数に
//! 触れずにテストできるようにしている。

use std::{env, time::Duration};

use axum_extra::extract::cookie::Key;
use thiserror::Error;
use url::Url;

use crate::{middleware::ProtectedRoutes, session::TokenStrategy};

/// 上流呼び出しのデフォルトタイムアウト（ミリ秒）
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

/// セッション Cookie のデフォルト有効期間（7 日）
const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// セッション秘密鍵の最小長（バイト）
const MIN_SESSION_SECRET_LEN: usize = 32;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です（{value:?}）: {reason}")]
    Invalid {
        name:   &'static str,
        value:  String,
        reason: String,
    },

    #[error("SESSION_SECRET は {MIN_SESSION_SECRET_LEN} バイト以上である必要があります")]
    SessionSecretTooShort,

    #[error("DEV_AUTH_ENABLED=true はリリースビルドでは使用できません")]
    DevAuthInRelease,
}

/// BFF サーバーの設定
#[derive(Debug, Clone)]
pub struct BffConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// 上流 API のベース URL（末尾の `/` は除去済み）
    pub upstream_url: String,
    /// 上流呼び出しのタイムアウト
    pub upstream_timeout: Duration,
    /// ID プロバイダの設定
    pub sso: SsoConfig,
    /// セッション Cookie の設定
    pub session: SessionSettings,
    /// ログイン必須のパス
    pub protected_routes: ProtectedRoutes,
    /// トークンの保持・送信方式
    pub token_strategy: TokenStrategy,
    /// 上流を呼ばずにモックレスポンスを返す
    pub mock_mode: bool,
    /// 開発用ログイン（DevAuth）の有効化
    ///
    /// `DEV_AUTH_ENABLED=true` のときに有効になる。
    /// 本番環境では絶対に有効にしないこと。
    pub dev_auth_enabled: bool,
}

/// ID プロバイダの設定
#[derive(Debug, Clone)]
pub struct SsoConfig {
    /// ID プロバイダのベース URL
    pub base_url:     Url,
    /// クライアント ID
    pub client_id:    String,
    /// 認可後に戻ってくるコールバック URL
    pub redirect_uri: String,
}

/// セッション Cookie の設定
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// 暗号化鍵の元になる秘密値
    pub secret:  SessionSecret,
    /// セッション Cookie の有効期間
    pub max_age: time::Duration,
    /// `Secure` 属性を付けるか（`ENV=production`）
    pub secure:  bool,
}

/// セッション秘密値
///
/// # 不変条件
///
/// - 32 バイト以上
///
/// # セキュリティ
///
/// Debug 出力では値をマスクする。
#[derive(Clone)]
pub struct SessionSecret(String);

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionSecret").field(&"[REDACTED]").finish()
    }
}

impl SessionSecret {
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::SessionSecretTooShort);
        }
        Ok(Self(value))
    }

    /// Cookie 暗号化鍵を導出する
    pub fn derive_key(&self) -> Key {
        Key::derive_from(self.0.as_bytes())
    }
}

impl BffConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列の値は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let dev_auth_enabled = parse_flag(get("DEV_AUTH_ENABLED").as_deref());

        // リリースビルドで DevAuth が有効な場合は起動させない
        #[cfg(not(debug_assertions))]
        if dev_auth_enabled {
            return Err(ConfigError::DevAuthInRelease);
        }

        let port = get("BFF_PORT").ok_or(ConfigError::Missing("BFF_PORT"))?;
        let upstream_url = get("UPSTREAM_URL").ok_or(ConfigError::Missing("UPSTREAM_URL"))?;
        let secret = get("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;

        Ok(Self {
            host: get("BFF_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_number("BFF_PORT", &port)?,
            upstream_url: parse_base_url("UPSTREAM_URL", &upstream_url)?,
            upstream_timeout: Duration::from_millis(match get("UPSTREAM_TIMEOUT_MS") {
                Some(value) => parse_number("UPSTREAM_TIMEOUT_MS", &value)?,
                None => DEFAULT_UPSTREAM_TIMEOUT_MS,
            }),
            sso: SsoConfig {
                base_url:     parse_url(
                    "SSO_URL",
                    &get("SSO_URL").unwrap_or_else(|| "http://localhost:9000".to_string()),
                )?,
                client_id:    get("SSO_CLIENT_ID").unwrap_or_else(|| "your-client-id".to_string()),
                redirect_uri: get("SSO_REDIRECT_URI")
                    .unwrap_or_else(|| "http://localhost:3000/api/auth/callback".to_string()),
            },
            session: SessionSettings {
                secret:  SessionSecret::new(secret)?,
                max_age: time::Duration::seconds(match get("SESSION_MAX_AGE_SECS") {
                    Some(value) => parse_number("SESSION_MAX_AGE_SECS", &value)?,
                    None => DEFAULT_SESSION_MAX_AGE_SECS,
                }),
                secure:  get("ENV").as_deref() == Some("production"),
            },
            protected_routes: get("PROTECTED_ROUTES")
                .map(|v| ProtectedRoutes::parse(&v))
                .unwrap_or_default(),
            token_strategy: match get("TOKEN_STRATEGY") {
                Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                    name: "TOKEN_STRATEGY",
                    value,
                    reason: "sealed-session / bearer / cookie-forward のいずれかを指定してください"
                        .to_string(),
                })?,
                None => TokenStrategy::default(),
            },
            mock_mode: parse_flag(get("MOCK_MODE").as_deref()),
            dev_auth_enabled,
        })
    }
}

/// `true`（大文字小文字を区別しない）のときだけ有効とみなす
fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|e| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// ベース URL を検証し、末尾の `/` を除去した文字列で返す
fn parse_base_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    parse_url(name, value)?;
    Ok(value.trim().trim_end_matches('/').to_string())
}

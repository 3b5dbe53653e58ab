//! # セッション Cookie
//!
//! 暗号化セッション Cookie（`PrivateCookieJar`、AES-GCM）と、平文 Cookie
//! （生トークン・戻り先マーカー）をまとめて扱う。
//!
//! 読み取りは状態を変更しない。書き込みは差分としてレスポンスの `Set-Cookie` に乗る。

use std::convert::Infallible;

use axum::{
    http::HeaderMap,
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::{
    CookieJar,
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use relaygate_domain::{
    credential::CredentialPair,
    return_to::ReturnTo,
    session::SessionRecord,
};
use relaygate_shared::event_log::error;

use super::TokenStrategy;
use crate::config::SessionSettings;

/// 暗号化セッション Cookie 名
pub const SESSION_COOKIE: &str = "app_session";
/// 生アクセストークン Cookie 名
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// 生リフレッシュトークン Cookie 名
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
/// 戻り先マーカー Cookie 名
pub const RETURN_TO_COOKIE: &str = "auth_return_to";

/// 戻り先マーカーの有効期間（5 分）
const RETURN_TO_MAX_AGE: time::Duration = time::Duration::minutes(5);

/// Cookie の属性ポリシー
#[derive(Debug, Clone, Copy)]
struct CookiePolicy {
    strategy: TokenStrategy,
    max_age:  time::Duration,
    secure:   bool,
}

/// セッションストア
///
/// リクエストヘッダーから [`SessionCookies`] を開く。鍵と属性だけを保持し、
/// サーバー側に状態は持たない。
#[derive(Clone)]
pub struct SessionStore {
    key:    Key,
    policy: CookiePolicy,
}

impl SessionStore {
    pub fn new(settings: &SessionSettings, strategy: TokenStrategy) -> Self {
        Self {
            key:    settings.secret.derive_key(),
            policy: CookiePolicy {
                strategy,
                max_age: settings.max_age,
                secure: settings.secure,
            },
        }
    }

    pub fn strategy(&self) -> TokenStrategy {
        self.policy.strategy
    }

    /// リクエストヘッダーの Cookie を読み込む
    pub fn open(&self, headers: &HeaderMap) -> SessionCookies {
        SessionCookies {
            sealed: PrivateCookieJar::from_headers(headers, self.key.clone()),
            plain:  CookieJar::from_headers(headers),
            policy: self.policy,
        }
    }
}

/// 1 リクエスト分のセッション Cookie
///
/// 変更系メソッドは `self` を消費して新しい値を返す（`CookieJar` と同じ流儀）。
/// ハンドラはレスポンスにこの値を含めて返すことで変更を確定させる。
pub struct SessionCookies {
    sealed: PrivateCookieJar,
    plain:  CookieJar,
    policy: CookiePolicy,
}

impl SessionCookies {
    /// 現在のセッションレコード
    ///
    /// 復号・パースに失敗した Cookie は存在しないものとして扱う。
    pub fn record(&self) -> SessionRecord {
        if self.policy.strategy.is_sealed() {
            self.sealed
                .get(SESSION_COOKIE)
                .and_then(|cookie| match serde_json::from_str(cookie.value()) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!(
                            error.category = error::category::INFRASTRUCTURE,
                            error.kind = error::kind::SESSION,
                            "セッション Cookie を解釈できません: {}",
                            e
                        );
                        None
                    }
                })
                .unwrap_or_default()
        } else {
            CredentialPair::from_parts(
                self.plain.get(ACCESS_TOKEN_COOKIE).map(Cookie::value),
                self.plain.get(REFRESH_TOKEN_COOKIE).map(Cookie::value),
                None,
            )
            .map(|pair| SessionRecord::logged_in(&pair))
            .unwrap_or_default()
        }
    }

    /// 現在の認証情報ペア
    pub fn credential(&self) -> Option<CredentialPair> {
        self.record().credential()
    }

    /// 認証情報ペアを保存する
    ///
    /// 両トークンを 1 つの書き込みで差し替える。
    pub fn persist(self, credential: &CredentialPair) -> Self {
        if self.policy.strategy.is_sealed() {
            let mut record = self.record();
            record.replace_credential(credential);
            self.write_record(&record)
        } else {
            let access = self.token_cookie(ACCESS_TOKEN_COOKIE, credential.access_token());
            let refresh = self.token_cookie(REFRESH_TOKEN_COOKIE, credential.refresh_token());
            Self {
                plain: self.plain.add(access).add(refresh),
                ..self
            }
        }
    }

    /// ローカルの認証状態をすべて破棄する
    pub fn destroy(self) -> Self {
        Self {
            sealed: self.sealed.remove(removal_cookie(SESSION_COOKIE)),
            plain: self
                .plain
                .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
                .remove(removal_cookie(REFRESH_TOKEN_COOKIE)),
            ..self
        }
    }

    /// 戻り先マーカー
    ///
    /// 安全でないパスが入っていた場合は `None`。
    pub fn return_to(&self) -> Option<ReturnTo> {
        self.plain
            .get(RETURN_TO_COOKIE)
            .and_then(|cookie| ReturnTo::parse(cookie.value()))
    }

    /// 戻り先マーカーを書き込む（5 分間有効）
    pub fn remember_return_to(self, return_to: &ReturnTo) -> Self {
        let cookie = Cookie::build((RETURN_TO_COOKIE, return_to.as_str().to_string()))
            .path("/")
            .max_age(RETURN_TO_MAX_AGE)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.policy.secure)
            .build();
        Self {
            plain: self.plain.add(cookie),
            ..self
        }
    }

    /// 戻り先マーカーを削除する
    pub fn forget_return_to(self) -> Self {
        Self {
            plain: self.plain.remove(removal_cookie(RETURN_TO_COOKIE)),
            ..self
        }
    }

    fn write_record(self, record: &SessionRecord) -> Self {
        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::SESSION,
                    "セッションレコードの直列化に失敗: {}",
                    e
                );
                return self;
            }
        };
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .max_age(self.policy.max_age)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.policy.secure)
            .build();
        Self {
            sealed: self.sealed.add(cookie),
            ..self
        }
    }

    fn token_cookie(&self, name: &'static str, value: &str) -> Cookie<'static> {
        Cookie::build((name, value.to_string()))
            .path("/")
            .max_age(self.policy.max_age)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.policy.secure)
            .build()
    }
}

impl IntoResponseParts for SessionCookies {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let res = self.sealed.into_response_parts(res)?;
        self.plain.into_response_parts(res)
    }
}

/// 削除用 Cookie（属性は発行時と同じ `Path=/`）
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

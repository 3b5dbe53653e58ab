//! # 発行トークンの取り出し
//!
//! 上流の `POST /auth/login` / `POST /auth/refresh` は、トークンを JSON 本文
//! （`access_token` / `refresh_token`）か `Set-Cookie` ヘッダーで返す。
//! 片方を本文、もう片方を `Set-Cookie` で返す上流もあるので、項目ごとに両方を見る。

use axum::http::{HeaderMap, header::SET_COOKIE};
use axum_extra::extract::cookie::Cookie;
use relaygate_domain::credential::TokenGrant;
use serde::Deserialize;

use super::UpstreamResponse;
use crate::session::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

#[derive(Debug, Default, Deserialize)]
struct TokenBody {
    #[serde(alias = "accessToken")]
    access_token:  Option<String>,
    #[serde(alias = "refreshToken")]
    refresh_token: Option<String>,
}

/// 応答から発行トークンを取り出す
///
/// 項目ごとに JSON 本文を優先し、なければ `Set-Cookie` を見る。
/// アクセストークンがどちらにも見つからなければ `None`。
pub fn parse_token_grant(response: &UpstreamResponse) -> Option<TokenGrant> {
    let body: TokenBody = response.json().unwrap_or_default();
    let cookies = from_set_cookie(&response.headers);

    let access_token = non_empty(body.access_token).or(cookies.access_token)?;
    let refresh_token = non_empty(body.refresh_token).or(cookies.refresh_token);
    TokenGrant::new(access_token, refresh_token).ok()
}

fn non_empty(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

fn from_set_cookie(headers: &HeaderMap) -> TokenBody {
    let mut tokens = TokenBody::default();

    for value in headers.get_all(SET_COOKIE) {
        let Some(cookie) = value.to_str().ok().and_then(|v| Cookie::parse(v).ok()) else {
            continue;
        };
        let token = non_empty(Some(cookie.value().to_string()));
        match cookie.name() {
            ACCESS_TOKEN_COOKIE => tokens.access_token = token,
            REFRESH_TOKEN_COOKIE => tokens.refresh_token = token,
            _ => {}
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    use super::*;

    fn response(body: &str, set_cookies: &[&str]) -> UpstreamResponse {
        let mut headers = HeaderMap::new();
        for cookie in set_cookies {
            headers.append(SET_COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_json本文からトークンを取り出す() {
        let grant = parse_token_grant(&response(
            r#"{"access_token":"a","refresh_token":"r"}"#,
            &[],
        ))
        .unwrap();

        assert_eq!(grant.access_token(), "a");
        assert_eq!(grant.refresh_token(), Some("r"));
    }

    #[test]
    fn test_キャメルケースの本文も受け付ける() {
        let grant = parse_token_grant(&response(r#"{"accessToken":"a"}"#, &[])).unwrap();

        assert_eq!(grant.access_token(), "a");
        assert_eq!(grant.refresh_token(), None);
    }

    #[test]
    fn test_set_cookieからトークンを取り出す() {
        let grant = parse_token_grant(&response(
            "",
            &[
                "access_token=ca; Path=/; HttpOnly",
                "refresh_token=cr; Path=/; HttpOnly",
                "other=x",
            ],
        ))
        .unwrap();

        assert_eq!(grant.access_token(), "ca");
        assert_eq!(grant.refresh_token(), Some("cr"));
    }

    #[test]
    fn test_本文とset_cookieに分かれたトークンを組み合わせる() {
        let grant = parse_token_grant(&response(
            r#"{"access_token":"new-a"}"#,
            &["refresh_token=rotated-r; Path=/; HttpOnly"],
        ))
        .unwrap();

        assert_eq!(grant.access_token(), "new-a");
        assert_eq!(grant.refresh_token(), Some("rotated-r"));
    }

    #[test]
    fn test_本文にあるトークンはset_cookieより優先する() {
        let grant = parse_token_grant(&response(
            r#"{"access_token":"body-a","refresh_token":"body-r"}"#,
            &["access_token=cookie-a", "refresh_token=cookie-r"],
        ))
        .unwrap();

        assert_eq!(grant.access_token(), "body-a");
        assert_eq!(grant.refresh_token(), Some("body-r"));
    }

    #[test]
    fn test_アクセストークンがなければnone() {
        assert_eq!(parse_token_grant(&response(r#"{"refresh_token":"r"}"#, &[])), None);
        assert_eq!(parse_token_grant(&response("not json", &["refresh_token=r"])), None);
    }
}

//! # 上流 API クライアント
//!
//! BFF から上流 API への通信を担当する。
//!
//! - [`UpstreamTransport`]: 1 リクエストを送って生の応答を受け取る（reqwest 実装とテスト用スタブ）
//! - [`UpstreamClientFactory`]: 認証情報を付与したクライアントを組み立てる
//! - [`parse_token_grant`]: ログイン・リフレッシュ応答からトークンを取り出す

mod factory;
mod token_grant;
mod upstream;

pub use factory::{UpstreamClient, UpstreamClientFactory};
pub use token_grant::parse_token_grant;
pub use upstream::{
    HttpUpstreamTransport,
    UpstreamError,
    UpstreamRequest,
    UpstreamResponse,
    UpstreamTransport,
};

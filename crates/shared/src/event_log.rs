//! # 構造化ログのフィールド規約
//!
//! 認証ハンドシェイク・トークン更新・ルートガードの出来事は [`log_business_event!`] で、
//! 障害は `tracing::warn!` / `tracing::error!` に `error.category` と `error.kind` を
//! 付けて出力する。値はこのモジュールの定数だけを使う。
//!
//! キーはドット区切りで、JSON 出力ではそのままフラットなキーになる
//! （例: `jq 'select(.["event.action"] == "proxy.token_refresh_failed")'`）。
//!
//! トークンの値はどのフィールドにも載せない。

/// 業務イベントを INFO で出力する
///
/// `event.kind = "business_event"` を先頭に付ける。呼び出し側は
/// `event.category` / `event.action` / `event.result` を必ず渡し、
/// 必要に応じて `event.subject_id` や `event.reason` を足す。
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const AUTH: &str = "auth";
        pub const PROXY: &str = "proxy";
    }

    /// イベントアクション
    pub mod action {
        // 認証
        pub const LOGIN_STARTED: &str = "auth.login_started";
        pub const LOGIN_SUCCESS: &str = "auth.login_success";
        pub const LOGIN_FAILURE: &str = "auth.login_failure";
        pub const LOGOUT: &str = "auth.logout";

        // トークン更新
        pub const TOKEN_REFRESHED: &str = "proxy.token_refreshed";
        pub const TOKEN_REFRESH_FAILED: &str = "proxy.token_refresh_failed";

        // ルートガード
        pub const ROUTE_DIVERTED: &str = "auth.route_diverted";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（セッション Cookie の読み書き）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（上流 API）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const SESSION: &str = "session";
        pub const INTERNAL: &str = "internal";
        pub const UPSTREAM_TIMEOUT: &str = "upstream_timeout";
        pub const UPSTREAM_UNAVAILABLE: &str = "upstream_unavailable";
        pub const TOKEN_REFRESH: &str = "token_refresh";
        pub const UPSTREAM_LOGOUT: &str = "upstream_logout";
    }
}

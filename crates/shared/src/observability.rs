//! # トレーシングと Request ID
//!
//! - `LOG_FORMAT`（`json` / `pretty`）と `RUST_LOG` からサブスクライバーを組み立てる
//! - Request ID は UUID v7 で採番し、`x-request-id` ヘッダーで受け渡す
//! - リクエストスパンには `request_id` を入れ、処理中のログすべてに付与する

use std::str::FromStr;

/// Request ID を運ぶ HTTP ヘッダー名
///
/// 受信リクエスト・レスポンス・上流への転送リクエストで共通に使う。
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_LOG_FILTER: &str = "info,relaygate=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 イベント 1 行の JSON（本番向け）
    Json,
    /// 人間向けの整形出力（開発向け）
    #[default]
    Pretty,
}

/// 未知の `LOG_FORMAT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLogFormat(pub String);

impl std::fmt::Display for UnknownLogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown LOG_FORMAT={:?}", self.0)
    }
}

impl std::error::Error for UnknownLogFormat {}

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(UnknownLogFormat(s.to_string())),
        }
    }
}

impl LogFormat {
    /// `LOG_FORMAT` を読む
    ///
    /// 不正な値は `Pretty` に倒す。サブスクライバー初期化前なので警告は stderr に出す。
    pub fn from_env() -> Self {
        let Ok(value) = std::env::var("LOG_FORMAT") else {
            return Self::default();
        };
        value.parse().unwrap_or_else(|e: UnknownLogFormat| {
            eprintln!("WARNING: {e}, falling back to pretty");
            Self::default()
        })
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// サービス名（起動時の `app` スパンに載せる）
    pub service_name:   String,
    pub log_format:     LogFormat,
    /// `RUST_LOG` が未設定のときのフィルタ
    pub default_filter: String,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// `LOG_FORMAT` から設定を作る
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }
}

/// グローバルサブスクライバーを設定する
///
/// JSON ではイベントのフィールドをトップレベルに展開し、現在のスパン
/// （`request_id` を含む）だけを `span` として出力する。
#[cfg(feature = "observability")]
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let output = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
}

/// UUID v7 の Request ID を採番する `MakeRequestId`
///
/// 時刻順に並ぶため、ログを Request ID で並べるとおおむね受信順になる。
#[cfg(feature = "observability")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

#[cfg(feature = "observability")]
impl tower_http::request_id::MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(
        &mut self,
        _request: &http::Request<B>,
    ) -> Option<tower_http::request_id::RequestId> {
        http::HeaderValue::from_str(&uuid::Uuid::now_v7().to_string())
            .ok()
            .map(tower_http::request_id::RequestId::new)
    }
}

/// `TraceLayer::make_span_with` 用のリクエストスパン
///
/// パスだけを記録し、クエリ文字列は載せない。
#[cfg(feature = "observability")]
pub fn make_request_span<B>(request: &http::Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

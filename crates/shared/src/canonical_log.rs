//! # Canonical Log Line
//!
//! 1 リクエストにつき 1 行、完了時にサマリログを出力する tower Layer。
//!
//! TraceLayer のスパン内に置くので `request_id` は自動的に付く。
//! ハンドラがレスポンスの extensions に [`UpstreamSummary`] を入れていれば、
//! 上流呼び出しの結果（最終ステータス・試行回数・リフレッシュ有無）も同じ行に載る。
//!
//! | 結果 | レベル |
//! |------|--------|
//! | 5xx | WARN |
//! | それ以外 | INFO |
//! | Service エラー | ERROR |
//!
//! `/health` 配下は出力しない。

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use http::{Request, Response};
use tower::{Layer, Service};
use tracing::Level;

/// 上流呼び出しの要約
///
/// プロキシハンドラがレスポンスの extensions に入れる。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpstreamSummary {
    /// 最終的な上流のステータス（呼び出し自体が失敗した場合は `None`）
    pub status:    Option<u16>,
    /// 上流への送信回数（リフレッシュ呼び出しは含まない）
    pub attempts:  u8,
    /// トークンをリフレッシュしたか
    pub refreshed: bool,
}

fn is_excluded(path: &str) -> bool {
    path == "/health" || path.starts_with("/health/")
}

/// Canonical Log Line を出力する Layer
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalLogLineLayer;

impl<S> Layer<S> for CanonicalLogLineLayer {
    type Service = CanonicalLogLine<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CanonicalLogLine { inner }
    }
}

/// [`CanonicalLogLineLayer`] の Service
#[derive(Clone, Debug)]
pub struct CanonicalLogLine<S> {
    inner: S,
}

/// 完了時に出力する内容
struct Line {
    method:     http::Method,
    path:       String,
    started_at: Instant,
}

macro_rules! emit_line {
    ($level:expr, $line:expr, $status:expr, $latency_ms:expr, $upstream:expr) => {
        tracing::event!(
            $level,
            log.r#type = "canonical",
            http.method = %$line.method,
            http.path = %$line.path,
            http.status_code = $status,
            http.latency_ms = $latency_ms,
            upstream.status = $upstream.and_then(|u: UpstreamSummary| u.status),
            upstream.attempts = $upstream.map(|u: UpstreamSummary| u.attempts),
            upstream.refreshed = $upstream.map(|u: UpstreamSummary| u.refreshed),
            "リクエスト完了"
        )
    };
}

impl Line {
    fn finish<B, E: std::fmt::Display>(&self, result: &Result<Response<B>, E>) {
        let latency_ms = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    log.r#type = "canonical",
                    http.method = %self.method,
                    http.path = %self.path,
                    http.latency_ms = latency_ms,
                    error.message = %err,
                    "リクエスト処理エラー"
                );
                return;
            }
        };

        let status = response.status().as_u16();
        let upstream = response.extensions().get::<UpstreamSummary>().copied();
        if response.status().is_server_error() {
            emit_line!(Level::WARN, self, status, latency_ms, upstream);
        } else {
            emit_line!(Level::INFO, self, status, latency_ms, upstream);
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CanonicalLogLine<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // poll_ready 済みの inner を使い、手元には clone を残す
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        // クエリ文字列はトークンを含みうるので記録しない
        let path = request.uri().path().to_string();
        if is_excluded(&path) {
            return Box::pin(inner.call(request));
        }

        let line = Line {
            method: request.method().clone(),
            path,
            started_at: Instant::now(),
        };
        Box::pin(async move {
            let result = inner.call(request).await;
            line.finish(&result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        io,
        sync::{Arc, Mutex},
    };

    use http::StatusCode;
    use serde_json::Value;
    use tower::service_fn;

    use super::*;

    /// JSON ログを溜めるバッファ
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn lines(&self) -> Vec<Value> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn capture() -> (tracing::subscriber::DefaultGuard, Captured) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_writer(move || writer.clone())
            .finish();
        (tracing::subscriber::set_default(subscriber), captured)
    }

    fn responding(
        status: StatusCode,
        upstream: Option<UpstreamSummary>,
    ) -> impl Service<
        Request<()>,
        Response = Response<()>,
        Error = Infallible,
        Future = impl Future<Output = Result<Response<()>, Infallible>> + Send,
    > + Clone
    + Send
    + 'static {
        service_fn(move |_request: Request<()>| async move {
            let mut response = Response::builder().status(status).body(()).unwrap();
            if let Some(summary) = upstream {
                response.extensions_mut().insert(summary);
            }
            Ok::<_, Infallible>(response)
        })
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    #[tokio::test]
    async fn test_完了時にinfoで1行出力しクエリ文字列は記録しない() {
        let (_guard, captured) = capture();
        let mut sut = CanonicalLogLineLayer.layer(responding(StatusCode::OK, None));

        sut.call(get("/api/posts?token=secret")).await.unwrap();

        let lines = captured.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[0]["log.type"], "canonical");
        assert_eq!(lines[0]["http.method"], "GET");
        assert_eq!(lines[0]["http.path"], "/api/posts");
        assert_eq!(lines[0]["http.status_code"], 200);
        assert!(lines[0]["http.latency_ms"].is_u64());
        assert!(lines[0].get("upstream.status").is_none());
    }

    #[tokio::test]
    async fn test_上流の要約が同じ行に載る() {
        let (_guard, captured) = capture();
        let summary = UpstreamSummary {
            status:    Some(200),
            attempts:  2,
            refreshed: true,
        };
        let mut sut = CanonicalLogLineLayer.layer(responding(StatusCode::OK, Some(summary)));

        sut.call(get("/api/posts")).await.unwrap();

        let line = &captured.lines()[0];
        assert_eq!(line["upstream.status"], 200);
        assert_eq!(line["upstream.attempts"], 2);
        assert_eq!(line["upstream.refreshed"], true);
    }

    #[tokio::test]
    async fn test_5xxはwarnで出力される() {
        let (_guard, captured) = capture();
        let mut sut = CanonicalLogLineLayer.layer(responding(StatusCode::BAD_GATEWAY, None));

        sut.call(get("/api/posts")).await.unwrap();

        let line = &captured.lines()[0];
        assert_eq!(line["level"], "WARN");
        assert_eq!(line["http.status_code"], 502);
    }

    #[tokio::test]
    async fn test_health配下は出力しない() {
        let (_guard, captured) = capture();
        let mut sut = CanonicalLogLineLayer.layer(responding(StatusCode::OK, None));

        sut.call(get("/health")).await.unwrap();
        sut.call(get("/health/ready")).await.unwrap();
        sut.call(get("/healthz")).await.unwrap();

        let lines = captured.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["http.path"], "/healthz");
    }

    #[tokio::test]
    async fn test_serviceエラーはerrorで出力される() {
        let (_guard, captured) = capture();
        let mut sut = CanonicalLogLineLayer.layer(service_fn(|_request: Request<()>| async {
            Err::<Response<()>, _>("handler exploded".to_string())
        }));

        assert!(sut.call(get("/api/posts")).await.is_err());

        let line = &captured.lines()[0];
        assert_eq!(line["level"], "ERROR");
        assert_eq!(line["error.message"], "handler exploded");
    }
}

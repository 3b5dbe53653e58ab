//! # Relaygate BFF (Backend for Frontend) サーバー
//!
//! ブラウザと上流 API の間に立つエッジ層。
//!
//! ## 役割
//!
//! - **セッション管理**: アクセス・リフレッシュトークンを暗号化 Cookie に保持
//! - **認証付きプロキシ**: `/api/*` を上流へ転送し、401 なら単一実行のリフレッシュ後に 1 回だけ再送
//! - **ルートガード**: 保護ルートへの未認証アクセスを再認証フローへ迂回
//! - **認証ハンドシェイク**: ID プロバイダへのリダイレクトとコールバック処理
//!
//! ## アーキテクチャ
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Browser    │────▶│     BFF      │────▶│ Upstream API │
//! │              │     │  port: 13000 │     │              │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                                          ▲
//!        ▼                                          │
//! ┌──────────────┐                                  │
//! │ ID Provider  │──── callback (memberCd) ─────────┘
//! └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `BFF_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `BFF_PORT` | **Yes** | ポート番号 |
//! | `UPSTREAM_URL` | **Yes** | 上流 API のベース URL |
//! | `UPSTREAM_TIMEOUT_MS` | No | 上流呼び出しのタイムアウト（デフォルト: `10000`） |
//! | `SSO_URL` / `SSO_CLIENT_ID` / `SSO_REDIRECT_URI` | No | ID プロバイダの設定 |
//! | `SESSION_SECRET` | **Yes** | セッション Cookie の暗号化鍵（32 バイト以上） |
//! | `SESSION_MAX_AGE_SECS` | No | セッション Cookie の有効期間（デフォルト: 7 日） |
//! | `PROTECTED_ROUTES` | No | ログイン必須のパス（カンマ区切り、デフォルト: `/dashboard,/mypage`） |
//! | `TOKEN_STRATEGY` | No | `sealed-session` / `bearer` / `cookie-forward` |
//! | `MOCK_MODE` | No | 上流を呼ばずにモック応答を返す（`true` で有効） |
//! | `ENV` | No | `production` で Cookie に `Secure` 属性を付与 |
//! | `DEV_AUTH_ENABLED` | No | 開発用ログインの有効化（`true` で有効） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（.env ファイルを使用）
//! cargo run -p relaygate-bff
//!
//! # 本番環境（環境変数を直接指定）
//! BFF_PORT=3000 UPSTREAM_URL=http://... SESSION_SECRET=... cargo run -p relaygate-bff --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use relaygate_bff::{app_builder::build_app, client::HttpUpstreamTransport, config::BffConfig};
use relaygate_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// BFF サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. ルーターの構築
/// 5. HTTP サーバーの起動（停止シグナルで処理中のリクエストを待って終了）
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("bff");
    init_tracing(&tracing_config).context("トレーシングの初期化に失敗しました")?;
    let _tracing_guard =
        tracing::info_span!("app", service = %tracing_config.service_name).entered();

    let config = BffConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        upstream = %config.upstream_url,
        token_strategy = %config.token_strategy,
        mock_mode = config.mock_mode,
        "BFF サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    if config.mock_mode {
        tracing::warn!("モックモードが有効です。上流 API は呼び出されません");
    }
    #[cfg(feature = "dev-auth")]
    if config.dev_auth_enabled {
        tracing::warn!("========================================");
        tracing::warn!("⚠️  DevAuth が有効です！");
        tracing::warn!("   本番環境では絶対に有効にしないでください");
        tracing::warn!("========================================");
    }

    let transport = HttpUpstreamTransport::new(&config.upstream_url, config.upstream_timeout)
        .context("上流クライアントの初期化に失敗しました")?;
    let app = build_app(&config, Arc::new(transport));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} にバインドできません"))?;
    tracing::info!("BFF サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("BFF サーバーを停止しました");
    Ok(())
}

/// Ctrl+C（SIGINT）または SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl+C ハンドラを登録できません: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM ハンドラを登録できません: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("停止シグナルを受信しました");
}

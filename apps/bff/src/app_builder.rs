//! # BFF アプリケーション構築
//!
//! DI（トランスポート・エンジン・State）の初期化とルーター構築を担当する。
//! `main.rs` は設定読み込みとサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use relaygate_shared::{
    canonical_log::CanonicalLogLineLayer,
    observability::{MakeRequestUuidV7, make_request_span},
};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    client::{UpstreamClientFactory, UpstreamTransport},
    config::BffConfig,
    handler::{
        AuthState,
        ProxyState,
        ReadinessState,
        callback,
        error_page,
        health_check,
        login,
        logout,
        logout_redirect,
        me,
        proxy,
        readiness_check,
    },
    middleware::{
        RouteGateState,
        no_cache,
        request_id::store_request_id,
        route_gate,
    },
    proxy::{ForwardingEngine, RefreshCoordinator},
    session::{CredentialResolver, SessionStore},
};

/// DI コンテナの構築とルーター定義を行う
///
/// 上流トランスポートを受け取り、ファクトリ → コーディネーター → エンジン → State → Router の
/// 順に組み立てる。[`RefreshCoordinator`] はここで 1 つだけ作り、全リクエストで共有する。
pub fn build_app(config: &BffConfig, transport: Arc<dyn UpstreamTransport>) -> Router {
    let factory = Arc::new(UpstreamClientFactory::new(
        transport.clone(),
        config.token_strategy,
    ));
    let coordinator = Arc::new(RefreshCoordinator::new(factory.clone()));
    let engine = Arc::new(ForwardingEngine::new(factory, coordinator));
    let sessions = Arc::new(SessionStore::new(&config.session, config.token_strategy));

    let readiness_state = Arc::new(ReadinessState { transport });

    let auth_state = Arc::new(AuthState {
        engine:    engine.clone(),
        sessions:  sessions.clone(),
        sso:       config.sso.clone(),
        mock_mode: config.mock_mode,
    });

    let proxy_state = Arc::new(ProxyState {
        engine,
        sessions: sessions.clone(),
        mock_mode: config.mock_mode,
    });

    let route_gate_state = Arc::new(RouteGateState {
        protected_routes: config.protected_routes.clone(),
        resolver:         CredentialResolver::new(sessions.clone()),
        sessions,
    });

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        .route("/error-page", get(error_page))
        // 認証ハンドシェイク（プロキシより優先される静的パス）
        .merge(
            Router::new()
                .route("/api/auth/login", get(login))
                .route("/api/auth/callback", get(callback))
                .route("/callback", get(callback))
                .route("/api/auth/logout", get(logout_redirect).post(logout))
                .route("/api/auth/me", get(me))
                .with_state(auth_state),
        )
        // 上流 API へのプロキシ
        .merge(
            Router::new()
                .route(
                    "/api/{*path}",
                    get(proxy).post(proxy).put(proxy).patch(proxy).delete(proxy),
                )
                .with_state(proxy_state),
        );

    #[cfg(feature = "dev-auth")]
    let router = if config.dev_auth_enabled {
        router.merge(crate::dev_auth::routes())
    } else {
        router
    };

    router
        // ルートガード: ハンドラより先に保護ルートへの未認証アクセスを迂回させる
        .layer(from_fn_with_state(route_gate_state, route_gate))
        // キャッシュ制御: トークンを含みうる応答がキャッシュされないようにする
        .layer(from_fn(no_cache))
        // Request ID レイヤー（レイヤー順序が重要: 下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: リクエスト受信時に UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: カスタムスパンに request_id を含め、全ログに自動注入
        // 3. CanonicalLogLineLayer: リクエスト完了時に1行サマリログを出力（スパン内）
        // 4. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        // 5. store_request_id: task-local に保存し、BFF → 上流 API のヘッダー伝播に使用
        .layer(from_fn(store_request_id))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CanonicalLogLineLayer)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}

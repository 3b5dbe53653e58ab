//! # リフレッシュの単一実行制御
//!
//! 期限切れの認証情報を持つリクエストが同時に到着しても、上流の
//! `POST /auth/refresh` は 1 回だけ呼ぶ。
//!
//! ## 不変条件
//!
//! - 同じリフレッシュトークンで同時に `refresh_once` を呼んだ N 件に対して、上流のリフレッシュ呼び出しは 1 回
//! - N 件すべてがその 1 回の結果を受け取る
//! - 異なるリフレッシュトークン（別セッション）の呼び出しは合流せず、それぞれリフレッシュする
//! - 実行中スロットは結果確定と同時に空になり、次の呼び出しは新しいリフレッシュを開始できる
//!
//! スロットはリフレッシュトークンごとに世代番号付きで保持し、自分が開始した世代のときだけ空にする。

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use axum::http::{Method, StatusCode};
use relaygate_domain::credential::CredentialPair;
use relaygate_shared::{
    event_log::{error, event},
    log_business_event,
};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::client::{UpstreamClientFactory, UpstreamError, UpstreamRequest, parse_token_grant};

/// 上流のリフレッシュエンドポイント
pub const REFRESH_PATH: &str = "/auth/refresh";

/// リフレッシュの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success { credential: CredentialPair },
    Failure { reason: RefreshFailure },
}

/// リフレッシュの失敗理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// 上流が 200 以外を返した
    #[error("上流がリフレッシュを拒否しました: {0}")]
    Rejected(StatusCode),

    /// 200 だが新しいトークンが含まれていない
    #[error("リフレッシュ応答にトークンがありません")]
    MissingTokens,

    /// タイムアウト・接続エラー
    #[error(transparent)]
    Transport(#[from] UpstreamError),
}

struct InFlight {
    generation: u64,
    cell:       Arc<OnceCell<RefreshOutcome>>,
}

/// リフレッシュの単一実行コーディネーター
///
/// プロセスに 1 つだけ作り、全リクエストで共有する。
/// 実行中のリフレッシュはリフレッシュトークンをキーに保持する。
pub struct RefreshCoordinator {
    factory:     Arc<UpstreamClientFactory>,
    in_flight:   Mutex<HashMap<String, InFlight>>,
    generations: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(factory: Arc<UpstreamClientFactory>) -> Self {
        Self {
            factory,
            in_flight: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// 認証情報をリフレッシュする
    ///
    /// 同じリフレッシュトークンのリフレッシュが実行中ならそれに合流し、同じ結果を返す。
    /// なければ古いリフレッシュトークンで上流を 1 回呼ぶ。
    pub async fn refresh_once(&self, credential: &CredentialPair) -> RefreshOutcome {
        let key = credential.refresh_token();
        let (generation, cell) = self.join_or_start(key);

        cell.get_or_init(|| async {
            let outcome = self.perform(credential).await;
            self.settle(key, generation);
            outcome
        })
        .await
        .clone()
    }

    fn join_or_start(&self, key: &str) -> (u64, Arc<OnceCell<RefreshOutcome>>) {
        let mut slots = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(in_flight) = slots.get(key) {
            return (in_flight.generation, in_flight.cell.clone());
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let cell = Arc::new(OnceCell::new());
        slots.insert(
            key.to_string(),
            InFlight {
                generation,
                cell: cell.clone(),
            },
        );
        (generation, cell)
    }

    fn settle(&self, key: &str, generation: u64) {
        let mut slots = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slots.get(key).is_some_and(|f| f.generation == generation) {
            slots.remove(key);
        }
    }

    async fn perform(&self, credential: &CredentialPair) -> RefreshOutcome {
        let result = self
            .factory
            .build_for_refresh(credential)
            .send(UpstreamRequest::new(Method::POST, REFRESH_PATH))
            .await;

        let outcome = match result {
            Ok(response) if response.status == StatusCode::OK => {
                match parse_token_grant(&response) {
                    Some(grant) => RefreshOutcome::Success {
                        credential: credential.renew(grant),
                    },
                    None => RefreshOutcome::Failure {
                        reason: RefreshFailure::MissingTokens,
                    },
                }
            }
            Ok(response) => RefreshOutcome::Failure {
                reason: RefreshFailure::Rejected(response.status),
            },
            Err(e) => RefreshOutcome::Failure { reason: e.into() },
        };

        match &outcome {
            RefreshOutcome::Success { credential } => {
                log_business_event!(
                    event.category = event::category::PROXY,
                    event.action = event::action::TOKEN_REFRESHED,
                    event.result = event::result::SUCCESS,
                    event.subject_id = ?credential.subject_id(),
                    "トークンをリフレッシュ"
                );
            }
            RefreshOutcome::Failure { reason } => {
                if let RefreshFailure::Transport(e) = reason {
                    tracing::warn!(
                        error.category = error::category::EXTERNAL_SERVICE,
                        error.kind = error::kind::TOKEN_REFRESH,
                        "リフレッシュ呼び出しに失敗: {}",
                        e
                    );
                }
                log_business_event!(
                    event.category = event::category::PROXY,
                    event.action = event::action::TOKEN_REFRESH_FAILED,
                    event.result = event::result::FAILURE,
                    event.reason = %reason,
                    "トークンのリフレッシュに失敗"
                );
            }
        }

        outcome
    }
}

//! # 転送エンジン
//!
//! ブラウザからのリクエストを認証情報付きで上流へ転送する。
//!
//! ```text
//! 転送 ─▶ 401? ─No─▶ そのまま返す
//!          │Yes
//!          ▼
//!     リフレッシュ（単一実行）─失敗─▶ SESSION_EXPIRED
//!          │成功
//!          ▼
//!     新しい認証情報で 1 回だけ再送 ─▶ 結果をそのまま返す
//! ```
//!
//! - [`headers`]: 転送から除外するヘッダーと透過するレスポンスヘッダー
//! - [`RefreshCoordinator`]: 同時に発生したリフレッシュを 1 回の上流呼び出しにまとめる
//! - [`ForwardingEngine`]: 転送・401 検出・リフレッシュ・再送の状態機械

mod forward;
pub mod headers;
mod refresh;

pub use forward::{ForwardOutcome, ForwardRequest, Forwarded, ForwardingEngine};
pub use refresh::{REFRESH_PATH, RefreshCoordinator, RefreshFailure, RefreshOutcome};

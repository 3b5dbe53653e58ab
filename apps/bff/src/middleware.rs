//! # ミドルウェア
//!
//! BFF 用のミドルウェアを提供する。

mod cache_control;
pub mod request_id;
mod route_gate;

pub use cache_control::no_cache;
pub use route_gate::{GateDecision, ProtectedRoutes, RouteGateState, route_gate};

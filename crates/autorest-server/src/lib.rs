//! HTTP surface of autorest: the axum router, bearer-token gate, error
//! envelopes and startup wiring used by the `autorest` binary.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, build_state};

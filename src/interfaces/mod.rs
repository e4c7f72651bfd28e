//! Interface adapters exposing the forecast service to the outside world.

pub mod http;

pub use http::{router, serve, AppState, ErrorResponse};

//! HTTP transport

mod http;

pub use http::{AppState, router, run_http, serve};

//! Control-plane API that supervised server instances call back into.
//!
//! Instance callbacks (`/server_api/{key}/...`) are authorized with a
//! per-instance shared secret sent as a Basic credential.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

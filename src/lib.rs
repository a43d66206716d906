//! quickshare: share local files and directories over HTTP.
//!
//! One route per distinct shared directory (prefixed by a stable hash of
//! its path), an optional upload endpoint ("receive" mode), an optional
//! shared-clipboard convention, and an optional Basic-auth/TLS gate.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hash;
pub mod routes;
pub mod server;
pub mod upload;

pub use config::{AuthConfig, Config, TlsConfig};
pub use error::{ApiError, StartupError};
pub use server::{build_router, build_state, serve, AppState, Hooks};

//! # B2 Emulator
//!
//! In-memory server speaking the subset of the Backblaze B2 API used by
//! `b2-client`. Useful for local development and for end-to-end tests.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            b2-client / curl                  │
//! └──────────────────────┬───────────────────────┘
//!                        │ /b2api/v1/b2_*  /file/{bucket}/{name}
//! ┌──────────────────────▼───────────────────────┐
//! │   Handlers (account, bucket, file, download) │
//! ├──────────────────────────────────────────────┤
//! │   AppState: tokens, upload tokens            │
//! ├──────────────────────────────────────────────┤
//! │   Store: buckets, file versions              │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! State lives in memory only and is lost when the process exits.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

pub use config::EmulatorConfig;
pub use error::{B2ErrorCode, EmulatorError};
pub use server::{run_server_with_shutdown, serve};
pub use state::AppState;

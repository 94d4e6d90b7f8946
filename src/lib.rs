//! Vorex client utilities
//!
//! Resilient plumbing between the Vorex language-learning client and its
//! backend API: a retrying fetch, a TTL response cache, a trailing-edge
//! debouncer, user-facing error translation, and the local settings store.
//! The pieces are independent; [`client::ApiClient`] shows them composed.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod settings;
pub mod storage;

pub use cache::TtlCache;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use debounce::{DebounceState, Debouncer};
pub use error::{format_api_error, ApiError};
pub use fetch::{fetch_with_retry, retry_with_backoff, RequestSpec, RetryOptions};
pub use settings::Settings;
pub use storage::LocalStorage;

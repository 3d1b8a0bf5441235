//! Source adapters: one per upstream provider, each turning network failures
//! into a carried-forward record plus a health entry.

pub mod adapter;
pub mod adapters;
pub mod collector;
pub mod config;
pub mod error;
pub mod http;

pub use adapter::{SourceAdapter, Sourced, fetch_with_fallback};
pub use collector::{Adapters, collect};
pub use config::SourcesConfig;
pub use error::FetchError;
pub use http::{HttpFetcher, RetryPolicy};

//! The adapter contract and the fallback wrapper that makes it infallible.

use async_trait::async_trait;
use chrono::Utc;
use thesisboard_core::{Fetched, HealthEntry, HealthStatus, LiveMetric};
use tracing::{info, warn};

use crate::FetchError;

/// A record together with the endpoint that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: String,
}

impl<T> Sourced<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            source: source.into(),
        }
    }
}

/// One upstream provider. Implementations may fail freely; callers go
/// through [`fetch_with_fallback`], which never does.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Record: Clone + Default + Send + Sync;

    /// Slot name in the state document and the health ledger.
    fn name(&self) -> &'static str;

    async fn try_fetch(&self) -> Result<Sourced<Self::Record>, FetchError>;
}

/// Run an adapter and fold any failure into the previous record.
///
/// - success: fresh values, `health = ok`
/// - [`FetchError::NotConfigured`]: previous values, `health = skip`
/// - any other error: previous values, `health = fail` with the message
///
/// With no previous record the "previous values" are the record's all-`None` default.
pub async fn fetch_with_fallback<A: SourceAdapter + ?Sized>(
    adapter: &A,
    previous: &LiveMetric<A::Record>,
) -> Fetched<A::Record> {
    let name = adapter.name();
    let result = adapter.try_fetch().await;
    let now = Utc::now();

    match result {
        Ok(Sourced { value, source }) => {
            info!(source = name, via = %source, "fetched");
            Fetched {
                record: LiveMetric {
                    value,
                    source: Some(source),
                    last_fetched: Some(now),
                    health: HealthStatus::Ok,
                },
                health: HealthEntry::ok(now),
            }
        }
        Err(FetchError::NotConfigured(what)) => {
            info!(source = name, missing = what, "skipped, not configured");
            Fetched {
                record: LiveMetric::carried_forward(previous, HealthStatus::Skip),
                health: HealthEntry::skip(now, format!("not configured: {what}")),
            }
        }
        Err(e) => {
            warn!(source = name, error = %e, "fetch failed, keeping previous values");
            Fetched {
                record: LiveMetric::carried_forward(previous, HealthStatus::Fail),
                health: HealthEntry::fail(now, e.to_string()),
            }
        }
    }
}

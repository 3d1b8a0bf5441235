//! Reconciliation: merge this cycle's fetches into the previous state.
//!
//! `reconcile` is a pure function of its inputs (the timestamp is passed in)
//! and cannot fail. Adapters have already substituted fallback values for
//! failed fetches, so this step only propagates what they returned, carries
//! the operator and editorial sections across untouched, and rebuilds the
//! derived fields and the health ledger.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::derived::compute_derived;
use crate::health::{HealthEntry, HealthLedger, HealthStatus};
use crate::state::{
    FlowRecord, FxRecord, LedgerRecord, LiveMetric, NewsRecord, PriceRecord, SentimentRecord,
    StateBlob, YieldRecord,
};

/// What one adapter produced this cycle: a record (fresh or carried forward)
/// and the health entry describing how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub record: LiveMetric<T>,
    pub health: HealthEntry,
}

/// All adapter outputs for one cycle. A `None` slot means the adapter did not
/// run; its previous record is carried forward and it gets no health entry.
#[derive(Debug, Clone, Default)]
pub struct FreshRecords {
    pub price: Option<Fetched<PriceRecord>>,
    pub sentiment: Option<Fetched<SentimentRecord>>,
    pub fx: Option<Fetched<FxRecord>>,
    pub yields: Option<Fetched<YieldRecord>>,
    pub flows: Option<Fetched<FlowRecord>>,
    pub ledger: Option<Fetched<LedgerRecord>>,
    pub news: Option<Fetched<NewsRecord>>,
}

pub fn reconcile(previous: &StateBlob, fresh: FreshRecords, now: DateTime<Utc>) -> StateBlob {
    let mut health = HealthLedger::new();

    let mut next = StateBlob {
        updated: Some(now),
        price: take_slot("price", fresh.price, &previous.price, &mut health),
        sentiment: take_slot("sentiment", fresh.sentiment, &previous.sentiment, &mut health),
        fx: take_slot("fx", fresh.fx, &previous.fx, &mut health),
        yields: take_slot("yields", fresh.yields, &previous.yields, &mut health),
        flows: take_slot("flows", fresh.flows, &previous.flows, &mut health),
        ledger: take_slot("ledger", fresh.ledger, &previous.ledger, &mut health),
        news: take_slot("news", fresh.news, &previous.news, &mut health),
        manual: previous.manual.clone().with_defaults(),
        editorial: previous.editorial.clone(),
        derived: Default::default(),
        health: HealthLedger::new(),
        extra: previous.extra.clone(),
    };

    next.derived = compute_derived(&next);
    next.health = health;
    next
}

fn take_slot<T: Clone>(
    name: &str,
    fresh: Option<Fetched<T>>,
    previous: &LiveMetric<T>,
    health: &mut HealthLedger,
) -> LiveMetric<T> {
    let Some(Fetched { record, health: entry }) = fresh else {
        debug!(source = name, "no adapter output, carrying previous record");
        return previous.clone();
    };

    let record = match entry.status {
        HealthStatus::Ok => record,
        HealthStatus::Fail => {
            warn!(
                source = name,
                error = entry.error.as_deref().unwrap_or(""),
                "source failed, keeping fallback record"
            );
            record
        }
        HealthStatus::Skip => {
            debug!(source = name, "source skipped, keeping fallback record");
            record
        }
    };

    health.insert(name.to_string(), entry);
    record
}

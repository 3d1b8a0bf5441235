pub mod amount;
pub mod derived;
pub mod health;
pub mod opinion;
pub mod reconcile;
pub mod state;
pub mod title_key;

pub use amount::{Drops, safe_div};
pub use derived::compute_derived;
pub use health::{DEFAULT_ESCALATION_THRESHOLD, HealthEntry, HealthLedger, HealthStatus};
pub use opinion::{OpinionDocument, OpinionError, ScorecardDelta, Severity, TimelineDraft};
pub use reconcile::{Fetched, FreshRecords, reconcile};
pub use state::{
    DerivedFields, EditorialFields, FlowDay, FlowRecord, FxRecord, Headline, LedgerRecord,
    LiveMetric, ManualFields, NewsRecord, PriceRecord, Probabilities, ScoreStatus,
    SentimentRecord, StateBlob, YieldRecord,
};
pub use title_key::{TITLE_KEY_LEN, title_key};

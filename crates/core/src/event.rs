use chrono::{DateTime, Utc};

/// A domain event emitted by an aggregate.
pub trait Event: Clone + core::fmt::Debug {
    /// Stable dotted name, e.g. `audits.audit.started`.
    fn event_type(&self) -> &'static str;

    fn occurred_at(&self) -> DateTime<Utc>;
}

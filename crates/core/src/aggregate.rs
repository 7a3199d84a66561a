//! Aggregate traits for the client-side state machines.

/// Identity and version of an aggregate.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Events applied since the aggregate was hydrated.
    fn version(&self) -> u64;
}

/// Decide with `handle`, evolve with `apply`.
///
/// `handle` never mutates. View models that talk to a backend call it to
/// validate an action, send the write, and apply the returned events only
/// after the write is confirmed.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Apply events in order.
    fn apply_all(&mut self, events: &[Self::Event]) {
        for event in events {
            self.apply(event);
        }
    }
}

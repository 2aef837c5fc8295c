//! Values paired with the moment they were last replaced.

use std::time::Instant;

/// A value tagged with its last-update moment.
///
/// The stamp comes from [`Instant`], so successive replacements are
/// monotonically non-decreasing. A `Stamped` is replaced whole, never
/// mutated in place: every setter produces a new value with a fresh stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped<T> {
    updated: Instant,
    value: T,
}

impl<T> Stamped<T> {
    /// Wrap a value with an explicit stamp. Used to seed initial state with
    /// a shared baseline moment.
    pub fn new(updated: Instant, value: T) -> Self {
        Self { updated, value }
    }

    /// Wrap a value stamped with the current moment.
    pub fn now(value: T) -> Self {
        Self::new(Instant::now(), value)
    }

    /// The moment this value was last replaced.
    pub fn updated(&self) -> Instant {
        self.updated
    }

    /// Borrow the wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume the wrapper and return the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Replace the value, refreshing the stamp.
    pub fn replace(self, value: T) -> Self {
        Self::now(value)
    }

    /// Functional replacement: derive the new value from the old one,
    /// refreshing the stamp.
    pub fn update(self, f: impl FnOnce(T) -> T) -> Self {
        Self::now(f(self.value))
    }

    /// Whether this value was replaced strictly after `baseline`.
    pub fn is_fresher_than(&self, baseline: Instant) -> bool {
        self.updated > baseline
    }
}

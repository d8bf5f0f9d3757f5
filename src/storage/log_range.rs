//! Index and half-open range primitives over the log's index space.

use std::fmt;
use std::ops::Add;

use serde::Deserialize;
use serde::Serialize;

/// Position of an entry in the replicated log.
///
/// Indices increase strictly with every appended entry. `LogIndex(0)` never
/// names an entry; it is used as the "nothing yet" value of every bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogIndex(pub u64);

impl LogIndex {
    pub const ZERO: LogIndex = LogIndex(0);

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn saturating_prev(self) -> LogIndex {
        LogIndex(self.0.saturating_sub(1))
    }

    /// Number of indices in `[other, self)`, zero if `other >= self`.
    #[inline]
    pub fn distance_from(
        self,
        other: LogIndex,
    ) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl Add<u64> for LogIndex {
    type Output = LogIndex;

    fn add(
        self,
        rhs: u64,
    ) -> LogIndex {
        LogIndex(self.0.saturating_add(rhs))
    }
}

impl From<u64> for LogIndex {
    fn from(value: u64) -> Self {
        LogIndex(value)
    }
}

impl fmt::Display for LogIndex {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open range `[from, to)` of log indices. `from == to` is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogRange {
    pub from: LogIndex,
    pub to: LogIndex,
}

impl LogRange {
    /// # Panics
    /// If `from > to`. A reversed range is a bug in the caller.
    pub fn new(
        from: LogIndex,
        to: LogIndex,
    ) -> Self {
        assert!(from <= to, "invalid log range [{from}, {to})");
        Self { from, to }
    }

    /// The empty range positioned at `at`.
    pub fn empty_at(at: LogIndex) -> Self {
        Self { from: at, to: at }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.to.distance_from(self.from)
    }

    #[inline]
    pub fn contains(
        &self,
        index: LogIndex,
    ) -> bool {
        self.from <= index && index < self.to
    }

    /// First index in the range.
    pub fn front(&self) -> Option<LogIndex> {
        (!self.is_empty()).then_some(self.from)
    }

    /// Last index in the range.
    pub fn back(&self) -> Option<LogIndex> {
        (!self.is_empty()).then(|| self.to.saturating_prev())
    }

    /// Overlap of both ranges. Disjoint ranges yield an empty range
    /// positioned at the larger lower bound.
    pub fn intersect(
        &self,
        other: &LogRange,
    ) -> LogRange {
        let from = self.from.max(other.from);
        let to = self.to.min(other.to).max(from);
        LogRange { from, to }
    }

    /// Smallest range covering both. Empty operands do not widen the result.
    pub fn union(
        &self,
        other: &LogRange,
    ) -> LogRange {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => LogRange {
                from: self.from.min(other.from),
                to: self.to.max(other.to),
            },
        }
    }

    /// Clamps `index` into `[from, to]`.
    pub fn clamp(
        &self,
        index: LogIndex,
    ) -> LogIndex {
        index.clamp(self.from, self.to)
    }
}

impl fmt::Display for LogRange {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

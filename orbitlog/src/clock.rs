//! Logical clocks of log entries.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Logical time of one writer's stream of entries.
///
/// `time` grows by one with every append to the stream identified by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{id}@{time}")]
pub struct Clock {
    /// Id of the authoring stream, usually the writer's public key or identity id.
    pub id: String,
    /// Logical time within the stream.
    pub time: u64,
}

impl Clock {
    /// Create a clock for stream `id` at `time`.
    pub fn new(id: impl Into<String>, time: u64) -> Self {
        Self {
            id: id.into(),
            time,
        }
    }

    /// The clock of the next append to the same stream.
    ///
    /// Returns `None` once `time` is exhausted, since the next append could not be ordered
    /// after this one.
    pub fn tick(&self) -> Option<Self> {
        Some(Self {
            id: self.id.clone(),
            time: self.time.checked_add(1)?,
        })
    }

    /// A clock for this stream that is at least as far as both `self` and `other`.
    ///
    /// Call [`Self::tick`] on the result to get a clock strictly after both.
    pub fn merge(&self, other: &Clock) -> Self {
        Self {
            id: self.id.clone(),
            time: self.time.max(other.time),
        }
    }
}

/// Clocks are ordered by time, ties are broken by the stream id.
impl Ord for Clock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Clock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

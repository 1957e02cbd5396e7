//! Batch decoding configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BatchConfig
// ---------------------------------------------------------------------------

/// How a batch decode treats its input.
///
/// `Default` is the lenient setting a client wants against a live server:
/// skip entries that are not events and fill in room ids from the section
/// they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// What to do with an array entry that is not a valid event envelope.
    pub on_malformed: MalformedPolicy,

    /// Whether events inside a `rooms.*.<room_id>` section that omit
    /// `room_id` get that room id in their metadata.
    pub attach_room_id: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            on_malformed: MalformedPolicy::Skip,
            attach_room_id: true,
        }
    }
}

impl BatchConfig {
    /// Fails on the first malformed entry instead of skipping it.
    pub fn strict() -> Self {
        Self {
            on_malformed: MalformedPolicy::Fail,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// MalformedPolicy
// ---------------------------------------------------------------------------

/// Handling of malformed entries in an event array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Log at `warn` and continue with the next entry.
    #[default]
    Skip,
    /// Abort the whole decode with the entry's index.
    Fail,
}

impl std::fmt::Display for MalformedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

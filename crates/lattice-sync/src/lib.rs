//! Batch decoding for Lattice.
//!
//! Feeds event arrays and incremental sync payloads through the
//! single-event decoder in `lattice-events`, grouping the results by room
//! and category.
//!
//! # Key types
//!
//! - [`decode_events`]: a bare JSON array of events
//! - [`SyncResponse`]: a `/sync` body, split into [`Rooms`] and global lists
//! - [`BatchConfig`]: malformed-entry policy and room id attachment
//! - [`SyncError`]: container-level failures

mod batch;
mod config;
mod error;
mod response;

pub use batch::decode_events;
pub use config::{BatchConfig, MalformedPolicy};
pub use error::SyncError;
pub use response::{InvitedRoom, JoinedRoom, LeftRoom, Rooms, SyncResponse, Timeline};

//! Store feed adapter: fetches the store directory over HTTP, normalizes wire
//! records, and follows real-time `storeDetailsUpdated` patches.

pub mod client;
pub mod error;
pub mod normalize;
pub(crate) mod retry;
pub mod session;
pub mod types;
pub mod updates;

pub use client::{FeedClient, FeedOptions, DEFAULT_TIMEOUT_MS};
pub use error::FeedError;
pub use session::{FollowSummary, LoadOutcome, MapSession};
pub use updates::{SseDecoder, SseFrame, UpdateSubscription};

//! Event subscription sessions
//!
//! The [`SubscriptionManager`] loads the active subscriptions, groups them by
//! endpoint URL and runs one [`Session`] per URL. Each session keeps a single
//! streaming connection open, decodes the logs it receives and appends them
//! to the event log exactly once per transaction hash.

mod handler;
mod manager;
mod session;
mod transport;

pub use handler::{ingest_log, ArmedSubscription, Ingested};
pub use manager::{partition_by_endpoint, SubscriptionConfig, SubscriptionManager};
pub use session::Session;
pub use transport::{LogFilter, LogStream, LogTransport, TaggedLog, WsTransport};

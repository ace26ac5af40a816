//! Channel subscription bookkeeping.
//!
//! A [`SubscriptionManager`] tracks which clients listen to which named
//! channels and tells a [`SubscriptionHandler`] when a channel comes into
//! existence, when it loses its last subscriber, and when a client joins.
//! Broadcast servers use the handler to open and close upstream feeds lazily.
//!
//! The manager is a plain owned value: every mutation goes through `&mut self`,
//! so it belongs to whichever task owns the connections and needs no locking.

mod handler;
mod manager;

pub use handler::SubscriptionHandler;
pub use manager::SubscriptionManager;

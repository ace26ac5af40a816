//! Lifecycle callbacks for channel bookkeeping.

use std::collections::HashSet;

/// Lifecycle callbacks injected into a [`SubscriptionManager`](super::SubscriptionManager).
///
/// # Example
///
/// ```rust
/// use rebound::{SubscriptionHandler, SubscriptionManager};
/// use std::collections::HashSet;
///
/// #[derive(Default)]
/// struct Feeds {
///     open: Vec<String>,
/// }
///
/// impl SubscriptionHandler<u64> for Feeds {
///     type Error = String;
///
///     fn new_channel(&mut self, channel: &str, _: &HashSet<u64>) -> Result<(), String> {
///         self.open.push(channel.to_string());
///         Ok(())
///     }
///
///     fn remove_channel(&mut self, channel: &str) {
///         self.open.retain(|open| open != channel);
///     }
/// }
///
/// let mut manager = SubscriptionManager::new(Feeds::default());
/// manager.add("block", 1u64).unwrap();
/// assert_eq!(manager.handler().open, vec!["block".to_string()]);
///
/// manager.delete("block", &1);
/// assert!(manager.handler().open.is_empty());
/// ```
pub trait SubscriptionHandler<C> {
    /// Error returned when a channel cannot be opened.
    type Error;

    /// A channel is about to be created for its first subscriber.
    ///
    /// `subscribers` is the channel's (still empty) subscriber set. Returning
    /// an error aborts the subscription and the channel is not created.
    fn new_channel(&mut self, channel: &str, subscribers: &HashSet<C>)
        -> Result<(), Self::Error>;

    /// The last subscriber left `channel`, which no longer exists.
    fn remove_channel(&mut self, channel: &str);

    /// `client` newly subscribed to `channel`. Defaults to doing nothing.
    fn new_client(&mut self, _channel: &str, _client: &C) {}
}

//! The channel to subscriber map.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use super::handler::SubscriptionHandler;

/// Maps channel names to their subscribed clients.
///
/// Channels exist exactly as long as they have at least one subscriber.
/// Creating a channel calls [`SubscriptionHandler::new_channel`], removing its
/// last subscriber calls [`SubscriptionHandler::remove_channel`].
#[derive(Debug, Clone)]
pub struct SubscriptionManager<C, H> {
    subscriptions: BTreeMap<String, HashSet<C>>,
    handler: H,
}

impl<C, H> SubscriptionManager<C, H>
where
    C: Eq + Hash,
    H: SubscriptionHandler<C>,
{
    /// Create an empty manager reporting to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            handler,
        }
    }

    /// Subscribe `client` to `channel`.
    ///
    /// Creates the channel first if needed; if the handler refuses it, nothing
    /// changes and the handler's error is returned. Subscribing a client that
    /// is already subscribed is a no-op.
    pub fn add(&mut self, channel: &str, client: C) -> Result<(), H::Error> {
        let subscribers = match self.subscriptions.entry(channel.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let subscribers = HashSet::new();
                self.handler.new_channel(channel, &subscribers)?;
                entry.insert(subscribers)
            }
        };

        if subscribers.contains(&client) {
            return Ok(());
        }

        self.handler.new_client(channel, &client);
        subscribers.insert(client);
        Ok(())
    }

    /// Unsubscribe `client` from `channel`.
    ///
    /// Does nothing if the channel does not exist. Removes the channel once its
    /// last subscriber is gone.
    pub fn delete(&mut self, channel: &str, client: &C) {
        let Some(subscribers) = self.subscriptions.get_mut(channel) else {
            return;
        };

        subscribers.remove(client);
        if subscribers.is_empty() {
            self.subscriptions.remove(channel);
            #[cfg(feature = "tracing")]
            tracing::debug!(channel, "all subscriptions to channel have been removed");
            self.handler.remove_channel(channel);
        }
    }

    /// Channels `client` is subscribed to, in name order.
    pub fn client_subscriptions(&self, client: &C) -> Vec<String> {
        self.subscriptions
            .iter()
            .filter(|(_, subscribers)| subscribers.contains(client))
            .map(|(channel, _)| channel.clone())
            .collect()
    }

    /// Unsubscribe `client` from every channel.
    pub fn delete_client(&mut self, client: &C) {
        for channel in self.client_subscriptions(client) {
            self.delete(&channel, client);
        }
    }

    /// Subscribers of `channel`, if it exists.
    pub fn subscribers(&self, channel: &str) -> Option<&HashSet<C>> {
        self.subscriptions.get(channel)
    }

    /// Names of all live channels, in name order.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.keys().map(String::as_str)
    }

    /// Returns true if no channel has subscribers.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Get the lifecycle handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Get the lifecycle handler mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the manager, returning its handler.
    pub fn into_handler(self) -> H {
        self.handler
    }
}

/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Request-reply routing.
//!
//! Request/response flows over FIX correlate by an application-chosen
//! request identifier (MDReqID, SecurityReqID, TradeRequestID, ...). The
//! [`ReplyRouter`] is an explicit map from that identifier to a response
//! channel, with explicit insertion and removal. Streaming subscriptions
//! (market data) use a bounded queue that drops the oldest entry at
//! capacity, so a slow consumer observes the freshest snapshots.

use ferrofix_core::message::OwnedMessage;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
enum Slot {
    Stream(mpsc::UnboundedSender<OwnedMessage>),
    Bounded(BoundedSubscription),
}

/// Bounded drop-oldest subscription queue.
#[derive(Debug, Clone)]
pub struct BoundedSubscription {
    queue: Arc<Mutex<VecDeque<OwnedMessage>>>,
    capacity: usize,
}

impl BoundedSubscription {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn push(&self, message: OwnedMessage) {
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(message);
    }

    /// Pops the oldest queued message, if any.
    #[must_use]
    pub fn pop(&self) -> Option<OwnedMessage> {
        self.queue.lock().pop_front()
    }

    /// Returns the number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true if no messages are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Explicit request-identifier to response-channel map.
#[derive(Debug, Default)]
pub struct ReplyRouter {
    slots: RwLock<HashMap<String, Slot>>,
}

impl ReplyRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request identifier, returning the receiving end for its
    /// replies. A previous registration under the same key is replaced.
    pub fn register(&self, key: impl Into<String>) -> mpsc::UnboundedReceiver<OwnedMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.slots.write().insert(key.into(), Slot::Stream(tx));
        rx
    }

    /// Registers a bounded drop-oldest subscription, for streaming data
    /// where only the freshest entries matter.
    pub fn register_bounded(&self, key: impl Into<String>, capacity: usize) -> BoundedSubscription {
        let subscription = BoundedSubscription::new(capacity.max(1));
        self.slots
            .write()
            .insert(key.into(), Slot::Bounded(subscription.clone()));
        subscription
    }

    /// Removes a registration. Returns true if the key was present.
    pub fn deregister(&self, key: &str) -> bool {
        self.slots.write().remove(key).is_some()
    }

    /// Dispatches a reply to its registered channel.
    ///
    /// Returns false when the key is unknown or the receiver is gone (the
    /// dead registration is removed).
    pub fn dispatch(&self, key: &str, message: OwnedMessage) -> bool {
        let slots = self.slots.read();
        match slots.get(key) {
            Some(Slot::Stream(tx)) => {
                if tx.send(message).is_ok() {
                    true
                } else {
                    drop(slots);
                    self.slots.write().remove(key);
                    false
                }
            }
            Some(Slot::Bounded(subscription)) => {
                subscription.push(message);
                true
            }
            None => false,
        }
    }

    /// Returns true if the key is registered.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.slots.read().contains_key(key)
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

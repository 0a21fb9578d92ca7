//! Event fanout with per-subscriber bounded queues
//!
//! The core queues events without blocking and without I/O; each
//! subscriber drains its own queue from its own task. A slow subscriber
//! only ever loses its own events.
//!
//! Overflow policy: drop the oldest undelivered event of the same kind if
//! one is queued, otherwise the oldest event overall, and mark the
//! subscriber lagged so the transport can resynchronize from snapshots.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{debug, warn};
use types::ids::AccountId;

use crate::events::Event;

/// Routing scope for a published event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every live subscriber
    All,
    /// Only subscribers registered for this account
    Account(AccountId),
}

#[derive(Debug)]
struct QueueState {
    queue: VecDeque<Event>,
    capacity: usize,
    lagged: bool,
    closed: bool,
    dropped: u64,
}

impl QueueState {
    fn push(&mut self, event: Event) {
        if self.queue.len() >= self.capacity {
            let kind = event.kind();
            if let Some(pos) = self.queue.iter().position(|e| e.kind() == kind) {
                self.queue.remove(pos);
            } else {
                self.queue.pop_front();
            }
            self.lagged = true;
            self.dropped += 1;
        }
        self.queue.push_back(event);
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<QueueState>,
    notify: Notify,
}

struct SubscriberEntry {
    id: u64,
    account_id: AccountId,
    shared: Arc<Shared>,
}

/// Fanout hub owned by the exchange
pub struct EventBus {
    subscribers: Mutex<Vec<SubscriberEntry>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl EventBus {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            queue_capacity,
        }
    }

    /// Register a subscriber for an account and hand back its queue
    pub fn subscribe(&self, account_id: AccountId) -> Subscription {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                capacity: self.queue_capacity,
                lagged: false,
                closed: false,
                dropped: 0,
            }),
            notify: Notify::new(),
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self.subscribers.lock().expect("bus lock");
        subscribers.push(SubscriberEntry {
            id,
            account_id,
            shared: shared.clone(),
        });
        debug!(subscriber = id, account = %account_id, "subscriber registered");

        Subscription { id, account_id, shared }
    }

    /// Queue an event for every subscriber the scope selects
    ///
    /// Dead subscribers (their `Subscription` was dropped) are pruned
    /// lazily here.
    pub fn publish(&self, scope: Scope, event: Event) {
        let mut subscribers = self.subscribers.lock().expect("bus lock");

        subscribers.retain(|entry| {
            let closed = entry.shared.state.lock().expect("queue lock").closed;
            if closed {
                debug!(subscriber = entry.id, "pruning closed subscriber");
            }
            !closed
        });

        for entry in subscribers.iter() {
            let matches = match scope {
                Scope::All => true,
                Scope::Account(account) => entry.account_id == account,
            };
            if !matches {
                continue;
            }

            let mut state = entry.shared.state.lock().expect("queue lock");
            let was_lagged = state.lagged;
            state.push(event.clone());
            if state.lagged && !was_lagged {
                warn!(
                    subscriber = entry.id,
                    dropped = state.dropped,
                    "subscriber queue overflowed, marking lagged"
                );
            }
            drop(state);
            entry.shared.notify.notify_one();
        }
    }

    /// Queue a batch in order, for a single scope each
    pub fn publish_all(&self, events: Vec<(Scope, Event)>) {
        for (scope, event) in events {
            self.publish(scope, event);
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().expect("bus lock");
        subscribers.retain(|e| !e.shared.state.lock().expect("queue lock").closed);
        subscribers.len()
    }
}

/// One subscriber's receiving end
pub struct Subscription {
    id: u64,
    account_id: AccountId,
    shared: Arc<Shared>,
}

impl Subscription {
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Await the next event
    ///
    /// Returns None once the subscription is closed and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            let notified = self.shared.notify.notified();
            {
                let mut state = self.shared.state.lock().expect("queue lock");
                if let Some(event) = state.queue.pop_front() {
                    return Some(event);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Pop the next event without waiting
    pub fn try_recv(&mut self) -> Option<Event> {
        self.shared.state.lock().expect("queue lock").queue.pop_front()
    }

    /// Read and clear the lag flag
    ///
    /// A true return means events were dropped since the last check and
    /// the transport should refresh from snapshots.
    pub fn take_lagged(&mut self) -> bool {
        let mut state = self.shared.state.lock().expect("queue lock");
        std::mem::take(&mut state.lagged)
    }

    /// Seed the queue directly, bypassing scope routing
    pub(crate) fn seed(&self, events: Vec<Event>) {
        let mut state = self.shared.state.lock().expect("queue lock");
        for event in events {
            state.push(event);
        }
        drop(state);
        self.shared.notify.notify_one();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.closed = true;
        }
        debug!(subscriber = self.id, "subscription dropped");
    }
}

//! Latest-value cache.
//!
//! Holds the most recently observed payload per topic, nothing older.
//! Exactly one writer per topic updates a slot (a wiring-level policy);
//! arbitrarily many readers may read it, and must tolerate the value
//! changing between successive reads.

use chainpulse_core::{Payload, Topic};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

struct Slot {
    value: Option<Payload>,
    seq: u64,
    present_tx: watch::Sender<bool>,
}

impl Slot {
    fn new() -> Self {
        let (present_tx, _) = watch::channel(false);
        Self {
            value: None,
            seq: 0,
            present_tx,
        }
    }
}

type SlotRef = Arc<RwLock<Slot>>;

/// Single-slot per-topic store of the most recent value.
///
/// Entries are created on first touch and never deleted. Each update
/// overwrites the slot in place and bumps a monotonically increasing
/// sequence number; readers never observe a torn write.
pub struct LatestValueCache {
    slots: DashMap<Topic, SlotRef>,
}

impl LatestValueCache {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    fn get_or_create(&self, topic: Topic) -> SlotRef {
        self.slots
            .entry(topic)
            .or_insert_with(|| Arc::new(RwLock::new(Slot::new())))
            .clone()
    }

    /// Overwrite the stored value for `topic` and bump its sequence number.
    ///
    /// The first update flips the topic's presence signal, waking any
    /// [`wait_present`](Self::wait_present) callers.
    pub fn update(&self, topic: Topic, value: Payload) -> u64 {
        let slot = self.get_or_create(topic);
        let mut guard = slot.write();
        guard.value = Some(value);
        guard.seq += 1;
        if guard.seq == 1 {
            debug!(%topic, "first value observed");
            let _ = guard.present_tx.send(true);
        }
        guard.seq
    }

    /// Read the current value and its sequence number.
    ///
    /// `None` until the first update.
    pub fn read(&self, topic: Topic) -> Option<(Payload, u64)> {
        let slot = self.slots.get(&topic)?.clone();
        let guard = slot.read();
        guard.value.clone().map(|value| (value, guard.seq))
    }

    /// Sequence number of the last update, 0 if never updated.
    pub fn seq(&self, topic: Topic) -> u64 {
        self.slots
            .get(&topic)
            .map(|slot| slot.read().seq)
            .unwrap_or(0)
    }

    /// Whether `topic` has been updated at least once.
    pub fn is_present(&self, topic: Topic) -> bool {
        self.seq(topic) > 0
    }

    /// Wait until `topic` has a value.
    ///
    /// Returns immediately if one is already present; otherwise suspends
    /// until the first update lands. This is the warm-up wait: it is
    /// unbounded, because a joiner has no other work before its
    /// dependency exists.
    pub async fn wait_present(&self, topic: Topic) {
        let mut rx = {
            let slot = self.get_or_create(topic);
            let guard = slot.read();
            if guard.value.is_some() {
                return;
            }
            guard.present_tx.subscribe()
        };

        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender lives inside the slot, which is never dropped.
                return;
            }
        }
    }
}

impl Default for LatestValueCache {
    fn default() -> Self {
        Self::new()
    }
}

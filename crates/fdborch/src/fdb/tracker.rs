//! Change tracker: per-key latest undelivered event for registered consumers.
//!
//! Every mark stamps the node with a fresh version from a global counter and
//! files it in a version-ordered pending index. The walker keeps a cursor
//! (`marker`) at the last version it has claimed, so a drain only ever looks
//! at versions above the cursor. A key marked again while pending moves to
//! the tail with its new version; a key marked after being claimed comes
//! back above the cursor and is picked up by a later drain.

use super::types::{FdbEventKind, FdbKey, FdbNotification};
use sonic_sai::BridgePortOid;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChangeNode {
    bridge_port: BridgePortOid,
    in_pending_set: bool,
    last_event: Option<FdbEventKind>,
    version: u64,
}

/// Why a deregistration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeregisterError {
    NotFound,
    /// The node's last event has not been drained yet
    StillPending,
}

#[derive(Debug, Default)]
pub struct ChangeTracker {
    nodes: BTreeMap<FdbKey, ChangeNode>,
    /// version -> key, pending nodes only
    pending: BTreeMap<u64, FdbKey>,
    version: u64,
    marker: u64,
    pending_count: usize,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `key`. Registering twice is a no-op success;
    /// the return value tells whether a node was created.
    pub fn register(&mut self, key: FdbKey, bridge_port: BridgePortOid) -> bool {
        if self.nodes.contains_key(&key) {
            return false;
        }
        self.nodes.insert(
            key,
            ChangeNode {
                bridge_port,
                in_pending_set: false,
                last_event: None,
                version: 0,
            },
        );
        true
    }

    pub fn deregister(&mut self, key: &FdbKey) -> Result<(), DeregisterError> {
        match self.nodes.get(key) {
            None => Err(DeregisterError::NotFound),
            Some(node) if node.in_pending_set => Err(DeregisterError::StillPending),
            Some(_) => {
                self.nodes.remove(key);
                Ok(())
            }
        }
    }

    pub fn is_registered(&self, key: &FdbKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn is_pending(&self, key: &FdbKey) -> bool {
        self.nodes.get(key).is_some_and(|n| n.in_pending_set)
    }

    pub fn registered_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    /// Records `event` for `key`, superseding any undelivered event.
    /// Returns false when nobody registered the key.
    pub fn mark_event(&mut self, key: &FdbKey, event: FdbEventKind, bridge_port: BridgePortOid) -> bool {
        let Some(node) = self.nodes.get_mut(key) else {
            return false;
        };

        if node.in_pending_set {
            self.pending.remove(&node.version);
        } else {
            node.in_pending_set = true;
            self.pending_count += 1;
        }

        self.version += 1;
        node.version = self.version;
        node.bridge_port = bridge_port;
        node.last_event = Some(event);
        self.pending.insert(self.version, *key);
        true
    }

    /// Claims up to `max` pending nodes above the cursor, oldest mark first.
    pub fn drain_batch(&mut self, max: usize) -> Vec<FdbNotification> {
        let mut batch = Vec::with_capacity(max.min(self.pending_count));

        while batch.len() < max {
            let Some((version, key)) = self.pending.pop_first() else {
                break;
            };
            debug_assert!(version > self.marker);
            self.marker = version;

            let Some(node) = self.nodes.get_mut(&key) else {
                continue;
            };
            node.in_pending_set = false;
            self.pending_count -= 1;

            if let Some(event) = node.last_event {
                batch.push(FdbNotification {
                    key,
                    bridge_port: node.bridge_port,
                    event,
                });
            }
        }

        batch
    }

    /// Last version claimed by [`ChangeTracker::drain_batch`].
    pub fn marker(&self) -> u64 {
        self.marker
    }
}

// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred release of cached resources.

use alloc::vec::Vec;

use crate::resource::ResourceKey;

/// Resources that are no longer referenced by any layer.
///
/// Damage computation decides *when* a cached resource becomes garbage but
/// never frees it: the renderer that created the resource drains this queue
/// on its own thread, with its own GPU context current.
#[derive(Clone, Debug, Default)]
pub struct ReleaseQueue {
    pending: Vec<ResourceKey>,
}

impl ReleaseQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Schedules `key` for release.
    pub fn schedule(&mut self, key: ResourceKey) {
        self.pending.push(key);
    }

    /// Number of resources awaiting release.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing awaits release.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Resources awaiting release, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[ResourceKey] {
        &self.pending
    }

    /// Removes and yields every pending resource, oldest first.
    pub fn drain(&mut self) -> alloc::vec::Drain<'_, ResourceKey> {
        self.pending.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn drain_yields_in_schedule_order() {
        let mut queue = ReleaseQueue::new();
        assert!(queue.is_empty());
        queue.schedule(ResourceKey(3));
        queue.schedule(ResourceKey(1));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pending(), &[ResourceKey(3), ResourceKey(1)]);

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained, [ResourceKey(3), ResourceKey(1)]);
        assert!(queue.is_empty());
    }
}

use indexmap::IndexMap;

use crate::aodv_interface::{NodeId, Tick};

/// What a node knows about one directly reachable peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborRecord {
    pub neighbor_id: NodeId,
    /// Last tick a message from this neighbor was actually received
    pub last_seen: Tick,
    /// Last tick a Hello was addressed to this neighbor
    pub last_hello_sent: Tick,
}

impl NeighborRecord {
    pub fn new(neighbor_id: NodeId, now: Tick) -> Self {
        Self {
            neighbor_id,
            last_seen: now,
            last_hello_sent: now,
        }
    }

    pub fn is_expired(&self, now: Tick, connection_timeout: Tick) -> bool {
        self.last_seen.saturating_add(connection_timeout) < now
    }

    /// Neither side has spoken on this relationship for longer than `hello_interval`.
    pub fn needs_hello(&self, now: Tick, hello_interval: Tick) -> bool {
        self.last_hello_sent.max(self.last_seen).saturating_add(hello_interval) < now
    }
}

/// Neighbor records of one node, iterated in discovery order.
#[derive(Debug, Clone, Default)]
pub struct NeighborTable {
    records: IndexMap<NodeId, NeighborRecord>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, neighbor: &NodeId) -> bool {
        self.records.contains_key(neighbor)
    }

    pub fn get(&self, neighbor: &NodeId) -> Option<&NeighborRecord> {
        self.records.get(neighbor)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.records.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &NeighborRecord> {
        self.records.values()
    }

    /// Record that a message from `neighbor` arrived at `now`.
    ///
    /// Returns true if the neighbor was not known before.
    pub fn observe(&mut self, neighbor: NodeId, now: Tick) -> bool {
        match self.records.get_mut(&neighbor) {
            Some(record) => {
                record.last_seen = record.last_seen.max(now);
                false
            }
            None => {
                self.records.insert(neighbor, NeighborRecord::new(neighbor, now));
                true
            }
        }
    }

    /// Drop every neighbor silent for longer than `connection_timeout`.
    pub fn evict_expired(&mut self, now: Tick, connection_timeout: Tick) -> Vec<NodeId> {
        let lost: Vec<NodeId> = self
            .records
            .values()
            .filter(|r| r.is_expired(now, connection_timeout))
            .map(|r| r.neighbor_id)
            .collect();

        for id in &lost {
            self.records.shift_remove(id);
        }

        lost
    }

    /// Neighbors due a unicast Hello. Marks each as greeted at `now`.
    pub fn take_due_hellos(&mut self, now: Tick, hello_interval: Tick) -> Vec<NodeId> {
        self.records
            .values_mut()
            .filter(|r| r.needs_hello(now, hello_interval))
            .map(|r| {
                r.last_hello_sent = now;
                r.neighbor_id
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_creates_then_refreshes() {
        let mut table = NeighborTable::new();

        assert!(table.observe(3, 5));
        assert_eq!(
            table.get(&3),
            Some(&NeighborRecord {
                neighbor_id: 3,
                last_seen: 5,
                last_hello_sent: 5
            })
        );

        assert!(!table.observe(3, 8));
        let record = table.get(&3).unwrap();
        assert_eq!(record.last_seen, 8);
        assert_eq!(record.last_hello_sent, 5);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_eviction_boundary() {
        let mut table = NeighborTable::new();
        table.observe(1, 10);

        // last_seen + timeout == now is still alive
        assert!(table.evict_expired(14, 4).is_empty());
        assert!(table.contains(&1));

        assert_eq!(table.evict_expired(15, 4), vec![1]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_due_hellos() {
        let mut table = NeighborTable::new();
        table.observe(1, 0);
        table.observe(2, 2);

        // 1 is due (0 + 1 < 2), 2 was just heard
        assert_eq!(table.take_due_hellos(2, 1), vec![1]);
        assert_eq!(table.get(&1).unwrap().last_hello_sent, 2);

        // greeting resets the clock
        assert!(table.take_due_hellos(3, 1).is_empty());
        assert_eq!(table.take_due_hellos(4, 1), vec![1, 2]);
    }

    #[test]
    fn test_huge_timeouts_do_not_overflow() {
        let record = NeighborRecord::new(1, 10);
        assert!(!record.is_expired(u64::MAX, Tick::MAX));
        assert!(!record.needs_hello(u64::MAX, Tick::MAX));
        assert!(record.needs_hello(12, 1));
    }

    #[test]
    fn test_discovery_order_preserved() {
        let mut table = NeighborTable::new();
        table.observe(7, 0);
        table.observe(2, 0);
        table.observe(5, 0);
        table.evict_expired(0, 4);

        assert_eq!(table.ids().collect::<Vec<_>>(), vec![7, 2, 5]);
    }
}

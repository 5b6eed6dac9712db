use std::collections::BTreeMap;

use hashbrown::HashSet;

use crate::aodv_interface::{NodeId, SeqNo, Tick};

/// Best known path to one destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub destination_id: NodeId,
    pub destination_seq: SeqNo,
    pub seq_is_valid: bool,
    pub hop_count: u32,
    pub next_hop: NodeId,
    /// Neighbors known to forward through this node toward `destination_id`
    pub precursors: HashSet<NodeId>,
    pub expires_at: Tick,
}

/// Route information carried by an incoming RouteRequest or RouteReply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteAdvertisement {
    pub destination: NodeId,
    pub destination_seq: SeqNo,
    /// Hop count as carried by the message, before counting the last hop
    pub hop_count: u32,
    pub next_hop: NodeId,
    pub expires_at: Tick,
}

impl RouteAdvertisement {
    fn hops_via_sender(&self) -> u32 {
        self.hop_count.saturating_add(1)
    }
}

/// Replace-iff rule: no entry yet, a strictly newer sequence number, or the
/// same sequence number over strictly fewer hops.
pub fn should_replace(existing: Option<&Route>, advert: &RouteAdvertisement) -> bool {
    match existing {
        None => true,
        Some(route) => {
            advert.destination_seq > route.destination_seq
                || (advert.destination_seq == route.destination_seq
                    && advert.hops_via_sender() < route.hop_count)
        }
    }
}

/// One entry per known destination, superseded in place.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: BTreeMap<NodeId, Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, destination: &NodeId) -> Option<&Route> {
        self.routes.get(destination)
    }

    pub fn get_mut(&mut self, destination: &NodeId) -> Option<&mut Route> {
        self.routes.get_mut(destination)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Usable route with a sequence number at least as fresh as `min_seq`.
    pub fn fresh_route(&self, destination: &NodeId, min_seq: SeqNo) -> Option<&Route> {
        self.routes
            .get(destination)
            .filter(|r| r.seq_is_valid && r.destination_seq >= min_seq)
    }

    /// Apply an advertisement under the replace-iff rule.
    ///
    /// Returns true if the entry was created or replaced. Precursors of a
    /// superseded entry are carried over.
    pub fn update(&mut self, advert: RouteAdvertisement) -> bool {
        let existing = self.routes.get(&advert.destination);
        if !should_replace(existing, &advert) {
            return false;
        }

        let precursors = existing.map(|r| r.precursors.clone()).unwrap_or_default();
        self.routes.insert(
            advert.destination,
            Route {
                destination_id: advert.destination,
                destination_seq: advert.destination_seq,
                seq_is_valid: true,
                hop_count: advert.hops_via_sender(),
                next_hop: advert.next_hop,
                precursors,
                expires_at: advert.expires_at,
            },
        );
        true
    }

    /// Mark the route to `destination` unusable. Returns true if a valid
    /// route was invalidated.
    pub fn invalidate(&mut self, destination: &NodeId) -> bool {
        match self.routes.get_mut(destination) {
            Some(route) if route.seq_is_valid => {
                route.seq_is_valid = false;
                true
            }
            _ => false,
        }
    }

    /// Invalidate every route forwarding through `neighbor`.
    pub fn invalidate_via(&mut self, neighbor: &NodeId) -> Vec<NodeId> {
        let mut invalidated = Vec::new();
        for route in self.routes.values_mut() {
            if route.next_hop == *neighbor && route.seq_is_valid {
                route.seq_is_valid = false;
                invalidated.push(route.destination_id);
            }
        }
        invalidated
    }

    /// Invalidate every valid route whose lifetime ended before `now`.
    pub fn expire(&mut self, now: Tick) -> Vec<NodeId> {
        let mut expired = Vec::new();
        for route in self.routes.values_mut() {
            if route.seq_is_valid && route.expires_at < now {
                route.seq_is_valid = false;
                expired.push(route.destination_id);
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advert(destination: NodeId, seq: SeqNo, hops: u32, next_hop: NodeId) -> RouteAdvertisement {
        RouteAdvertisement {
            destination,
            destination_seq: seq,
            hop_count: hops,
            next_hop,
            expires_at: 10,
        }
    }

    #[test]
    fn test_first_advertisement_creates_route() {
        let mut table = RoutingTable::new();
        assert!(table.update(advert(4, 2, 0, 1)));

        let route = table.get(&4).unwrap();
        assert_eq!(route.hop_count, 1);
        assert_eq!(route.next_hop, 1);
        assert_eq!(route.destination_seq, 2);
        assert!(route.seq_is_valid);
    }

    #[test]
    fn test_replacement_is_monotonic() {
        let mut table = RoutingTable::new();
        table.update(advert(4, 5, 2, 1));
        let before = table.get(&4).unwrap().clone();

        // older sequence number, even with fewer hops
        assert!(!table.update(advert(4, 4, 0, 2)));
        // same sequence number, same hop count
        assert!(!table.update(advert(4, 5, 2, 2)));
        // same sequence number, worse hop count
        assert!(!table.update(advert(4, 5, 6, 2)));

        assert_eq!(table.get(&4).unwrap(), &before);
    }

    #[test]
    fn test_newer_or_shorter_replaces() {
        let mut table = RoutingTable::new();
        table.update(advert(4, 5, 2, 1));

        assert!(table.update(advert(4, 5, 1, 2)));
        assert_eq!(table.get(&4).unwrap().hop_count, 2);
        assert_eq!(table.get(&4).unwrap().next_hop, 2);

        // newer sequence number wins even over more hops
        assert!(table.update(advert(4, 6, 9, 3)));
        assert_eq!(table.get(&4).unwrap().hop_count, 10);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_precursors_survive_replacement() {
        let mut table = RoutingTable::new();
        table.update(advert(4, 1, 0, 1));
        table.get_mut(&4).unwrap().precursors.insert(9);

        table.update(advert(4, 2, 0, 1));
        assert!(table.get(&4).unwrap().precursors.contains(&9));
    }

    #[test]
    fn test_fresh_route_lookup() {
        let mut table = RoutingTable::new();
        table.update(advert(4, 5, 1, 1));

        assert!(table.fresh_route(&4, 5).is_some());
        assert!(table.fresh_route(&4, 6).is_none());

        assert!(table.invalidate(&4));
        assert!(!table.invalidate(&4));
        assert!(table.fresh_route(&4, 0).is_none());
    }

    #[test]
    fn test_expiry_and_link_break() {
        let mut table = RoutingTable::new();
        table.update(RouteAdvertisement {
            expires_at: 3,
            ..advert(1, 1, 0, 1)
        });
        table.update(advert(2, 1, 1, 1));
        table.update(advert(3, 1, 0, 3));

        assert!(table.expire(3).is_empty());
        assert_eq!(table.expire(4), vec![1]);

        assert_eq!(table.invalidate_via(&1), vec![2]);
        assert!(table.get(&3).unwrap().seq_is_valid);
        assert_eq!(table.len(), 3);
    }
}

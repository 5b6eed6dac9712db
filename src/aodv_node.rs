use std::collections::VecDeque;
use std::fmt;

use log::{debug, trace};

use crate::aodv_config::ProtocolConfig;
use crate::aodv_handlers;
use crate::aodv_interface::{
    Location, Message, MessageEnvelope, NodeId, ReceivedMessage, RequestId, RouteRequest, SeqNo,
    Tick,
};
use crate::aodv_neighbors::NeighborTable;
use crate::aodv_routes::RoutingTable;

/// Result of one update pass of a node.
#[derive(Debug, Default, PartialEq)]
pub struct NodeUpdate {
    pub outgoing: Vec<MessageEnvelope>,
    pub neighbors_added: Vec<NodeId>,
    pub neighbors_lost: Vec<NodeId>,
}

/// One network participant: its neighbor and routing tables plus the
/// messages delivered to it since its last update.
pub struct Node {
    pub(crate) id: NodeId,
    location: Location,
    pub(crate) neighbors: NeighborTable,
    pub(crate) routing_table: RoutingTable,
    pub(crate) own_seq: SeqNo,
    next_request_id: RequestId,
    inbound: VecDeque<ReceivedMessage>,
    last_hello_broadcast: Option<Tick>,
}

impl Node {
    pub fn new(id: NodeId, location: Location) -> Self {
        Self {
            id,
            location,
            neighbors: NeighborTable::new(),
            routing_table: RoutingTable::new(),
            own_seq: 0,
            next_request_id: 0,
            inbound: VecDeque::new(),
            last_hello_broadcast: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    pub fn own_seq(&self) -> SeqNo {
        self.own_seq
    }

    pub fn last_hello_broadcast(&self) -> Option<Tick> {
        self.last_hello_broadcast
    }

    pub fn pending_messages(&self) -> usize {
        self.inbound.len()
    }

    /// Buffer a delivered message for the next update pass.
    pub fn receive(&mut self, sender: NodeId, message: Message) {
        self.inbound.push_back(ReceivedMessage { sender, message });
    }

    /// Neighbor maintenance followed by handling of every buffered message,
    /// in arrival order. The inbound buffer is empty afterwards.
    pub fn update(&mut self, now: Tick, config: &ProtocolConfig) -> NodeUpdate {
        let mut update = self.maintain_neighbors(now, config);

        while let Some(received) = self.inbound.pop_front() {
            if let Some(response) = aodv_handlers::dispatch(self, now, &received, config) {
                update.outgoing.push(response);
            }
        }

        update
    }

    /// Build the first RouteRequest of a discovery for `destination`.
    ///
    /// The request is broadcast; `None` if `destination` is this node.
    pub fn start_route_discovery(&mut self, destination: NodeId) -> Option<MessageEnvelope> {
        if destination == self.id {
            return None;
        }

        self.own_seq += 1;
        self.next_request_id += 1;

        let destination_seq = self
            .routing_table
            .get(&destination)
            .map_or(0, |r| r.destination_seq);

        Some(MessageEnvelope::broadcast(
            self.id,
            Message::RouteRequest(RouteRequest {
                request_id: self.next_request_id,
                destination,
                destination_seq,
                originator: self.id,
                originator_seq: self.own_seq,
                hop_count: 0,
            }),
        ))
    }

    fn maintain_neighbors(&mut self, now: Tick, config: &ProtocolConfig) -> NodeUpdate {
        let mut update = NodeUpdate::default();

        for received in &self.inbound {
            if self.neighbors.observe(received.sender, now) {
                update.neighbors_added.push(received.sender);
            }
        }

        update.neighbors_lost = self.neighbors.evict_expired(now, config.connection_timeout);
        for lost in &update.neighbors_lost {
            let broken = self.routing_table.invalidate_via(lost);
            if !broken.is_empty() {
                debug!(
                    "node {}: link to {} lost, routes to {:?} invalidated",
                    self.id, lost, broken
                );
            }
        }

        let expired = self.routing_table.expire(now);
        if !expired.is_empty() {
            trace!("node {}: routes to {:?} expired", self.id, expired);
        }

        if self.neighbors.is_empty() {
            let due = self
                .last_hello_broadcast
                .map_or(true, |last| now > last.saturating_add(config.hello_interval));
            if due {
                update.outgoing.push(MessageEnvelope::broadcast(
                    self.id,
                    Message::Hello { sender: self.id },
                ));
                self.last_hello_broadcast = Some(now);
            }
        } else {
            for neighbor in self.neighbors.take_due_hellos(now, config.hello_interval) {
                update.outgoing.push(MessageEnvelope::unicast(
                    self.id,
                    neighbor,
                    Message::Hello { sender: self.id },
                ));
            }
        }

        update
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let neighbors: Vec<NodeId> = self.neighbors.ids().collect();
        let routes: Vec<String> = self
            .routing_table
            .iter()
            .map(|r| {
                format!(
                    "{}via{}/{}{}",
                    r.destination_id,
                    r.next_hop,
                    r.hop_count,
                    if r.seq_is_valid { "" } else { "!" }
                )
            })
            .collect();
        write!(
            f,
            "Node #{}: [ location: {}, neighbors: {:?}, routes: {:?}, last_hello: {:?} ]",
            self.id, self.location, neighbors, routes, self.last_hello_broadcast
        )
    }
}

//! Per-message-kind protocol handlers.
//!
//! Each handler is a plain function over the receiving node's state. The
//! table below fixes both the capability of each handler and the order in
//! which they are consulted; a message is handled by the first (and only)
//! entry whose kind matches its own.

use log::debug;

use crate::aodv_config::ProtocolConfig;
use crate::aodv_interface::{
    Message, MessageEnvelope, MessageKind, ReceivedMessage, RouteReply, RouteRequest, Tick,
};
use crate::aodv_node::Node;
use crate::aodv_routes::RouteAdvertisement;

pub type Handler = fn(&mut Node, Tick, &ReceivedMessage, &ProtocolConfig) -> Option<MessageEnvelope>;

pub const HANDLERS: [(MessageKind, Handler); 4] = [
    (MessageKind::Hello, handle_hello),
    (MessageKind::RouteRequest, handle_route_request),
    (MessageKind::RouteReply, handle_route_reply),
    (MessageKind::RouteError, handle_route_error),
];

/// Hand `received` to the handler for its kind. Returns the single
/// outbound message that handler produced, if any.
pub fn dispatch(
    node: &mut Node,
    now: Tick,
    received: &ReceivedMessage,
    config: &ProtocolConfig,
) -> Option<MessageEnvelope> {
    let kind = received.message.kind();
    HANDLERS
        .iter()
        .find(|(handles, _)| *handles == kind)
        .and_then(|(_, handler)| handler(node, now, received, config))
}

pub fn handle_hello(
    node: &mut Node,
    now: Tick,
    received: &ReceivedMessage,
    _config: &ProtocolConfig,
) -> Option<MessageEnvelope> {
    let Message::Hello { .. } = received.message else {
        return None;
    };

    node.neighbors.observe(received.sender, now);
    None
}

pub fn handle_route_request(
    node: &mut Node,
    now: Tick,
    received: &ReceivedMessage,
    config: &ProtocolConfig,
) -> Option<MessageEnvelope> {
    let Message::RouteRequest(request) = &received.message else {
        return None;
    };
    let sender = received.sender;

    // our own request flooded back to us
    if request.originator == node.id {
        return None;
    }

    let improved = node.routing_table.update(RouteAdvertisement {
        destination: request.originator,
        destination_seq: request.originator_seq,
        hop_count: request.hop_count,
        next_hop: sender,
        expires_at: now.saturating_add(config.reverse_route_expiration_period),
    });

    // a copy that did not improve the reverse route is stale
    if !improved {
        debug!(
            "node {}: discarding stale request {} of node {} from {}",
            node.id, request.request_id, request.originator, sender
        );
        return None;
    }

    if request.destination == node.id {
        node.own_seq += 1;
        let reply = RouteReply {
            destination: node.id,
            destination_seq: node.own_seq,
            originator: request.originator,
            originator_seq: request.originator_seq,
            hop_count: 0,
            lifetime: config.route_expiration_period,
        };
        return Some(MessageEnvelope::unicast(
            node.id,
            sender,
            Message::RouteReply(reply),
        ));
    }

    if let Some(cached) = node
        .routing_table
        .fresh_route(&request.destination, request.destination_seq)
    {
        let reply = RouteReply {
            destination: request.destination,
            destination_seq: cached.destination_seq,
            originator: request.originator,
            originator_seq: request.originator_seq,
            hop_count: cached.hop_count.saturating_add(1),
            lifetime: config.route_expiration_period,
        };
        return Some(MessageEnvelope::unicast(
            node.id,
            sender,
            Message::RouteReply(reply),
        ));
    }

    let recipients: Vec<_> = node.neighbors.ids().filter(|n| *n != sender).collect();
    if recipients.is_empty() {
        debug!(
            "node {}: no neighbor left to forward request {} of node {}",
            node.id, request.request_id, request.originator
        );
        return None;
    }

    Some(MessageEnvelope {
        sender: node.id,
        recipients,
        message: Message::RouteRequest(RouteRequest {
            hop_count: request.hop_count.saturating_add(1),
            ..request.clone()
        }),
    })
}

pub fn handle_route_reply(
    node: &mut Node,
    now: Tick,
    received: &ReceivedMessage,
    config: &ProtocolConfig,
) -> Option<MessageEnvelope> {
    let Message::RouteReply(reply) = &received.message else {
        return None;
    };
    let sender = received.sender;

    if reply.destination != node.id {
        let improved = node.routing_table.update(RouteAdvertisement {
            destination: reply.destination,
            destination_seq: reply.destination_seq,
            hop_count: reply.hop_count,
            next_hop: sender,
            expires_at: now.saturating_add(reply.lifetime),
        });
        if !improved {
            debug!(
                "node {}: discarding stale reply for node {} from {}",
                node.id, reply.destination, sender
            );
            return None;
        }
    }

    if reply.originator == node.id {
        return None;
    }

    let forward_hop = node
        .routing_table
        .get(&reply.destination)
        .map_or(sender, |r| r.next_hop);

    let Some(reverse) = node.routing_table.get_mut(&reply.originator) else {
        debug!(
            "node {}: dropping reply for node {}, no reverse route",
            node.id, reply.originator
        );
        return None;
    };
    reverse.expires_at = reverse
        .expires_at
        .max(now.saturating_add(config.active_timeout_period));
    reverse.precursors.insert(forward_hop);
    let back_hop = reverse.next_hop;

    if let Some(forward) = node.routing_table.get_mut(&reply.destination) {
        forward.precursors.insert(back_hop);
    }

    Some(MessageEnvelope::unicast(
        node.id,
        back_hop,
        Message::RouteReply(RouteReply {
            hop_count: reply.hop_count.saturating_add(1),
            ..reply.clone()
        }),
    ))
}

pub fn handle_route_error(
    node: &mut Node,
    _now: Tick,
    received: &ReceivedMessage,
    _config: &ProtocolConfig,
) -> Option<MessageEnvelope> {
    let Message::RouteError(error) = &received.message else {
        return None;
    };

    if node.routing_table.invalidate(&error.unreachable_destination) {
        debug!(
            "node {}: route to {} invalidated by node {}",
            node.id, error.unreachable_destination, received.sender
        );
    }
    None
}

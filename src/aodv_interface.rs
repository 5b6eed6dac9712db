use std::fmt;

use serde::{Deserialize, Serialize};

// dense registry index, assigned from 0 in creation order
pub type NodeId = usize;

/// The only notion of simulated time.
pub type Tick = u64;

/// Freshness counter carried by routes and protocol messages (higher is newer).
pub type SeqNo = u64;

pub type RequestId = u64;

/// Fixed 2-D position of a node.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two locations.
    pub fn distance(&self, other: &Location) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Protocol Messages
// ============================================================================

/// Flooded to discover a route to `destination`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub request_id: RequestId,
    pub destination: NodeId,
    /// Last destination sequence number known to the originator
    pub destination_seq: SeqNo,
    pub originator: NodeId,
    pub originator_seq: SeqNo,
    pub hop_count: u32,
}

/// Sent backward, hop by hop, along the reverse path of a RouteRequest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteReply {
    pub destination: NodeId,
    pub destination_seq: SeqNo,
    pub originator: NodeId,
    pub originator_seq: SeqNo,
    pub hop_count: u32,
    /// Ticks the receiver may keep the forward route
    pub lifetime: Tick,
}

/// Announces that a destination has become unreachable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteError {
    pub unreachable_destination: NodeId,
    pub unreachable_seq: SeqNo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum Message {
    Hello { sender: NodeId },
    RouteRequest(RouteRequest),
    RouteReply(RouteReply),
    RouteError(RouteError),
}

/// Discriminant of a [`Message`], used to select its handler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Hello,
    RouteRequest,
    RouteReply,
    RouteError,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Hello { .. } => MessageKind::Hello,
            Message::RouteRequest(_) => MessageKind::RouteRequest,
            Message::RouteReply(_) => MessageKind::RouteReply,
            Message::RouteError(_) => MessageKind::RouteError,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Hello { sender } => write!(f, "(HELLO) [ SID: {} ]", sender),
            Message::RouteRequest(m) => write!(
                f,
                "(RREQ) [ RID: {}, DID: {}, DSN: {}, OID: {}, OSN: {}, HC: {} ]",
                m.request_id,
                m.destination,
                m.destination_seq,
                m.originator,
                m.originator_seq,
                m.hop_count
            ),
            Message::RouteReply(m) => write!(
                f,
                "(RREP) [ DID: {}, DSN: {}, OID: {}, OSN: {}, HC: {}, LT: {} ]",
                m.destination,
                m.destination_seq,
                m.originator,
                m.originator_seq,
                m.hop_count,
                m.lifetime
            ),
            Message::RouteError(m) => write!(
                f,
                "(RERR) [ UDID: {}, UDSN: {} ]",
                m.unreachable_destination, m.unreachable_seq
            ),
        }
    }
}

/// A message together with the node that sends it and whom it is for.
///
/// An empty `recipients` list means "everyone who can hear the sender". The
/// network interprets it, the sender never expands it.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageEnvelope {
    pub sender: NodeId,
    pub recipients: Vec<NodeId>,
    pub message: Message,
}

impl MessageEnvelope {
    pub fn broadcast(sender: NodeId, message: Message) -> Self {
        Self {
            sender,
            recipients: Vec::new(),
            message,
        }
    }

    pub fn unicast(sender: NodeId, recipient: NodeId, message: Message) -> Self {
        Self {
            sender,
            recipients: vec![recipient],
            message,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.recipients.is_empty()
    }
}

/// A message sitting in a node's inbound buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedMessage {
    pub sender: NodeId,
    pub message: Message,
}

// ============================================================================
// Simulation Events
// ============================================================================

/// One record of the simulation trace.
///
/// Events are immutable once created. The scheduler orders them by `time`,
/// breaking ties by creation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum Event {
    ConnectionEstablished {
        time: Tick,
        node: NodeId,
        peer: NodeId,
    },
    ConnectionLost {
        time: Tick,
        node: NodeId,
        peer: NodeId,
    },
    TransmissionScheduled {
        time: Tick,
        sender: NodeId,
        recipients: Vec<NodeId>,
        message: Message,
    },
    MessageReceived {
        time: Tick,
        sender: NodeId,
        recipient: NodeId,
        message: Message,
    },
    PacketLost {
        time: Tick,
        sender: NodeId,
        recipient: NodeId,
        message: Message,
    },
    /// An originator starts looking for a route (external traffic)
    RouteDiscoveryStarted {
        time: Tick,
        originator: NodeId,
        destination: NodeId,
    },
}

impl Event {
    pub fn time(&self) -> Tick {
        match self {
            Event::ConnectionEstablished { time, .. }
            | Event::ConnectionLost { time, .. }
            | Event::TransmissionScheduled { time, .. }
            | Event::MessageReceived { time, .. }
            | Event::PacketLost { time, .. }
            | Event::RouteDiscoveryStarted { time, .. } => *time,
        }
    }

    /// Short name of the event kind, as written in traces.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::ConnectionEstablished { .. } => "ConnectionEstablished",
            Event::ConnectionLost { .. } => "ConnectionLost",
            Event::TransmissionScheduled { .. } => "TransmissionScheduled",
            Event::MessageReceived { .. } => "MessageReceived",
            Event::PacketLost { .. } => "PacketLost",
            Event::RouteDiscoveryStarted { .. } => "RouteDiscoveryStarted",
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            Event::TransmissionScheduled { message, .. }
            | Event::MessageReceived { message, .. }
            | Event::PacketLost { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ConnectionEstablished { time, node, peer } => write!(
                f,
                "(T = {}) - [New Connection] - Node {} established connection with node {}.",
                time, node, peer
            ),
            Event::ConnectionLost { time, node, peer } => write!(
                f,
                "(T = {}) - [Connection Lost] - Node {} lost connection with node {}.",
                time, node, peer
            ),
            Event::TransmissionScheduled {
                time,
                sender,
                recipients,
                message,
            } => {
                if recipients.is_empty() {
                    write!(
                        f,
                        "(T = {}) - [Transmission Event | {} )-> ALL ] ---> Message: {}",
                        time, sender, message
                    )
                } else {
                    write!(
                        f,
                        "(T = {}) - [Transmission Event | {} )-> {:?} ] ---> Message: {}",
                        time, sender, recipients, message
                    )
                }
            }
            Event::MessageReceived {
                time,
                sender,
                recipient,
                message,
            } => write!(
                f,
                "(T = {}) - [Reception Event | {} ->( {} ] ---> Message: {}",
                time, sender, recipient, message
            ),
            Event::PacketLost {
                time,
                sender,
                recipient,
                message,
            } => write!(
                f,
                "(T = {}) - [Packet Loss Event | {} -X- {} ] ---> Message: {}",
                time, sender, recipient, message
            ),
            Event::RouteDiscoveryStarted {
                time,
                originator,
                destination,
            } => write!(
                f,
                "(T = {}) - [Route Discovery] - Node {} looking for node {}.",
                time, originator, destination
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_distance() {
        let a = Location::new(3.0, 2.0);
        let b = Location::new(6.0, 6.0);

        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_message_kind() {
        assert_eq!(Message::Hello { sender: 1 }.kind(), MessageKind::Hello);
        assert_eq!(
            Message::RouteError(RouteError {
                unreachable_destination: 2,
                unreachable_seq: 7,
            })
            .kind(),
            MessageKind::RouteError
        );
    }

    #[test]
    fn test_event_trace_round_trip() {
        let trace = vec![
            Event::TransmissionScheduled {
                time: 0,
                sender: 0,
                recipients: vec![],
                message: Message::Hello { sender: 0 },
            },
            Event::MessageReceived {
                time: 1,
                sender: 0,
                recipient: 1,
                message: Message::RouteRequest(RouteRequest {
                    request_id: 1,
                    destination: 2,
                    destination_seq: 0,
                    originator: 0,
                    originator_seq: 1,
                    hop_count: 0,
                }),
            },
            Event::PacketLost {
                time: 2,
                sender: 1,
                recipient: 0,
                message: Message::RouteReply(RouteReply {
                    destination: 2,
                    destination_seq: 1,
                    originator: 0,
                    originator_seq: 1,
                    hop_count: 1,
                    lifetime: 3,
                }),
            },
            Event::ConnectionEstablished {
                time: 2,
                node: 1,
                peer: 0,
            },
        ];

        let yaml = serde_yaml::to_string(&trace).unwrap();
        assert!(yaml.contains("event_type: TransmissionScheduled"));
        assert!(yaml.contains("message_type: RouteRequest"));

        let parsed: Vec<Event> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, trace);
    }

    #[test]
    fn test_event_display() {
        let event = Event::ConnectionEstablished {
            time: 2,
            node: 1,
            peer: 0,
        };
        assert_eq!(
            event.to_string(),
            "(T = 2) - [New Connection] - Node 1 established connection with node 0."
        );

        let broadcast = Event::TransmissionScheduled {
            time: 0,
            sender: 3,
            recipients: vec![],
            message: Message::Hello { sender: 3 },
        };
        assert!(broadcast.to_string().contains("3 )-> ALL"));
        assert_eq!(broadcast.time(), 0);
        assert_eq!(broadcast.kind_name(), "TransmissionScheduled");
    }
}

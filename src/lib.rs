//! # aodv-sim - Ad hoc On-Demand Distance Vector simulation
//!
//! A discrete-event simulator for mobile ad hoc networks running a reduced
//! AODV protocol. Nodes sit at fixed 2D locations; whether two nodes can hear
//! each other, and how reliably, depends only on the distance between them.
//!
//! ## Core Components
//!
//! - **Network**: owns nodes, links and the global event queue, and runs the simulation
//! - **Node**: per-node protocol engine (neighbor discovery, routing table, message handling)
//! - **Link**: distance-based reception model between a pair of nodes
//! - **Handlers**: one handler per message kind, dispatched through a fixed table
//!
//! ## Usage
//!
//! ```no_run
//! use aodv_sim::Network;
//!
//! // five nodes on a grid, fixed seed for a reproducible trace
//! let mut network = Network::new(5, 0.1, Some([1u8; 32])).unwrap();
//! network.schedule_route_discovery(4, 0, 4);
//!
//! for event in network.execute(20) {
//!     println!("{}", event);
//! }
//! ```
//!
//! ## Scenarios
//!
//! The `scenario_runner` binary in `simulator/` loads YAML scenario files,
//! runs them and prints a summary of the resulting trace.

// Protocol
pub mod aodv_interface;
pub mod aodv_config;
pub mod aodv_neighbors;
pub mod aodv_routes;
pub mod aodv_handlers;
pub mod aodv_node;

// Simulation
pub mod aodv_link;
pub mod aodv_event_queue;
pub mod aodv_network;

// Re-export commonly used types
pub use aodv_config::{ConfigError, Placement, ProtocolConfig, SimConfig};
pub use aodv_interface::{
    Event, Location, Message, MessageEnvelope, MessageKind, NodeId, RequestId, RouteError,
    RouteReply, RouteRequest, SeqNo, Tick,
};
pub use aodv_link::Link;
pub use aodv_network::Network;
pub use aodv_node::{Node, NodeUpdate};
pub use aodv_routes::{Route, RoutingTable};

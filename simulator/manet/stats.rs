//! Statistics and results for the MANET simulator

use std::collections::BTreeMap;

use aodv_sim::{Event, MessageKind, Network, NodeId, Tick};

/// Simulation result
#[derive(Debug)]
pub struct SimResult {
    /// Seed used for the simulation
    pub seed_used: [u8; 32],

    pub node_count: usize,

    /// Horizon the run was given
    pub max_ticks: Tick,

    /// Counters over the recorded trace
    pub trace: TraceSummary,

    /// Outcome of every requested route discovery
    pub discoveries: Vec<DiscoveryOutcome>,

    /// Valid routes per node at the end of the run
    pub routes_per_node: BTreeMap<NodeId, usize>,
}

/// Event counters over one trace
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TraceSummary {
    pub total_events: usize,
    pub last_time: Tick,

    pub transmissions: usize,
    pub broadcasts: usize,
    pub receptions: usize,
    pub losses: usize,

    pub connections_established: usize,
    pub connections_lost: usize,
    pub route_discoveries: usize,

    /// Transmissions per message kind
    pub hello: usize,
    pub route_request: usize,
    pub route_reply: usize,
    pub route_error: usize,
}

impl TraceSummary {
    pub fn from_events(events: &[Event]) -> Self {
        let mut summary = Self {
            total_events: events.len(),
            last_time: events.last().map_or(0, Event::time),
            ..Default::default()
        };

        for event in events {
            match event {
                Event::TransmissionScheduled {
                    recipients,
                    message,
                    ..
                } => {
                    summary.transmissions += 1;
                    if recipients.is_empty() {
                        summary.broadcasts += 1;
                    }
                    match message.kind() {
                        MessageKind::Hello => summary.hello += 1,
                        MessageKind::RouteRequest => summary.route_request += 1,
                        MessageKind::RouteReply => summary.route_reply += 1,
                        MessageKind::RouteError => summary.route_error += 1,
                    }
                }
                Event::MessageReceived { .. } => summary.receptions += 1,
                Event::PacketLost { .. } => summary.losses += 1,
                Event::ConnectionEstablished { .. } => summary.connections_established += 1,
                Event::ConnectionLost { .. } => summary.connections_lost += 1,
                Event::RouteDiscoveryStarted { .. } => summary.route_discoveries += 1,
            }
        }

        summary
    }

    /// Fraction of in-range deliveries that were not lost
    pub fn delivery_ratio(&self) -> Option<f64> {
        let attempts = self.receptions + self.losses;
        if attempts == 0 {
            None
        } else {
            Some(self.receptions as f64 / attempts as f64)
        }
    }
}

/// Whether the originator of a discovery ended up with a usable route
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOutcome {
    pub at: Tick,
    pub from: NodeId,
    pub to: NodeId,
    /// `(next_hop, hop_count)` of the final route, if valid
    pub route: Option<(NodeId, u32)>,
}

impl DiscoveryOutcome {
    pub fn from_network(network: &Network, at: Tick, from: NodeId, to: NodeId) -> Self {
        let route = network
            .node(from)
            .and_then(|node| node.routing_table().get(&to))
            .filter(|route| route.seq_is_valid)
            .map(|route| (route.next_hop, route.hop_count));

        Self { at, from, to, route }
    }
}

impl SimResult {
    /// Print a summary of the simulation results
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        MANET Simulation Results                        ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Seed: {:?}", self.seed_used);
        println!("  Nodes: {}", self.node_count);
        println!("  Max ticks: {}", self.max_ticks);
        println!("  Last event at: {}\n", self.trace.last_time);

        println!("Event Statistics:");
        println!("  Total events: {}", self.trace.total_events);
        println!(
            "  Transmissions: {} ({} broadcast)",
            self.trace.transmissions, self.trace.broadcasts
        );
        println!("  Receptions: {}", self.trace.receptions);
        println!("  Losses: {}", self.trace.losses);
        if let Some(ratio) = self.trace.delivery_ratio() {
            println!("  Delivery ratio: {:.1}%", ratio * 100.0);
        }
        println!(
            "  Connections: +{} / -{}",
            self.trace.connections_established, self.trace.connections_lost
        );
        println!();

        println!("Message Statistics:");
        println!("  HELLO: {}", self.trace.hello);
        println!("  RREQ: {}", self.trace.route_request);
        println!("  RREP: {}", self.trace.route_reply);
        println!("  RERR: {}", self.trace.route_error);
        println!();

        if !self.discoveries.is_empty() {
            println!("Route Discoveries:");
            for outcome in &self.discoveries {
                match outcome.route {
                    Some((next_hop, hops)) => println!(
                        "  T={} {} -> {}: via {} in {} hop(s)",
                        outcome.at, outcome.from, outcome.to, next_hop, hops
                    ),
                    None => println!(
                        "  T={} {} -> {}: no route",
                        outcome.at, outcome.from, outcome.to
                    ),
                }
            }
            println!();
        }

        if !self.routes_per_node.is_empty() {
            let counts: Vec<usize> = self.routes_per_node.values().copied().collect();
            let total: usize = counts.iter().sum();
            let max = counts.iter().max().copied().unwrap_or(0);
            println!("Routing Tables:");
            println!(
                "  Valid routes: total={}, max={}, avg={:.1}",
                total,
                max,
                total as f64 / counts.len() as f64
            );
            println!();
        }
    }
}

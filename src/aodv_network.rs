use std::collections::BTreeMap;

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::aodv_config::{ConfigError, Placement, ProtocolConfig, SimConfig};
use crate::aodv_event_queue::EventQueue;
use crate::aodv_interface::{Event, Location, Message, MessageEnvelope, NodeId, Tick};
use crate::aodv_link::Link;
use crate::aodv_node::Node;

/// Owns every node, the links between them and the global event queue.
///
/// Lifecycle: build with [`Network::new`] (or [`Network::from_config`]),
/// optionally schedule route discoveries, then [`Network::execute`].
pub struct Network {
    config: ProtocolConfig,
    request_frequency: f64,
    nodes: Vec<Node>,
    links: BTreeMap<(NodeId, NodeId), Link>,
    queue: EventQueue,
    // staging between a node's update and scheduling, indexed by node id
    outbox: Vec<Vec<MessageEnvelope>>,
    rng: StdRng,
    seed_used: [u8; 32],
    started: bool,
}

impl Network {
    /// `node_count` nodes on the default grid, default protocol constants.
    pub fn new(
        node_count: usize,
        request_frequency: f64,
        seed: Option<[u8; 32]>,
    ) -> Result<Self, ConfigError> {
        Self::from_config(SimConfig {
            node_count,
            request_frequency,
            seed,
            ..Default::default()
        })
    }

    /// One node per location, ids assigned in list order.
    pub fn with_locations(
        locations: Vec<Location>,
        protocol: ProtocolConfig,
        seed: Option<[u8; 32]>,
    ) -> Result<Self, ConfigError> {
        Self::from_config(SimConfig {
            node_count: locations.len(),
            placement: Placement::Fixed { locations },
            protocol,
            seed,
            ..Default::default()
        })
    }

    pub fn from_config(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(|| {
            let mut seed = [0u8; 32];
            rand::thread_rng().fill(&mut seed);
            seed
        });
        let mut rng = StdRng::from_seed(seed);

        let locations = place_nodes(&config.placement, config.node_count, &mut rng);

        let mut network = Self {
            config: config.protocol,
            request_frequency: config.request_frequency,
            nodes: Vec::with_capacity(config.node_count),
            links: BTreeMap::new(),
            queue: EventQueue::new(),
            outbox: Vec::with_capacity(config.node_count),
            rng,
            seed_used: seed,
            started: false,
        };

        for location in locations {
            network.add_node(location)?;
        }

        info!(
            "network ready: {} nodes, {} links",
            network.nodes.len(),
            network.links.len()
        );

        Ok(network)
    }

    /// Register a node at `location` and derive its links to every existing node.
    pub fn add_node(&mut self, location: Location) -> Result<NodeId, ConfigError> {
        let id = self.nodes.len();
        if !location.is_finite() {
            return Err(ConfigError::InvalidLocation { index: id });
        }

        for other in &self.nodes {
            self.links.insert(
                Link::key(other.id(), id),
                Link::new(other.id(), other.location(), id, location),
            );
        }

        self.nodes.push(Node::new(id, location));
        self.outbox.push(Vec::new());
        Ok(id)
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn request_frequency(&self) -> f64 {
        self.request_frequency
    }

    pub fn seed_used(&self) -> [u8; 32] {
        self.seed_used
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn link(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        self.links.get(&Link::key(a, b))
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Have `originator` start looking for `destination` at tick `at`.
    pub fn schedule_route_discovery(&mut self, at: Tick, originator: NodeId, destination: NodeId) {
        self.queue.push(Event::RouteDiscoveryStarted {
            time: at,
            originator,
            destination,
        });
    }

    /// Run the simulation and return every event popped, in order.
    ///
    /// Stops when the queue drains or when an event later than `max_ticks`
    /// is popped; that last event is still part of the returned trace.
    pub fn execute(&mut self, max_ticks: Tick) -> Vec<Event> {
        let mut events = Vec::new();

        if !self.started {
            self.started = true;
            self.update_all_nodes(0);
        }

        while let Some(event) = self.queue.pop() {
            let time = event.time();

            if time > max_ticks {
                debug!("(T = {}) - horizon of {} ticks reached", time, max_ticks);
                events.push(event);
                break;
            }

            debug!("{}", event);
            self.dispatch(&event);
            events.push(event);

            self.update_all_nodes(time);

            if log::log_enabled!(log::Level::Trace) {
                for node in &self.nodes {
                    trace!("{}", node);
                }
            }
        }

        info!(
            "simulation stopped after {} events, {} still queued",
            events.len(),
            self.queue.len()
        );

        events
    }

    fn dispatch(&mut self, event: &Event) {
        match event {
            Event::TransmissionScheduled {
                time,
                sender,
                recipients,
                message,
            } => self.transmit(*time, *sender, recipients, message),
            Event::MessageReceived {
                sender,
                recipient,
                message,
                ..
            } => match self.nodes.get_mut(*recipient) {
                Some(node) => node.receive(*sender, message.clone()),
                None => warn!("reception for unknown node {}", recipient),
            },
            Event::RouteDiscoveryStarted {
                originator,
                destination,
                ..
            } => self.start_route_discovery(*originator, *destination),
            Event::ConnectionEstablished { .. }
            | Event::ConnectionLost { .. }
            | Event::PacketLost { .. } => {}
        }
    }

    fn transmit(&mut self, time: Tick, sender: NodeId, recipients: &[NodeId], message: &Message) {
        let targets: Vec<NodeId> = if recipients.is_empty() {
            (0..self.nodes.len()).collect()
        } else {
            recipients.to_vec()
        };

        for recipient in targets {
            if recipient == sender {
                continue;
            }

            let Some(link) = self.links.get(&Link::key(sender, recipient)) else {
                warn!("no link between nodes {} and {}", sender, recipient);
                continue;
            };

            if !link.in_range(&self.config) {
                debug!(
                    "Nodes {} and {} are not within range ({:.2}).",
                    sender,
                    recipient,
                    link.length()
                );
                continue;
            }

            let delivered = link.transmission_succeeds(&self.config, &mut self.rng);
            let event = if delivered {
                Event::MessageReceived {
                    time: time + 1,
                    sender,
                    recipient,
                    message: message.clone(),
                }
            } else {
                Event::PacketLost {
                    time: time + 1,
                    sender,
                    recipient,
                    message: message.clone(),
                }
            };
            self.queue.push(event);
        }
    }

    fn start_route_discovery(&mut self, originator: NodeId, destination: NodeId) {
        if destination >= self.nodes.len() {
            warn!(
                "node {} cannot look for unknown node {}",
                originator, destination
            );
            return;
        }

        let Some(node) = self.nodes.get_mut(originator) else {
            warn!("route discovery from unknown node {}", originator);
            return;
        };

        match node.start_route_discovery(destination) {
            Some(request) => self.outbox[originator].push(request),
            None => debug!("node {} does not need a route to itself", originator),
        }
    }

    fn update_all_nodes(&mut self, time: Tick) {
        for id in 0..self.nodes.len() {
            self.update_node(time, id);
        }
    }

    fn update_node(&mut self, time: Tick, id: NodeId) {
        let update = self.nodes[id].update(time, &self.config);

        let mut staged = std::mem::take(&mut self.outbox[id]);
        staged.extend(update.outgoing);

        for envelope in staged {
            self.queue.push(Event::TransmissionScheduled {
                time,
                sender: id,
                recipients: envelope.recipients,
                message: envelope.message,
            });
        }

        for peer in update.neighbors_added {
            self.queue.push(Event::ConnectionEstablished {
                time: time + 1,
                node: id,
                peer,
            });
        }

        for peer in update.neighbors_lost {
            self.queue.push(Event::ConnectionLost {
                time: time + 1,
                node: id,
                peer,
            });
        }
    }
}

fn place_nodes(placement: &Placement, node_count: usize, rng: &mut StdRng) -> Vec<Location> {
    match placement {
        Placement::Grid { spacing } => {
            let per_row = (node_count as f64).sqrt().ceil().max(1.0) as usize;
            (0..node_count)
                .map(|i| {
                    Location::new(
                        (i % per_row) as f64 * spacing,
                        (i / per_row) as f64 * spacing,
                    )
                })
                .collect()
        }
        Placement::Uniform { width, height } => (0..node_count)
            .map(|_| Location::new(rng.gen_range(0.0..=*width), rng.gen_range(0.0..=*height)))
            .collect(),
        Placement::Fixed { locations } => locations.clone(),
    }
}

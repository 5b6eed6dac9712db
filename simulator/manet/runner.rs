//! MANET simulation runner

use std::fs;
use std::path::Path;

use aodv_sim::{ConfigError, Event, Network, Tick};
use log::{info, warn};

use super::scenario::{RouteDiscovery, ScenarioFile};
use super::stats::{DiscoveryOutcome, SimResult, TraceSummary};

/// Builds a network from a scenario and runs it to its horizon
pub struct ManetRunner {
    network: Network,
    max_ticks: Tick,
    discoveries: Vec<RouteDiscovery>,
}

impl ManetRunner {
    pub fn new(scenario: &ScenarioFile, seed: Option<[u8; 32]>) -> Result<Self, ConfigError> {
        let mut network = Network::from_config(scenario.sim_config(seed))?;

        for discovery in &scenario.route_discoveries {
            network.schedule_route_discovery(discovery.at, discovery.from, discovery.to);
        }

        Ok(Self {
            network,
            max_ticks: scenario.config.max_ticks,
            discoveries: scenario.route_discoveries.clone(),
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Run the simulation, returning the summary and the full trace
    pub fn run(mut self) -> (SimResult, Vec<Event>) {
        info!(
            "running {} nodes for up to {} ticks",
            self.network.nodes().len(),
            self.max_ticks
        );

        let events = self.network.execute(self.max_ticks);

        let discoveries = self
            .discoveries
            .iter()
            .map(|d| DiscoveryOutcome::from_network(&self.network, d.at, d.from, d.to))
            .collect();

        let routes_per_node = self
            .network
            .nodes()
            .iter()
            .map(|node| {
                let valid = node
                    .routing_table()
                    .iter()
                    .filter(|route| route.seq_is_valid)
                    .count();
                (node.id(), valid)
            })
            .collect();

        let result = SimResult {
            seed_used: self.network.seed_used(),
            node_count: self.network.nodes().len(),
            max_ticks: self.max_ticks,
            trace: TraceSummary::from_events(&events),
            discoveries,
            routes_per_node,
        };

        (result, events)
    }
}

/// Write a trace as a YAML list of events
pub fn write_trace(path: &Path, events: &[Event]) -> Result<(), String> {
    let yaml = serde_yaml::to_string(events).map_err(|e| e.to_string())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("could not create {}: {}", parent.display(), e);
        }
    }
    fs::write(path, yaml).map_err(|e| e.to_string())
}

//! Scenario file format

use std::path::{Path, PathBuf};

use aodv_sim::{NodeId, Placement, ProtocolConfig, SimConfig, Tick};
use serde::Deserialize;

/// Top-level scenario file
#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    pub meta: ScenarioMeta,

    /// Network and protocol settings
    pub config: ScenarioConfig,

    /// Route discoveries to start during the run
    #[serde(default)]
    pub route_discoveries: Vec<RouteDiscovery>,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hypothesis: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioConfig {
    /// Simulation horizon
    pub max_ticks: Tick,

    #[serde(default = "default_node_count")]
    pub node_count: usize,

    #[serde(default = "default_request_frequency")]
    pub request_frequency: f64,

    /// Seed label, hashed into the 32 byte simulation seed
    #[serde(default)]
    pub seed: Option<String>,

    #[serde(default)]
    pub placement: Placement,

    /// Protocol constants, unset fields keep their defaults
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RouteDiscovery {
    pub at: Tick,
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Write the full event trace as YAML
    pub trace_path: Option<PathBuf>,

    /// Print every event to stdout
    #[serde(default)]
    pub print_events: bool,
}

fn default_node_count() -> usize {
    5
}

fn default_request_frequency() -> f64 {
    0.1
}

impl ScenarioFile {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Scenario name, falling back to the file stem
    pub fn display_name(&self, path: &Path) -> String {
        self.meta.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unnamed".to_string())
        })
    }

    /// Build the network configuration. A seed given on the command line
    /// wins over the scenario's seed label.
    pub fn sim_config(&self, seed_override: Option<[u8; 32]>) -> SimConfig {
        let node_count = match &self.config.placement {
            Placement::Fixed { locations } => locations.len(),
            _ => self.config.node_count,
        };

        SimConfig {
            node_count,
            request_frequency: self.config.request_frequency,
            seed: seed_override.or_else(|| self.config.seed.as_deref().map(seed_from_label)),
            placement: self.config.placement.clone(),
            protocol: self.config.protocol.clone(),
        }
    }
}

/// Derive a simulation seed from a human readable label
pub fn seed_from_label(label: &str) -> [u8; 32] {
    *blake3::hash(label.as_bytes()).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aodv_sim::Location;

    const LINE: &str = r#"
meta:
  name: Line
config:
  max_ticks: 12
  seed: line-topology
  placement:
    mode: Fixed
    locations:
      - { x: 0.0, y: 0.0 }
      - { x: 2.5, y: 0.0 }
      - { x: 5.0, y: 0.0 }
  protocol:
    connection_timeout: 6
route_discoveries:
  - { at: 4, from: 0, to: 2 }
"#;

    #[test]
    fn test_parse_line_scenario() {
        let scenario = ScenarioFile::from_yaml(LINE).unwrap();

        assert_eq!(scenario.display_name(Path::new("x.yaml")), "Line");
        assert_eq!(
            scenario.route_discoveries,
            vec![RouteDiscovery { at: 4, from: 0, to: 2 }]
        );
        assert!(scenario.output.trace_path.is_none());

        let config = scenario.sim_config(None);
        assert_eq!(config.node_count, 3);
        assert_eq!(config.protocol.connection_timeout, 6);
        assert_eq!(config.protocol.hello_interval, 1);
        assert_eq!(config.seed, Some(seed_from_label("line-topology")));
        assert_eq!(
            config.placement,
            Placement::Fixed {
                locations: vec![
                    Location::new(0.0, 0.0),
                    Location::new(2.5, 0.0),
                    Location::new(5.0, 0.0),
                ]
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_scenario_uses_defaults() {
        let scenario = ScenarioFile::from_yaml("config:\n  max_ticks: 5\n").unwrap();

        assert_eq!(scenario.display_name(Path::new("dir/grid.yaml")), "grid");
        let config = scenario.sim_config(Some([3u8; 32]));
        assert_eq!(config.node_count, 5);
        assert_eq!(config.seed, Some([3u8; 32]));
        assert_eq!(config.placement, Placement::default());
    }

    #[test]
    fn test_seed_label_is_stable() {
        assert_eq!(seed_from_label("a"), seed_from_label("a"));
        assert_ne!(seed_from_label("a"), seed_from_label("b"));
    }
}

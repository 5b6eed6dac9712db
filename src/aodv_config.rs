use std::fmt;

use serde::Deserialize;

use crate::aodv_interface::{Location, Tick};

// ============================================================================
// Protocol Configuration
// ============================================================================

/// Timing and radio constants of the routing protocol.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Minimum silence (in ticks) before a Hello is sent again
    pub hello_interval: Tick,

    /// A neighbor not heard from for longer than this is dropped
    pub connection_timeout: Tick,

    /// Reserved: wait before an originator retries a discovery
    pub route_discovery_timeout: Tick,

    /// Lifetime advertised in RouteReplies (forward routes)
    pub route_expiration_period: Tick,

    /// Lifetime of routes learned from RouteRequests
    pub reverse_route_expiration_period: Tick,

    /// Reserved: retry budget for route discovery
    pub maximum_retransmissions: u32,

    /// Minimum remaining lifetime of a route that just carried a reply
    pub active_timeout_period: Tick,

    /// Below this distance every transmission succeeds
    pub transmission_distance_low: f64,

    /// At or beyond this distance no transmission succeeds
    pub transmission_distance_high: f64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            hello_interval: 1,
            connection_timeout: 4,
            route_discovery_timeout: 1,
            route_expiration_period: 3,
            reverse_route_expiration_period: 3,
            maximum_retransmissions: 10,
            active_timeout_period: 1,
            transmission_distance_low: 3.0,
            transmission_distance_high: 4.0,
        }
    }
}

impl ProtocolConfig {
    /// Reject settings that would make link probabilities undefined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let low = self.transmission_distance_low;
        let high = self.transmission_distance_high;
        if !low.is_finite() || !high.is_finite() || low < 0.0 || low >= high {
            return Err(ConfigError::InvalidTransmissionRange { low, high });
        }
        Ok(())
    }
}

// ============================================================================
// Node Placement
// ============================================================================

/// How node locations are derived when a network is built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "mode")]
pub enum Placement {
    /// Row-major grid, ceil(sqrt(n)) nodes per row
    Grid { spacing: f64 },

    /// Uniformly random inside `[0, width] x [0, height]`, drawn from the seed
    Uniform { width: f64, height: f64 },

    /// Externally supplied, one location per node in id order
    Fixed { locations: Vec<Location> },
}

impl Default for Placement {
    fn default() -> Self {
        Self::Grid { spacing: 3.0 }
    }
}

// ============================================================================
// Simulation Configuration
// ============================================================================

/// Everything needed to build a [`crate::Network`].
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub node_count: usize,

    /// Reserved for synthetic traffic generation, not consumed by the engine
    pub request_frequency: f64,

    /// Random seed for reproducibility
    pub seed: Option<[u8; 32]>,

    pub placement: Placement,

    pub protocol: ProtocolConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            node_count: 5,
            request_frequency: 0.1,
            seed: None,
            placement: Placement::default(),
            protocol: ProtocolConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.protocol.validate()?;

        if self.node_count == 0 {
            return Err(ConfigError::EmptyNetwork);
        }

        let frequency = self.request_frequency;
        if !frequency.is_finite() || !(0.0..=1.0).contains(&frequency) {
            return Err(ConfigError::InvalidRequestFrequency(frequency));
        }

        match &self.placement {
            Placement::Grid { spacing } => {
                if !spacing.is_finite() || *spacing <= 0.0 {
                    return Err(ConfigError::InvalidPlacement(format!(
                        "grid spacing must be positive, got {}",
                        spacing
                    )));
                }
            }
            Placement::Uniform { width, height } => {
                if !width.is_finite() || !height.is_finite() || *width <= 0.0 || *height <= 0.0
                {
                    return Err(ConfigError::InvalidPlacement(format!(
                        "area must be positive, got {} x {}",
                        width, height
                    )));
                }
            }
            Placement::Fixed { locations } => {
                if locations.len() != self.node_count {
                    return Err(ConfigError::PlacementMismatch {
                        expected: self.node_count,
                        provided: locations.len(),
                    });
                }
                if let Some(index) = locations.iter().position(|l| !l.is_finite()) {
                    return Err(ConfigError::InvalidLocation { index });
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal problems detected while building a network.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Low/high distances do not form a valid, non-empty interval
    InvalidTransmissionRange { low: f64, high: f64 },

    /// A network needs at least one node
    EmptyNetwork,

    /// Frequency must be a probability
    InvalidRequestFrequency(f64),

    /// Node location with a NaN or infinite coordinate
    InvalidLocation { index: usize },

    /// Fixed placement does not list one location per node
    PlacementMismatch { expected: usize, provided: usize },

    InvalidPlacement(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTransmissionRange { low, high } => write!(
                f,
                "invalid transmission range: low={} must be non-negative and below high={}",
                low, high
            ),
            ConfigError::EmptyNetwork => write!(f, "network must contain at least one node"),
            ConfigError::InvalidRequestFrequency(v) => {
                write!(f, "request frequency {} is not within [0, 1]", v)
            }
            ConfigError::InvalidLocation { index } => {
                write!(f, "location of node {} is not finite", index)
            }
            ConfigError::PlacementMismatch { expected, provided } => write!(
                f,
                "placement lists {} locations for {} nodes",
                provided, expected
            ),
            ConfigError::InvalidPlacement(reason) => write!(f, "invalid placement: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ProtocolConfig::default();

        assert_eq!(config.hello_interval, 1);
        assert_eq!(config.connection_timeout, 4);
        assert_eq!(config.route_discovery_timeout, 1);
        assert_eq!(config.route_expiration_period, 3);
        assert_eq!(config.reverse_route_expiration_period, 3);
        assert_eq!(config.maximum_retransmissions, 10);
        assert_eq!(config.active_timeout_period, 1);
        assert_eq!(config.transmission_distance_low, 3.0);
        assert_eq!(config.transmission_distance_high, 4.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = ProtocolConfig {
            transmission_distance_low: 4.0,
            transmission_distance_high: 4.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidTransmissionRange {
                low: 4.0,
                high: 4.0
            })
        );

        let negative = ProtocolConfig {
            transmission_distance_low: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_sim_config_validation() {
        assert!(SimConfig::default().validate().is_ok());

        let empty = SimConfig {
            node_count: 0,
            ..Default::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::EmptyNetwork));

        let frequency = SimConfig {
            request_frequency: 1.5,
            ..Default::default()
        };
        assert_eq!(
            frequency.validate(),
            Err(ConfigError::InvalidRequestFrequency(1.5))
        );

        let mismatch = SimConfig {
            node_count: 3,
            placement: Placement::Fixed {
                locations: vec![Location::new(0.0, 0.0)],
            },
            ..Default::default()
        };
        assert_eq!(
            mismatch.validate(),
            Err(ConfigError::PlacementMismatch {
                expected: 3,
                provided: 1
            })
        );

        let nan = SimConfig {
            node_count: 2,
            placement: Placement::Fixed {
                locations: vec![Location::new(0.0, 0.0), Location::new(f64::NAN, 1.0)],
            },
            ..Default::default()
        };
        assert_eq!(nan.validate(), Err(ConfigError::InvalidLocation { index: 1 }));
    }

    #[test]
    fn test_protocol_overrides_from_yaml() {
        let yaml = "hello_interval: 2\ntransmission_distance_high: 6.0\n";
        let config: ProtocolConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.hello_interval, 2);
        assert_eq!(config.transmission_distance_high, 6.0);
        // untouched fields keep their defaults
        assert_eq!(config.connection_timeout, 4);
        assert_eq!(config.transmission_distance_low, 3.0);
    }

    #[test]
    fn test_placement_from_yaml() {
        let yaml = "mode: Fixed\nlocations:\n  - { x: 0.0, y: 0.0 }\n  - { x: 2.5, y: 0.0 }\n";
        let placement: Placement = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            placement,
            Placement::Fixed {
                locations: vec![Location::new(0.0, 0.0), Location::new(2.5, 0.0)]
            }
        );
    }
}

//! Distance-dependent wireless link model.
//!
//! A link exists for every unordered pair of distinct nodes. Whether it
//! carries a given transmission is decided per attempt: beyond
//! `transmission_distance_high` nothing is attempted at all, below
//! `transmission_distance_low` every attempt succeeds, and in between the
//! success probability falls off linearly with distance.

use rand::Rng;

use crate::aodv_config::ProtocolConfig;
use crate::aodv_interface::{Location, NodeId};

/// Derived connection between two nodes. Holds copies of the (static)
/// endpoint locations, nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub node_a: NodeId,
    pub node_b: NodeId,
    location_a: Location,
    location_b: Location,
}

impl Link {
    pub fn new(node_a: NodeId, location_a: Location, node_b: NodeId, location_b: Location) -> Self {
        Self {
            node_a,
            node_b,
            location_a,
            location_b,
        }
    }

    /// Registry key of the unordered pair `{a, b}`.
    pub fn key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn length(&self) -> f64 {
        self.location_a.distance(&self.location_b)
    }

    pub fn in_range(&self, config: &ProtocolConfig) -> bool {
        in_range(self.length(), config)
    }

    pub fn transmission_succeeds<R: Rng + ?Sized>(&self, config: &ProtocolConfig, rng: &mut R) -> bool {
        transmission_succeeds(self.length(), config, rng)
    }
}

/// True iff a transmission over `distance` is attempted at all.
pub fn in_range(distance: f64, config: &ProtocolConfig) -> bool {
    distance <= config.transmission_distance_high
}

/// Link strength in `[0, 1]`: 1 at or below the low threshold, 0 at or
/// beyond the high threshold, linear in between.
pub fn success_probability(distance: f64, config: &ProtocolConfig) -> f64 {
    let low = config.transmission_distance_low;
    let high = config.transmission_distance_high;
    let clamped = distance.clamp(low, high);
    1.0 - (clamped - low) / (high - low)
}

/// Outcome of one attempt given a uniform draw from `[0, 1)`.
pub fn succeeds_with_draw(distance: f64, config: &ProtocolConfig, draw: f64) -> bool {
    draw < success_probability(distance, config)
}

pub fn transmission_succeeds<R: Rng + ?Sized>(
    distance: f64,
    config: &ProtocolConfig,
    rng: &mut R,
) -> bool {
    succeeds_with_draw(distance, config, rng.gen::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DRAWS: [f64; 6] = [0.0, 0.1, 0.5, 0.75, 0.999, 1.0 - f64::EPSILON];

    #[test]
    fn test_probability_profile() {
        let config = ProtocolConfig::default();

        assert_eq!(success_probability(0.0, &config), 1.0);
        assert_eq!(success_probability(3.0, &config), 1.0);
        assert_eq!(success_probability(3.5, &config), 0.5);
        assert_eq!(success_probability(4.0, &config), 0.0);
        assert_eq!(success_probability(10.0, &config), 0.0);
    }

    #[test]
    fn test_close_links_always_succeed() {
        let config = ProtocolConfig::default();
        for distance in [0.0, 1.0, 2.0, 2.999, 3.0] {
            for draw in DRAWS {
                assert!(
                    succeeds_with_draw(distance, &config, draw),
                    "d={} draw={}",
                    distance,
                    draw
                );
            }
        }
    }

    #[test]
    fn test_far_links_never_succeed() {
        let config = ProtocolConfig::default();
        for distance in [4.0, 4.5, 100.0] {
            for draw in DRAWS {
                assert!(!succeeds_with_draw(distance, &config, draw));
            }
        }
    }

    #[test]
    fn test_in_range_boundary() {
        let config = ProtocolConfig::default();
        assert!(in_range(4.0, &config));
        assert!(!in_range(4.0001, &config));
        assert!(!in_range(5.0, &config));
    }

    #[test]
    fn test_middle_band_is_probabilistic() {
        let config = ProtocolConfig::default();
        let mut rng = StdRng::seed_from_u64(42);

        let trials = 10_000;
        let successes = (0..trials)
            .filter(|_| transmission_succeeds(3.5, &config, &mut rng))
            .count();

        let ratio = successes as f64 / trials as f64;
        assert!(ratio > 0.45 && ratio < 0.55, "ratio {}", ratio);
    }

    #[test]
    fn test_link_between_locations() {
        let config = ProtocolConfig::default();
        let link = Link::new(0, Location::new(3.0, 2.0), 4, Location::new(6.0, 5.0));

        assert_eq!(Link::key(4, 0), (0, 4));
        assert_eq!(Link::key(0, 4), (0, 4));
        assert!((link.length() - 18f64.sqrt()).abs() < 1e-12);
        assert!(!link.in_range(&config));

        let mut rng = StdRng::seed_from_u64(7);
        let near = Link::new(1, Location::new(0.0, 0.0), 2, Location::new(2.0, 0.0));
        assert!(near.in_range(&config));
        assert!((0..100).all(|_| near.transmission_succeeds(&config, &mut rng)));
    }
}

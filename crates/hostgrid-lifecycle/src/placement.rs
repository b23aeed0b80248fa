//! Replica placement — node picks and replica name suffixes.
//!
//! Randomness is injected through [`PlacementSource`] so a seeded source
//! gives reproducible node assignments and replica names.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use hostgrid_core::PlacementSettings;
use hostgrid_state::NodeAssignment;

const SUFFIX_LEN: usize = 5;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Source of node assignments and replica name suffixes.
pub trait PlacementSource: Send {
    /// Pick the node a pending replica is scheduled onto.
    fn pick_node(&mut self) -> NodeAssignment;

    /// Short random suffix appended to a replica's display name.
    fn name_suffix(&mut self) -> String;
}

/// Uniform random placement over a fixed node pool.
pub struct SeededPlacement {
    nodes: Vec<NodeAssignment>,
    rng: StdRng,
}

impl SeededPlacement {
    /// Build a placement source over `nodes`. Uses entropy when `seed`
    /// is `None`. Fails on an empty pool.
    pub fn new(nodes: Vec<NodeAssignment>, seed: Option<u64>) -> anyhow::Result<Self> {
        anyhow::ensure!(!nodes.is_empty(), "placement node pool is empty");
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        debug!(nodes = nodes.len(), seeded = seed.is_some(), "placement source ready");
        Ok(Self { nodes, rng })
    }

    pub fn from_settings(settings: &PlacementSettings) -> anyhow::Result<Self> {
        let nodes = settings
            .nodes
            .iter()
            .map(|n| NodeAssignment {
                node_id: n.id.clone(),
                node_name: n.name.clone(),
            })
            .collect();
        Self::new(nodes, settings.seed)
    }
}

impl PlacementSource for SeededPlacement {
    fn pick_node(&mut self) -> NodeAssignment {
        let index = self.rng.random_range(0..self.nodes.len());
        self.nodes[index].clone()
    }

    fn name_suffix(&mut self) -> String {
        (0..SUFFIX_LEN)
            .map(|_| SUFFIX_CHARSET[self.rng.random_range(0..SUFFIX_CHARSET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_source(seed: u64) -> SeededPlacement {
        SeededPlacement::from_settings(&PlacementSettings {
            seed: Some(seed),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn picks_come_from_pool() {
        let mut source = default_source(1);
        for _ in 0..50 {
            let node = source.pick_node();
            assert!(["node-1", "node-2", "node-3"].contains(&node.node_id.as_str()));
            assert!(node.node_name.starts_with("worker-0"));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = default_source(42);
        let mut b = default_source(42);
        for _ in 0..10 {
            assert_eq!(a.pick_node(), b.pick_node());
            assert_eq!(a.name_suffix(), b.name_suffix());
        }
    }

    #[test]
    fn suffix_shape() {
        let mut source = default_source(7);
        let suffix = source.name_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| SUFFIX_CHARSET.contains(&b)));
    }

    #[test]
    fn empty_pool_rejected() {
        assert!(SeededPlacement::new(Vec::new(), Some(1)).is_err());
    }
}

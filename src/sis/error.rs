//! Configuration errors.
//!
//! Every error here is raised before the first realization starts. Once a
//! realization is running it always ends at extinction or at the horizon.

use super::network::NodeId;

/// Invalid input to an ensemble run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The temporal network has no snapshots.
    #[error("temporal network must contain at least one snapshot")]
    EmptyNetwork,

    /// The population has no nodes.
    #[error("population size must be positive")]
    EmptyPopulation,

    /// More initially infected nodes were requested than exist.
    #[error("initial infected count {initial} exceeds population size {population}")]
    InitialInfectedExceedsPopulation { initial: usize, population: usize },

    /// The ensemble must contain at least one realization.
    #[error("realization count must be at least 1")]
    NoRealizations,

    /// At least one node must be infected at the start.
    #[error("initial infected count must be at least 1")]
    NoInitialInfected,

    /// A rate is negative, NaN or infinite.
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("output time resolution must be at least 1 tick")]
    InvalidOutputResolution,

    /// The first pass would start past the end of the snapshot sequence.
    #[error("start offset {offset} is outside the snapshot sequence of length {len}")]
    StartOffsetOutOfRange { offset: usize, len: usize },

    /// A contact references a node outside `[0, population)`.
    #[error("snapshot {tick} references node {node}, population size is {population}")]
    NodeOutOfRange {
        tick: usize,
        node: NodeId,
        population: usize,
    },

    /// A contact joins a node to itself.
    #[error("snapshot {tick} contains a self-contact on node {node}")]
    SelfContact { tick: usize, node: NodeId },
}

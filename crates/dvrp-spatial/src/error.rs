//! Spatial-subsystem error type.

use thiserror::Error;

use dvrp_core::NodeId;

/// Errors produced by `dvrp-spatial`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpatialError {
    /// The destination cannot be reached from the origin in this graph.
    ///
    /// Permanent for the pair within a run: the path cache remembers it and
    /// never asks the router again.
    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),
}

pub type SpatialResult<T> = Result<T, SpatialError>;

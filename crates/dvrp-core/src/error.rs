//! Workspace base error type.
//!
//! Sub-crates define their own error enums and wrap `DvrpError` as one
//! variant (via `#[from]`) for the lookup and configuration failures they
//! share.

use thiserror::Error;

use crate::{NodeId, RequestId, VehicleId};

/// Common lookup and configuration errors shared by all `dvrp-*` crates.
#[derive(Debug, Error)]
pub enum DvrpError {
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `DvrpError`.
pub type DvrpResult<T> = Result<T, DvrpError>;

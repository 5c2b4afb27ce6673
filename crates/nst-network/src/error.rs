//! Network-subsystem error types.

use thiserror::Error;

use nst_core::{LinkId, NodeId};

/// Malformed topology or geometry.  Fatal at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("network has no links")]
    Empty,

    #[error("{link} references unknown {node}")]
    UnknownNode { link: LinkId, node: NodeId },

    #[error("{link} starts and ends at {node}")]
    SelfLoop { link: LinkId, node: NodeId },

    #[error("{link}: {field} = {value} is invalid")]
    InvalidGeometry {
        link:  LinkId,
        field: &'static str,
        value: f64,
    },

    #[error("{node} drains into both {first} and {second}; a link may have only one downstream link")]
    Distributary {
        node:   NodeId,
        first:  LinkId,
        second: LinkId,
    },

    #[error("{link} is part of a cycle")]
    Cycle { link: LinkId },

    #[error("network has more than one outlet: {0:?}")]
    MultipleOutlets(Vec<LinkId>),
}

/// Errors produced by `nst-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid network: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("{0} not found in network")]
    LinkNotFound(LinkId),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;

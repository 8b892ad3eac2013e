use thiserror::Error;

use crate::mesh::{ElementId, NodeId};

/// Top-level error type for the absorbing boundary generator.
#[derive(Debug, Error)]
pub enum AbsorbError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("failed to write the solver script")]
    Emit(#[from] std::fmt::Error),
}

/// Errors related to the generator setup and its inputs as a whole.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no boundary-tagged elements to generate absorbing boundaries for")]
    EmptyBoundarySet,

    #[error("degenerate bounding box: largest dimension is {size}")]
    DegenerateBoundingBox { size: f64 },

    #[error("invalid value {value} for `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Errors related to geometric computations on a single element.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("element {element}: singular Jacobian, the face has zero area")]
    Singular { element: ElementId },
}

/// Errors related to the mesh connectivity or partition map.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("element {element}: expected {expected} nodes, found {found}")]
    UnexpectedNodeCount {
        element: ElementId,
        expected: usize,
        found: usize,
    },

    #[error("element {element}: does not lie on any side of the boundary box")]
    NotOnBoundary { element: ElementId },

    #[error("element {element}: node {node} does not lie on the {side} side of the box")]
    NodeOffBoundary {
        element: ElementId,
        node: NodeId,
        side: &'static str,
    },

    #[error("node {node}: sides {code} point in opposite directions")]
    OpposingSides { node: NodeId, code: String },

    #[error("node {node} not found in the mesh or the partition map")]
    MissingNode { node: NodeId },

    #[error("element {element} has no owning partition")]
    MissingPartition { element: ElementId },
}

/// Convenience type alias for results using [`AbsorbError`].
pub type Result<T> = std::result::Result<T, AbsorbError>;

mod store;

pub use store::{MeshStore, NodeData};

use crate::math::Point3;

/// Identifier of a mesh node, as written to the solver script.
pub type NodeId = u32;

/// Identifier of a mesh element, as written to the solver script.
pub type ElementId = u32;

/// Identifier of a worker process of the partitioned solver.
pub type PartitionId = u32;

/// A boundary-tagged element of the host mesh.
///
/// 3D boundaries are 4-node quadrilateral faces, 2D boundaries are 2-node
/// line edges. Nodes are listed in mesh winding order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceElement {
    pub id: ElementId,
    pub nodes: Vec<NodeId>,
}

impl SourceElement {
    /// Creates a new source element.
    #[must_use]
    pub fn new(id: ElementId, nodes: Vec<NodeId>) -> Self {
        Self { id, nodes }
    }
}

/// Read-only view of the host mesh.
///
/// The generator never mutates the mesh; new nodes and elements are
/// allocated above [`max_node_id`](Self::max_node_id) and
/// [`max_element_id`](Self::max_element_id).
pub trait MeshQuery {
    /// All elements tagged for absorbing-boundary treatment, in a stable order.
    fn boundary_elements(&self) -> &[SourceElement];

    /// Position of a node, or `None` if the node does not exist.
    fn node_position(&self, node: NodeId) -> Option<Point3>;

    /// Partitions that own a node, or `None` if the node is unknown to the
    /// partition map.
    fn node_partitions(&self, node: NodeId) -> Option<&[PartitionId]>;

    /// Partition that owns an element.
    fn element_partition(&self, element: ElementId) -> Option<PartitionId>;

    /// Largest node id in use anywhere in the mesh.
    fn max_node_id(&self) -> NodeId;

    /// Largest element id in use anywhere in the mesh.
    fn max_element_id(&self) -> ElementId;
}

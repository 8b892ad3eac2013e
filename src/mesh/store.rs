use std::collections::{BTreeMap, HashMap};

use crate::math::Point3;

use super::{ElementId, MeshQuery, NodeId, PartitionId, SourceElement};

/// Data associated with a mesh node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// The position of the node.
    pub point: Point3,
    /// Partitions that own the node.
    pub partitions: Vec<PartitionId>,
}

impl NodeData {
    /// Creates a node owned by the given partitions.
    #[must_use]
    pub fn new(point: Point3, partitions: Vec<PartitionId>) -> Self {
        Self { point, partitions }
    }
}

/// In-memory mesh implementing [`MeshQuery`].
#[derive(Debug, Default)]
pub struct MeshStore {
    nodes: BTreeMap<NodeId, NodeData>,
    elements: Vec<SourceElement>,
    element_partitions: HashMap<ElementId, PartitionId>,
    max_element_id: ElementId,
}

impl MeshStore {
    /// Creates a new, empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a node.
    pub fn add_node(&mut self, id: NodeId, data: NodeData) {
        self.nodes.insert(id, data);
    }

    /// Appends a boundary-tagged element owned by `partition`.
    pub fn add_boundary_element(&mut self, element: SourceElement, partition: PartitionId) {
        self.max_element_id = self.max_element_id.max(element.id);
        self.element_partitions.insert(element.id, partition);
        self.elements.push(element);
    }

    /// Marks element ids up to `id` as used by elements that are not
    /// boundary-tagged (the solid mesh behind the boundary).
    pub fn reserve_element_ids(&mut self, id: ElementId) {
        self.max_element_id = self.max_element_id.max(id);
    }

    /// Returns a reference to the node data, if present.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(&id)
    }
}

impl MeshQuery for MeshStore {
    fn boundary_elements(&self) -> &[SourceElement] {
        &self.elements
    }

    fn node_position(&self, node: NodeId) -> Option<Point3> {
        self.nodes.get(&node).map(|n| n.point)
    }

    fn node_partitions(&self, node: NodeId) -> Option<&[PartitionId]> {
        self.nodes.get(&node).map(|n| n.partitions.as_slice())
    }

    fn element_partition(&self, element: ElementId) -> Option<PartitionId> {
        self.element_partitions.get(&element).copied()
    }

    fn max_node_id(&self) -> NodeId {
        self.nodes.keys().next_back().copied().unwrap_or(0)
    }

    fn max_element_id(&self) -> ElementId {
        self.max_element_id
    }
}

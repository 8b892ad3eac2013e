use std::collections::BTreeSet;

use thiserror::Error;

use crate::boundary::{BoundaryCombo, Dimension, DomainBox, SidePartitions};
use crate::error::{Result, TopologyError};
use crate::math::{Point3, PositionIndex, Vector3};
use crate::mesh::{NodeId, PartitionId};

/// A node created by extruding a boundary node along a side combination.
#[derive(Debug, Clone)]
pub struct ExtrudedNode {
    pub id: NodeId,
    /// Boundary node the extrusion started from.
    pub source: NodeId,
    /// Sides whose directions were combined.
    pub combo: BoundaryCombo,
    pub position: Point3,
    /// Partitions that must create the node.
    pub partitions: BTreeSet<PartitionId>,
}

/// Lookup of an extruded position that was never registered.
///
/// Only reachable if element synthesis runs before the registration
/// pre-pass has seen every boundary node.
#[derive(Debug, Error)]
#[error("no extruded node registered at ({x}, {y}, {z})")]
pub struct UnregisteredExtrusion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Global dictionary of extruded nodes.
///
/// One physical position yields one node id, whichever partition or combo
/// asks for it. Ids are allocated sequentially from `first_id`.
#[derive(Debug, Clone)]
pub struct ExtrusionRegistry {
    dim: Dimension,
    extrusion_size: f64,
    index: PositionIndex<usize>,
    nodes: Vec<ExtrudedNode>,
    first_id: NodeId,
}

impl ExtrusionRegistry {
    /// Creates an empty registry for the given box. New ids start at
    /// `first_id`.
    #[must_use]
    pub fn new(dim: Dimension, bbox: &DomainBox, first_id: NodeId) -> Self {
        Self {
            dim,
            extrusion_size: bbox.extrusion_size(),
            index: PositionIndex::new(bbox.tolerance(), dim == Dimension::Two),
            nodes: Vec::new(),
            first_id,
        }
    }

    /// Tolerance of the position lookups.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.index.tolerance()
    }

    /// Extrusion vector of a combo, `None` for empty or opposing combos.
    #[must_use]
    pub fn extrusion(&self, combo: BoundaryCombo) -> Option<Vector3> {
        combo.extrusion(self.dim, self.extrusion_size)
    }

    /// Registers every extrusion of a boundary node.
    ///
    /// For each non-empty subset of `touched`, the node is moved along the
    /// subset's extrusion vector and the resulting position is looked up or
    /// created. The node is recorded for the partitions of the subset's
    /// lowest side. Calling this again for the same geometry allocates
    /// nothing new.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::OpposingSides`] if two touched sides cancel
    /// out (the box is flat along their axis).
    pub fn register_node(
        &mut self,
        node: NodeId,
        position: &Point3,
        touched: BoundaryCombo,
        partitions: &SidePartitions,
    ) -> Result<Vec<(BoundaryCombo, NodeId)>> {
        let mut registered = Vec::with_capacity((1 << touched.len()) - 1);
        for combo in touched.subsets() {
            let offset = self.extrusion(combo).ok_or_else(|| TopologyError::OpposingSides {
                node,
                code: combo.code(),
            })?;
            let owners = combo
                .lowest()
                .and_then(|side| partitions.get(&side))
                .cloned()
                .unwrap_or_default();
            let id = self.insert(node, combo, position + offset, owners);
            registered.push((combo, id));
        }
        Ok(registered)
    }

    /// Id of the extruded node at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`UnregisteredExtrusion`] if no node was registered there.
    pub fn id_for(&self, position: &Point3) -> std::result::Result<NodeId, UnregisteredExtrusion> {
        self.index
            .get(position)
            .map(|i| self.nodes[i].id)
            .ok_or(UnregisteredExtrusion {
                x: position.x,
                y: position.y,
                z: position.z,
            })
    }

    /// Position of `source` moved along `combo`; the source itself for the
    /// empty combo.
    ///
    /// # Panics
    ///
    /// Panics if `combo` is opposing; registration rejects such combos
    /// before any caller can ask for them.
    #[must_use]
    pub fn extruded_position(&self, source: &Point3, combo: BoundaryCombo) -> Point3 {
        if combo.is_empty() {
            return *source;
        }
        match self.extrusion(combo) {
            Some(offset) => source + offset,
            None => panic!("combo {combo} has no extrusion direction"),
        }
    }

    /// Adds `partition` to the partitions that must create node `id`.
    ///
    /// Ids outside the registry (original mesh nodes) are ignored.
    pub fn require(&mut self, id: NodeId, partition: PartitionId) {
        if let Some(node) = id
            .checked_sub(self.first_id)
            .and_then(|i| self.nodes.get_mut(i as usize))
        {
            node.partitions.insert(partition);
        }
    }

    /// All extruded nodes in allocation order.
    #[must_use]
    pub fn nodes(&self) -> &[ExtrudedNode] {
        &self.nodes
    }

    /// Number of extruded nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Next id that would be allocated.
    #[must_use]
    pub fn next_id(&self) -> NodeId {
        self.first_id + u32::try_from(self.nodes.len()).unwrap_or(u32::MAX)
    }

    fn insert(
        &mut self,
        source: NodeId,
        combo: BoundaryCombo,
        position: Point3,
        owners: BTreeSet<PartitionId>,
    ) -> NodeId {
        let next = self.nodes.len();
        let (index, created) = self.index.get_or_insert_with(&position, || next);
        if created {
            let id = self.next_id();
            self.nodes.push(ExtrudedNode {
                id,
                source,
                combo,
                position,
                partitions: owners,
            });
            id
        } else {
            let node = &mut self.nodes[index];
            node.partitions.extend(owners);
            node.id
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::boundary::BoundarySide::{Bottom, Front, Left, Right};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_cube() -> DomainBox {
        DomainBox::from_points(&[p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)], 1e-6).unwrap()
    }

    fn partitions(entries: &[(crate::boundary::BoundarySide, &[PartitionId])]) -> SidePartitions {
        entries
            .iter()
            .map(|(side, parts)| (*side, parts.iter().copied().collect()))
            .collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn face_node_gets_one_extrusion() {
        let mut reg = ExtrusionRegistry::new(Dimension::Three, &unit_cube(), 101);
        let touched = BoundaryCombo::single(Bottom);
        let ids = reg
            .register_node(1, &p(0.5, 0.5, 0.0), touched, &partitions(&[(Bottom, &[0])]))
            .unwrap();
        assert_eq!(ids, vec![(touched, 101)]);
        assert_relative_eq!(reg.nodes()[0].position, p(0.5, 0.5, -0.05), epsilon = 1e-15);
        assert_eq!(reg.id_for(&p(0.5, 0.5, -0.05)).unwrap(), 101);
        assert_eq!(reg.next_id(), 102);
    }

    #[test]
    fn corner_node_gets_seven_distinct_extrusions() {
        let mut reg = ExtrusionRegistry::new(Dimension::Three, &unit_cube(), 1);
        let touched: BoundaryCombo = [Bottom, Left, Front].into_iter().collect();
        let ids = reg
            .register_node(
                9,
                &p(0.0, 0.0, 0.0),
                touched,
                &partitions(&[(Bottom, &[0]), (Left, &[0]), (Front, &[0])]),
            )
            .unwrap();
        assert_eq!(ids.len(), 7);
        let distinct: BTreeSet<NodeId> = ids.iter().map(|(_, id)| *id).collect();
        assert_eq!(distinct.len(), 7);

        for node in reg.nodes() {
            let sum = node
                .combo
                .iter()
                .fold(Vector3::zeros(), |acc, s| acc + s.direction(Dimension::Three));
            let expected = p(0.0, 0.0, 0.0) + sum.normalize() * 0.05;
            assert_relative_eq!(node.position, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn registration_is_idempotent() {
        let mut reg = ExtrusionRegistry::new(Dimension::Three, &unit_cube(), 1);
        let touched: BoundaryCombo = [Bottom, Left].into_iter().collect();
        let parts = partitions(&[(Bottom, &[0, 1]), (Left, &[1])]);
        let first = reg.register_node(3, &p(0.0, 0.5, 0.0), touched, &parts).unwrap();
        let again = reg
            .register_node(3, &p(1e-9, 0.5, 0.0), touched, &parts)
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn partitions_follow_lowest_side_of_combo() {
        let mut reg = ExtrusionRegistry::new(Dimension::Three, &unit_cube(), 1);
        let touched: BoundaryCombo = [Bottom, Right].into_iter().collect();
        let parts = partitions(&[(Bottom, &[0, 2]), (Right, &[2])]);
        let ids = reg.register_node(4, &p(1.0, 0.5, 0.0), touched, &parts).unwrap();
        let by_code: BTreeMap<String, NodeId> =
            ids.iter().map(|(c, id)| (c.code(), *id)).collect();

        let node = |id: NodeId| reg.nodes().iter().find(|n| n.id == id).unwrap();
        assert_eq!(node(by_code["B"]).partitions, BTreeSet::from([0, 2]));
        assert_eq!(node(by_code["R"]).partitions, BTreeSet::from([2]));
        assert_eq!(node(by_code["BR"]).partitions, BTreeSet::from([0, 2]));
    }

    #[test]
    fn require_extends_partitions() {
        let mut reg = ExtrusionRegistry::new(Dimension::Two, &unit_cube(), 50);
        reg.register_node(
            2,
            &p(0.3, 0.0, 0.0),
            BoundaryCombo::single(Bottom),
            &partitions(&[(Bottom, &[0])]),
        )
        .unwrap();
        reg.require(50, 3);
        reg.require(7, 3);
        assert_eq!(reg.nodes()[0].partitions, BTreeSet::from([0, 3]));
    }

    #[test]
    fn opposing_sides_are_rejected() {
        let mut reg = ExtrusionRegistry::new(Dimension::Three, &unit_cube(), 1);
        let touched: BoundaryCombo = [Left, Right].into_iter().collect();
        let result = reg.register_node(1, &p(0.0, 0.0, 0.5), touched, &SidePartitions::new());
        assert!(matches!(
            result,
            Err(crate::AbsorbError::Topology(TopologyError::OpposingSides { node: 1, .. }))
        ));
    }

    #[test]
    fn unknown_position_is_unregistered() {
        let reg = ExtrusionRegistry::new(Dimension::Three, &unit_cube(), 1);
        assert!(reg.id_for(&p(0.0, 0.0, -0.05)).is_err());
    }
}

use std::collections::{BTreeMap, BTreeSet};

use crate::mesh::{NodeId, PartitionId};

use super::side::{BoundaryCombo, BoundarySide};

/// Partitions that need a node, per side the node belongs to.
pub type SidePartitions = BTreeMap<BoundarySide, BTreeSet<PartitionId>>;

/// `node -> { side -> partitions }` for every node of a boundary-tagged
/// element.
///
/// A node belongs to a side when an element classified on that side uses
/// it; the partitions are those of such elements.
#[derive(Debug, Clone, Default)]
pub struct NodeBoundaryInfo {
    nodes: BTreeMap<NodeId, SidePartitions>,
}

impl NodeBoundaryInfo {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `partition` needs `node` on `side`.
    pub fn add(&mut self, node: NodeId, side: BoundarySide, partition: PartitionId) {
        self.nodes
            .entry(node)
            .or_default()
            .entry(side)
            .or_default()
            .insert(partition);
    }

    /// Sides the node belongs to (empty for unknown nodes).
    #[must_use]
    pub fn sides(&self, node: NodeId) -> BoundaryCombo {
        self.nodes
            .get(&node)
            .map(|sides| sides.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Per-side partitions of a node.
    #[must_use]
    pub fn side_partitions(&self, node: NodeId) -> Option<&SidePartitions> {
        self.nodes.get(&node)
    }

    /// Number of boundary nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SidePartitions)> {
        self.nodes.iter().map(|(id, sides)| (*id, sides))
    }

    /// Multi-type propagation: for every node on more than one side, the
    /// partitions of all its sides are merged into its lowest side.
    ///
    /// Whichever element owns the shared geometry at generation time is the
    /// one on the lowest side, so that side must see every partition that
    /// needs the node. The rule holds for the 2D and 3D side sets defined
    /// here; adding sides requires revisiting it.
    pub fn propagate_to_lowest_side(&mut self) {
        for sides in self.nodes.values_mut() {
            if sides.len() < 2 {
                continue;
            }
            let merged: BTreeSet<PartitionId> = sides.values().flatten().copied().collect();
            if let Some(lowest) = sides.values_mut().next() {
                *lowest = merged;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::boundary::side::BoundarySide::{Bottom, Front, Left};

    #[test]
    fn sides_are_collected_per_node() {
        let mut info = NodeBoundaryInfo::new();
        info.add(1, Bottom, 0);
        info.add(1, Left, 1);
        info.add(2, Bottom, 0);
        assert_eq!(info.sides(1).code(), "BL");
        assert_eq!(info.sides(2).code(), "B");
        assert!(info.sides(3).is_empty());
        assert_eq!(info.len(), 2);
    }

    #[test]
    fn lowest_side_receives_all_partitions() {
        let mut info = NodeBoundaryInfo::new();
        info.add(7, Front, 2);
        info.add(7, Left, 1);
        info.add(7, Bottom, 0);
        info.add(8, Left, 3);
        info.propagate_to_lowest_side();

        let sides = info.side_partitions(7).unwrap();
        assert_eq!(sides[&Bottom], BTreeSet::from([0, 1, 2]));
        assert_eq!(sides[&Left], BTreeSet::from([1]));
        assert_eq!(sides[&Front], BTreeSet::from([2]));

        // Single-side nodes are untouched.
        let single = info.side_partitions(8).unwrap();
        assert_eq!(single[&Left], BTreeSet::from([3]));
    }
}

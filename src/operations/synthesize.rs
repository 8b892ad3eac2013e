use tracing::debug;

use crate::boundary::{BoundaryCombo, BoundarySide, Dimension, NodeBoundaryInfo};
use crate::error::{GeometryError, Result, TopologyError};
use crate::math::Point3;
use crate::mesh::{ElementId, NodeId, PartitionId, SourceElement};

use super::correct_distortion::CorrectDistortion;
use super::extrusion::ExtrusionRegistry;

/// A corner of an absorbing element: a boundary node moved along a combo.
#[derive(Debug, Clone, Copy)]
pub struct FacePoint {
    /// Boundary node the point derives from.
    pub source: NodeId,
    /// Position of the boundary node.
    pub origin: Point3,
    /// Sides the point was extruded along; empty for the boundary node itself.
    pub combo: BoundaryCombo,
    pub id: NodeId,
    pub position: Point3,
}

/// A generated absorbing element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsorbingElement {
    pub id: ElementId,
    /// 4 nodes in 2D, 8 in 3D.
    pub nodes: Vec<NodeId>,
    /// Boundary sides the element absorbs on.
    pub combo: BoundaryCombo,
    pub partition: PartitionId,
    /// Boundary-tagged element it was built from.
    pub source: ElementId,
    /// `true` for the element reusing the source id.
    pub primary: bool,
}

/// A synthesized element with no counterpart in the source mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoGeneratedElementRecord {
    pub element: ElementId,
    pub nodes: Vec<(NodeId, Point3)>,
}

/// Elements generated for one boundary element.
#[derive(Debug, Clone, Default)]
pub struct Synthesized {
    /// Primary element first, then secondary elements.
    pub elements: Vec<AbsorbingElement>,
    pub auto_generated: Vec<AutoGeneratedElementRecord>,
}

/// Builds the primary absorbing element of a boundary element and the
/// secondary elements that close the layer at box edges and corners.
///
/// An element on side `S` owns the edge elements towards every side
/// greater than `S` that its nodes also touch; lower sides are owned by the
/// element on that lower side. In 3D, a bottom element at a box corner
/// nests once more to build the corner element.
pub struct CornerElementSynthesizer<'a> {
    dim: Dimension,
    registry: &'a mut ExtrusionRegistry,
    node_info: &'a NodeBoundaryInfo,
    next_element: ElementId,
}

impl<'a> CornerElementSynthesizer<'a> {
    /// Creates a synthesizer. Secondary ids start at `first_element_id`.
    pub fn new(
        dim: Dimension,
        registry: &'a mut ExtrusionRegistry,
        node_info: &'a NodeBoundaryInfo,
        first_element_id: ElementId,
    ) -> Self {
        Self {
            dim,
            registry,
            node_info,
            next_element: first_element_id,
        }
    }

    /// Next id a secondary element would receive.
    #[must_use]
    pub fn next_element_id(&self) -> ElementId {
        self.next_element
    }

    /// Synthesizes the elements for one boundary element on `side`.
    ///
    /// `positions` are the positions of `element.nodes`, in the same order.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnexpectedNodeCount`] if the element is not a
    /// quad (3D) or a line (2D), and [`GeometryError::Singular`] if a face
    /// has no area.
    ///
    /// # Panics
    ///
    /// Panics if an extruded node was not registered beforehand.
    pub fn synthesize(
        &mut self,
        element: &SourceElement,
        positions: &[Point3],
        side: BoundarySide,
        partition: PartitionId,
    ) -> Result<Synthesized> {
        let expected = self.dim.face_nodes();
        if element.nodes.len() != expected || positions.len() != expected {
            return Err(TopologyError::UnexpectedNodeCount {
                element: element.id,
                expected,
                found: element.nodes.len(),
            }
            .into());
        }

        let base: Vec<FacePoint> = element
            .nodes
            .iter()
            .zip(positions)
            .map(|(&id, &position)| FacePoint {
                source: id,
                origin: position,
                combo: BoundaryCombo::EMPTY,
                id,
                position,
            })
            .collect();

        let mut out = Synthesized::default();
        let combo = BoundaryCombo::single(side);
        let face = self.order_face(&base, side, element.id)?;
        let primary = self.extrude(&face, side);
        out.elements
            .push(self.finish(element.id, &primary, combo, partition, element.id, true));

        let touched: BoundaryCombo = element
            .nodes
            .iter()
            .flat_map(|&n| self.node_info.sides(n).iter())
            .collect();
        let additional: Vec<BoundarySide> = touched.iter().filter(|s| *s > side).collect();

        for (k, &first) in additional.iter().enumerate() {
            let Some(edge_points) = self.secondary(&primary, combo, first, element, partition, &mut out)?
            else {
                continue;
            };
            for &second in &additional[k + 1..] {
                self.secondary(
                    &edge_points,
                    combo.with(first),
                    second,
                    element,
                    partition,
                    &mut out,
                )?;
            }
        }

        debug!(
            element = element.id,
            side = %side,
            secondary = out.elements.len() - 1,
            "synthesized absorbing elements"
        );
        Ok(out)
    }

    /// Builds one secondary element on `side` from the face of `parent` that
    /// lies on that side. Returns its points, or `None` if no face of the
    /// parent lies entirely on the side.
    fn secondary(
        &mut self,
        parent: &[FacePoint],
        parent_combo: BoundaryCombo,
        side: BoundarySide,
        element: &SourceElement,
        partition: PartitionId,
        out: &mut Synthesized,
    ) -> Result<Option<Vec<FacePoint>>> {
        let Some(face) = self.face_on_side(parent, side) else {
            debug!(
                element = element.id,
                side = %side,
                "nodes touch side but no full face lies on it"
            );
            return Ok(None);
        };
        let face = self.order_face(&face, side, element.id)?;
        let points = self.extrude(&face, side);

        let id = self.next_element;
        self.next_element += 1;
        let combo = parent_combo.with(side);
        out.elements
            .push(self.finish(id, &points, combo, partition, element.id, false));
        out.auto_generated.push(AutoGeneratedElementRecord {
            element: id,
            nodes: points.iter().map(|p| (p.id, p.position)).collect(),
        });
        Ok(Some(points))
    }

    /// Finds the side face (3D) or side edge (2D) of an element whose
    /// source nodes all touch `side`, in cyclic order.
    fn face_on_side(&self, points: &[FacePoint], side: BoundarySide) -> Option<Vec<FacePoint>> {
        let on_side = |p: &FacePoint| self.node_info.sides(p.source).contains(side);
        let candidates: Vec<Vec<usize>> = match self.dim {
            Dimension::Two => vec![vec![1, 2], vec![3, 0]],
            Dimension::Three => (0..4)
                .map(|i| vec![i, (i + 1) % 4, (i + 1) % 4 + 4, i + 4])
                .collect(),
        };
        candidates
            .into_iter()
            .find(|face| face.iter().all(|&i| on_side(&points[i])))
            .map(|face| face.into_iter().map(|i| points[i]).collect())
    }

    /// Puts a boundary face in canonical order for `side`.
    fn order_face(
        &self,
        face: &[FacePoint],
        side: BoundarySide,
        element: ElementId,
    ) -> Result<Vec<FacePoint>> {
        let tangent = side.tangent(self.dim);
        match self.dim {
            Dimension::Two => {
                let (a, b) = (face[0], face[1]);
                let along = (b.position - a.position).dot(&tangent);
                if along.abs() < self.registry.tolerance() {
                    return Err(GeometryError::Singular { element }.into());
                }
                Ok(if along > 0.0 { vec![b, a] } else { vec![a, b] })
            }
            Dimension::Three => {
                let corners = [
                    face[0].position,
                    face[1].position,
                    face[2].position,
                    face[3].position,
                ];
                let corrected = CorrectDistortion::new(corners, tangent)
                    .for_element(element)
                    .execute()?;
                let order = corrected.canonical_order(
                    &side.direction(self.dim),
                    &tangent,
                    &side.bitangent(self.dim),
                );
                Ok(order.iter().map(|&i| face[i]).collect())
            }
        }
    }

    /// Extrudes an ordered face along `side` and returns all element points
    /// in solver node order.
    fn extrude(&self, face: &[FacePoint], side: BoundarySide) -> Vec<FacePoint> {
        let moved: Vec<FacePoint> = face.iter().map(|p| self.moved(p, side)).collect();
        match self.dim {
            // Counterclockwise quad: the boundary edge, then back along the
            // extruded edge.
            Dimension::Two => vec![face[0], face[1], moved[1], moved[0]],
            Dimension::Three => face.iter().chain(&moved).copied().collect(),
        }
    }

    fn moved(&self, point: &FacePoint, side: BoundarySide) -> FacePoint {
        let combo = point.combo.with(side);
        let position = self.registry.extruded_position(&point.origin, combo);
        let id = match self.registry.id_for(&position) {
            Ok(id) => id,
            Err(missing) => panic!("node {}: {missing}", point.source),
        };
        FacePoint {
            source: point.source,
            origin: point.origin,
            combo,
            id,
            position,
        }
    }

    fn finish(
        &mut self,
        id: ElementId,
        points: &[FacePoint],
        combo: BoundaryCombo,
        partition: PartitionId,
        source: ElementId,
        primary: bool,
    ) -> AbsorbingElement {
        for p in points {
            self.registry.require(p.id, partition);
        }
        AbsorbingElement {
            id,
            nodes: points.iter().map(|p| p.id).collect(),
            combo,
            partition,
            source,
            primary,
        }
    }
}

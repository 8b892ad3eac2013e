use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use tracing::{debug, info};

use crate::boundary::{BoundaryClassifier, BoundarySide, DomainBox, NodeBoundaryInfo};
use crate::config::AbsorbingConfig;
use crate::emit::{
    element_statement, node_statement, stage_update_statement, FormatNumber, PartitionedEmitter,
    Statement,
};
use crate::error::{Result, TopologyError};
use crate::math::{centroid, Point3};
use crate::mesh::{ElementId, MeshQuery, NodeId, PartitionId, SourceElement};
use crate::operations::{
    AbsorbingElement, AutoGeneratedElementRecord, CornerElementSynthesizer, ExtrudedNode,
    ExtrusionRegistry,
};

/// Counts reported at the end of a generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub boundary_elements: usize,
    pub primary_elements: usize,
    pub secondary_elements: usize,
    pub nodes: usize,
    pub partitions: usize,
}

/// Everything produced by one generation pass.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    /// Node statements, in the order elements first reference the nodes,
    /// followed by element statements.
    pub script: String,
    /// Extruded nodes in id order.
    pub nodes: Vec<ExtrudedNode>,
    /// Primary and secondary elements in emission order.
    pub elements: Vec<AbsorbingElement>,
    pub elements_by_partition: BTreeMap<PartitionId, Vec<ElementId>>,
    pub auto_generated: Vec<AutoGeneratedElementRecord>,
    pub summary: GenerationSummary,
    process_count: u32,
}

impl GenerationOutput {
    fn empty(process_count: u32) -> Self {
        Self {
            process_count,
            ..Self::default()
        }
    }

    /// Script activating the generated elements for the next analysis
    /// stage, wrapped per partition like the main script.
    ///
    /// # Errors
    ///
    /// Returns [`AbsorbError::Emit`](crate::AbsorbError::Emit) if writing
    /// fails.
    pub fn stage_update_script(&self) -> Result<String> {
        let mut script = String::new();
        if self.elements.is_empty() {
            return Ok(script);
        }
        let emitter = PartitionedEmitter::new(self.process_count);
        let statements: Vec<Statement> = if emitter.is_partitioned() {
            self.elements_by_partition
                .iter()
                .map(|(&partition, ids)| Statement::new([partition], stage_update_statement(ids)))
                .collect()
        } else {
            let ids: Vec<ElementId> = self.elements.iter().map(|e| e.id).collect();
            vec![Statement::new([], stage_update_statement(&ids))]
        };
        emitter.write(&mut script, &statements)?;
        Ok(script)
    }
}

/// A boundary-tagged element with its geometry resolved.
struct TaggedElement<'m> {
    source: &'m SourceElement,
    points: Vec<Point3>,
    partition: PartitionId,
}

/// One absorbing-boundary generation pass over a mesh.
///
/// The session owns every per-pass cache (the boundary membership of
/// nodes and the extruded-node registry); nothing is kept in global state.
/// All nodes are registered before any element is built, so every element
/// finds the shared extruded nodes it needs regardless of partition.
#[derive(Debug)]
pub struct GenerationSession {
    config: AbsorbingConfig,
    node_info: NodeBoundaryInfo,
    registry: Option<ExtrusionRegistry>,
}

impl GenerationSession {
    /// Creates a session after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`](crate::error::ConfigurationError::InvalidParameter)
    /// for an invalid configuration.
    pub fn new(config: AbsorbingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            node_info: NodeBoundaryInfo::new(),
            registry: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AbsorbingConfig {
        &self.config
    }

    /// Boundary membership of the last pass.
    #[must_use]
    pub fn node_info(&self) -> &NodeBoundaryInfo {
        &self.node_info
    }

    /// Extruded nodes of the last pass, if it reached registration.
    #[must_use]
    pub fn registry(&self) -> Option<&ExtrusionRegistry> {
        self.registry.as_ref()
    }

    /// Runs a full pass: classification, node registration, element
    /// synthesis and script emission.
    ///
    /// Running it again on the same mesh yields the same ids and script.
    ///
    /// # Errors
    ///
    /// Returns a [`TopologyError`] for malformed or unowned boundary
    /// elements, a [`ConfigurationError`](crate::error::ConfigurationError)
    /// for a degenerate bounding box and a
    /// [`GeometryError`](crate::error::GeometryError) for zero-area faces.
    pub fn generate<M: MeshQuery>(
        &mut self,
        mesh: &M,
        format: &dyn FormatNumber,
    ) -> Result<GenerationOutput> {
        self.node_info = NodeBoundaryInfo::new();
        self.registry = None;

        let sources = mesh.boundary_elements();
        if sources.is_empty() {
            info!("no boundary-tagged elements, nothing to generate");
            return Ok(GenerationOutput::empty(self.config.process_count));
        }

        let tagged = self.resolve(mesh, sources)?;
        let bbox = DomainBox::from_points(
            tagged.iter().flat_map(|t| &t.points),
            self.config.relative_tolerance,
        )?;
        debug!(
            min = ?bbox.min,
            max = ?bbox.max,
            extrusion = bbox.extrusion_size(),
            tolerance = bbox.tolerance(),
            "domain box"
        );

        let sides = self.classify(&bbox, &tagged)?;
        self.node_info.propagate_to_lowest_side();

        let mut registry =
            ExtrusionRegistry::new(self.config.dimension, &bbox, mesh.max_node_id().saturating_add(1));
        self.register(&mut registry, &tagged)?;

        let mut elements = Vec::new();
        let mut auto_generated = Vec::new();
        let mut synthesizer = CornerElementSynthesizer::new(
            self.config.dimension,
            &mut registry,
            &self.node_info,
            mesh.max_element_id().saturating_add(1),
        );
        for (element, side) in tagged.iter().zip(sides) {
            let out = synthesizer.synthesize(element.source, &element.points, side, element.partition)?;
            elements.extend(out.elements);
            auto_generated.extend(out.auto_generated);
        }

        let script = self.emit(&registry, &elements, format)?;

        let mut elements_by_partition: BTreeMap<PartitionId, Vec<ElementId>> = BTreeMap::new();
        for element in &elements {
            elements_by_partition
                .entry(element.partition)
                .or_default()
                .push(element.id);
        }

        let primary_elements = elements.iter().filter(|e| e.primary).count();
        let summary = GenerationSummary {
            boundary_elements: sources.len(),
            primary_elements,
            secondary_elements: elements.len() - primary_elements,
            nodes: registry.len(),
            partitions: elements_by_partition.len(),
        };
        info!(
            boundary_elements = summary.boundary_elements,
            primary = summary.primary_elements,
            secondary = summary.secondary_elements,
            nodes = summary.nodes,
            partitions = summary.partitions,
            "generated absorbing boundary"
        );

        let nodes = registry.nodes().to_vec();
        self.registry = Some(registry);
        Ok(GenerationOutput {
            script,
            nodes,
            elements,
            elements_by_partition,
            auto_generated,
            summary,
            process_count: self.config.process_count,
        })
    }

    /// Looks up node positions and element ownership.
    fn resolve<'m, M: MeshQuery>(
        &self,
        mesh: &M,
        sources: &'m [SourceElement],
    ) -> Result<Vec<TaggedElement<'m>>> {
        let expected = self.config.dimension.face_nodes();
        let mut tagged = Vec::with_capacity(sources.len());
        for source in sources {
            if source.nodes.len() != expected {
                return Err(TopologyError::UnexpectedNodeCount {
                    element: source.id,
                    expected,
                    found: source.nodes.len(),
                }
                .into());
            }
            let partition = mesh
                .element_partition(source.id)
                .ok_or(TopologyError::MissingPartition { element: source.id })?;

            let mut points = Vec::with_capacity(expected);
            for &node in &source.nodes {
                let position = mesh
                    .node_position(node)
                    .ok_or(TopologyError::MissingNode { node })?;
                if !matches!(mesh.node_partitions(node), Some(owners) if !owners.is_empty()) {
                    return Err(TopologyError::MissingNode { node }.into());
                }
                points.push(position);
            }
            tagged.push(TaggedElement {
                source,
                points,
                partition,
            });
        }
        Ok(tagged)
    }

    /// Assigns each element its side and records the sides of its nodes.
    fn classify(&mut self, bbox: &DomainBox, tagged: &[TaggedElement<'_>]) -> Result<Vec<BoundarySide>> {
        let classifier = BoundaryClassifier::new(*bbox, self.config.dimension);
        let mut sides = Vec::with_capacity(tagged.len());
        for element in tagged {
            let id = element.source.id;
            let side = classifier
                .classify(&centroid(&element.points))
                .ok_or(TopologyError::NotOnBoundary { element: id })?;
            for (&node, point) in element.source.nodes.iter().zip(&element.points) {
                if !classifier.touches(side, point) {
                    return Err(TopologyError::NodeOffBoundary {
                        element: id,
                        node,
                        side: side.name(),
                    }
                    .into());
                }
                self.node_info.add(node, side, element.partition);
            }
            sides.push(side);
        }
        Ok(sides)
    }

    /// Registers the extrusions of every boundary node, in node id order.
    fn register(&self, registry: &mut ExtrusionRegistry, tagged: &[TaggedElement<'_>]) -> Result<()> {
        let positions: BTreeMap<NodeId, Point3> = tagged
            .iter()
            .flat_map(|t| t.source.nodes.iter().copied().zip(t.points.iter().copied()))
            .collect();
        for (node, side_partitions) in self.node_info.iter() {
            let position = positions
                .get(&node)
                .ok_or(TopologyError::MissingNode { node })?;
            registry.register_node(node, position, self.node_info.sides(node), side_partitions)?;
        }
        Ok(())
    }

    fn emit(
        &self,
        registry: &ExtrusionRegistry,
        elements: &[AbsorbingElement],
        format: &dyn FormatNumber,
    ) -> Result<String> {
        let dim = self.config.dimension;
        let emitter = PartitionedEmitter::new(self.config.process_count);

        let nodes: Vec<Statement> = reference_order(registry, elements)
            .into_iter()
            .map(|n| {
                Statement::new(
                    n.partitions.iter().copied(),
                    node_statement(n.id, &n.position, dim, format),
                )
            })
            .collect();
        let elements: Vec<Statement> = elements
            .iter()
            .map(|e| Statement::new([e.partition], element_statement(e, &self.config)))
            .collect();

        let mut script = String::new();
        writeln!(script, "# absorbing boundary nodes")?;
        emitter.write(&mut script, &nodes)?;
        writeln!(script, "# absorbing boundary elements")?;
        emitter.write(&mut script, &elements)?;
        Ok(script)
    }
}

/// Extruded nodes in the order elements first reference them; nodes no
/// element uses follow in id order.
fn reference_order<'r>(
    registry: &'r ExtrusionRegistry,
    elements: &[AbsorbingElement],
) -> Vec<&'r ExtrudedNode> {
    let by_id: BTreeMap<NodeId, &ExtrudedNode> =
        registry.nodes().iter().map(|n| (n.id, n)).collect();
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::with_capacity(by_id.len());
    for id in elements.iter().flat_map(|e| &e.nodes) {
        if let Some(&node) = by_id.get(id) {
            if seen.insert(*id) {
                ordered.push(node);
            }
        }
    }
    ordered.extend(by_id.into_iter().filter(|(id, _)| !seen.contains(id)).map(|(_, n)| n));
    ordered
}

//! Absorbing boundary for a structured block split between two processes.
//!
//! Usage:
//! ```text
//! cargo run --example cube
//! RUST_LOG=absorb=debug cargo run --example cube
//! ```

use absorb::boundary::Dimension;
use absorb::emit::FixedPrecision;
use absorb::math::Point3;
use absorb::mesh::{ElementId, MeshStore, NodeData, NodeId, PartitionId, SourceElement};
use absorb::{AbsorbingConfig, GenerationSession, VelocityInput};

const NX: u32 = 4;
const NY: u32 = 2;
const NZ: u32 = 2;

fn node_id(i: u32, j: u32, k: u32) -> NodeId {
    1 + i + j * (NX + 1) + k * (NX + 1) * (NY + 1)
}

/// Elements left of the mid plane belong to process 0, the rest to process 1.
fn owner(points: &[Point3]) -> PartitionId {
    let x = points.iter().map(|p| p.x).sum::<f64>() / points.len() as f64;
    u32::from(x > f64::from(NX) / 2.0)
}

fn build_mesh() -> MeshStore {
    let mut mesh = MeshStore::new();
    for k in 0..=NZ {
        for j in 0..=NY {
            for i in 0..=NX {
                let x = f64::from(i);
                let partitions = match i.cmp(&(NX / 2)) {
                    std::cmp::Ordering::Less => vec![0],
                    std::cmp::Ordering::Equal => vec![0, 1],
                    std::cmp::Ordering::Greater => vec![1],
                };
                let point = Point3::new(x, f64::from(j), f64::from(k));
                mesh.add_node(node_id(i, j, k), NodeData::new(point, partitions));
            }
        }
    }
    // Solid hexahedra occupy the first ids.
    let mut next: ElementId = NX * NY * NZ;
    mesh.reserve_element_ids(next);

    let mut faces: Vec<[NodeId; 4]> = Vec::new();
    for j in 0..NY {
        for i in 0..NX {
            faces.push([node_id(i, j, 0), node_id(i + 1, j, 0), node_id(i + 1, j + 1, 0), node_id(i, j + 1, 0)]);
        }
    }
    for k in 0..NZ {
        for j in 0..NY {
            faces.push([node_id(0, j, k), node_id(0, j + 1, k), node_id(0, j + 1, k + 1), node_id(0, j, k + 1)]);
            faces.push([node_id(NX, j, k), node_id(NX, j + 1, k), node_id(NX, j + 1, k + 1), node_id(NX, j, k + 1)]);
        }
        for i in 0..NX {
            faces.push([node_id(i, 0, k), node_id(i + 1, 0, k), node_id(i + 1, 0, k + 1), node_id(i, 0, k + 1)]);
            faces.push([node_id(i, NY, k), node_id(i + 1, NY, k), node_id(i + 1, NY, k + 1), node_id(i, NY, k + 1)]);
        }
    }

    for face in faces {
        let points: Vec<Point3> = face
            .iter()
            .filter_map(|&n| mesh.node(n).map(|data| data.point))
            .collect();
        next += 1;
        mesh.add_boundary_element(SourceElement::new(next, face.to_vec()), owner(&points));
    }
    mesh
}

fn main() -> absorb::Result<()> {
    // Default: WARN for everything, INFO for absorb.
    // Override with RUST_LOG env var (e.g. RUST_LOG=absorb=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("absorb=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mesh = build_mesh();
    let config = AbsorbingConfig::new(Dimension::Three, 8.0e7, 0.3, 2000.0)
        .with_process_count(2)
        .with_velocity(VelocityInput {
            fx: Some(1),
            fy: Some(2),
            fz: None,
        });

    let mut session = GenerationSession::new(config)?;
    let output = session.generate(&mesh, &FixedPrecision::new(4))?;

    print!("{}", output.script);
    println!("# stage update");
    print!("{}", output.stage_update_script()?);
    Ok(())
}

use crate::boundary::{BoundarySide, Dimension};
use crate::config::AbsorbingConfig;
use crate::math::Point3;
use crate::mesh::{ElementId, NodeId};
use crate::operations::AbsorbingElement;

use super::FormatNumber;

/// `node <id> <x> <y> [<z>]`
#[must_use]
pub fn node_statement(
    id: NodeId,
    position: &Point3,
    dim: Dimension,
    format: &dyn FormatNumber,
) -> String {
    let mut line = format!("node {id}");
    for i in 0..dim.coordinates() {
        line.push(' ');
        line.push_str(&format.format(position[i]));
    }
    line
}

/// `element AbsorbingBoundary{2D,3D} <id> <nodes...> <G> <v> <rho> [<thickness>] <code> [-fx ts] [-fy ts] [-fz ts]`
///
/// Thickness is written in 2D only. Velocity inputs are written for pure
/// bottom elements only; `-fz` never appears in 2D.
#[must_use]
pub fn element_statement(element: &AbsorbingElement, config: &AbsorbingConfig) -> String {
    let dim = config.dimension;
    let mut fields: Vec<String> = vec![
        "element".to_string(),
        dim.element_type().to_string(),
        element.id.to_string(),
    ];
    fields.extend(element.nodes.iter().map(ToString::to_string));
    fields.push(config.shear_modulus.to_string());
    fields.push(config.poisson_ratio.to_string());
    fields.push(config.density.to_string());
    if dim == Dimension::Two {
        fields.push(config.thickness.to_string());
    }
    fields.push(element.combo.code());

    if element.combo == BoundarySide::Bottom.into() {
        let velocity = &config.velocity;
        let fz = match dim {
            Dimension::Two => None,
            Dimension::Three => velocity.fz,
        };
        for (flag, series) in [("-fx", velocity.fx), ("-fy", velocity.fy), ("-fz", fz)] {
            if let Some(ts) = series {
                fields.push(format!("{flag} {ts}"));
            }
        }
    }
    fields.join(" ")
}

/// Marks elements as active from the next analysis stage on.
#[must_use]
pub fn stage_update_statement(elements: &[ElementId]) -> String {
    let ids: Vec<String> = elements.iter().map(ToString::to_string).collect();
    format!("setParameter -val 1 -ele {} stage", ids.join(" "))
}

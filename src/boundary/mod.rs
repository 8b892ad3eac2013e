mod bounding_box;
mod classify;
mod node_info;
mod side;

pub use bounding_box::{DomainBox, EXTRUSION_RATIO};
pub use classify::BoundaryClassifier;
pub use node_info::{NodeBoundaryInfo, SidePartitions};
pub use side::{BoundaryCombo, BoundarySide, Dimension, Extreme};

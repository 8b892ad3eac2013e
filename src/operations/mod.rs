mod correct_distortion;
mod extrusion;
mod synthesize;

pub use correct_distortion::{CorrectDistortion, CorrectedQuad};
pub use extrusion::{ExtrudedNode, ExtrusionRegistry, UnregisteredExtrusion};
pub use synthesize::{
    AbsorbingElement, AutoGeneratedElementRecord, CornerElementSynthesizer, FacePoint, Synthesized,
};

pub mod boundary;
pub mod config;
pub mod emit;
pub mod error;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod session;

pub use config::{AbsorbingConfig, VelocityInput};
pub use error::{AbsorbError, Result};
pub use session::{GenerationOutput, GenerationSession, GenerationSummary};

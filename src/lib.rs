pub mod error;
pub mod math;
pub mod mesh_set;
pub mod operations;
pub mod options;
pub mod topology;

pub use error::{HalfmeshError, Result};
pub use mesh_set::MeshSet;
pub use options::MeshOptions;

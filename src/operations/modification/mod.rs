mod canonicalize;
mod collect_vertices;
mod merge_faces;
mod separate_meshes;

pub use canonicalize::Canonicalize;
pub use collect_vertices::CollectVertices;
pub use merge_faces::{MergeFaces, RemoveHalfEdge};
pub use separate_meshes::SeparateMeshes;

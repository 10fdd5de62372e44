//! Engine data structures: transforms, scene graphs, meshes, and handles.
//!
//! - `transform` holds the position/rotation/scale triple and its matrix form
//! - `scene_graph` enables hierarchical scene organization with ownership checks
//! - `mesh` contains CPU-side geometry and its uploaded GPU buffers
//! - `handle` defines the opaque handles nodes use to refer to loader-owned resources

pub mod handle;
pub mod mesh;
pub mod scene_graph;
pub mod transform;

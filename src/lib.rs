//! arbor-ngin
//!
//! A small, cross-platform scene-graph rendering engine for native and WASM
//! targets. Scenes are trees of nodes carrying local transforms, optional
//! update and draw hooks, and handles to GPU resources; a frame driver walks
//! the tree once per frame, composes world transforms parent-first, and
//! records draw commands in traversal order.
//!
//! High-level modules
//! - `camera`: fixed camera and perspective projection
//! - `context`: central GPU and window context that owns device/queue/registry
//! - `data_structures`: transforms, nodes, the scene graph and resource handles
//! - `driver`: winit event loop hosting the frame driver
//! - `frame`: per-frame traversal and the backend abstraction it draws through
//! - `render`: command recording and wgpu replay
//! - `resources`: shader compilation, procedural geometry and texture loading
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod driver;
pub mod frame;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;

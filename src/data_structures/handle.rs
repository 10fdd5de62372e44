//! Opaque handles to loader-owned GPU resources.
//!
//! Loaders in [`crate::resources`] compile shaders, upload meshes and decode
//! textures; scene nodes only ever hold the lightweight handles defined here.
//! Handles index into the [`crate::resources::ResourceRegistry`] that produced
//! them and carry no GPU state themselves, so they are cheap to copy and safe
//! to move across the async boundary of a late texture load.

use std::collections::HashMap;

/// Handle to a texture uploaded through the registry.
///
/// The index is only meaningful to the registry that issued it; a stale
/// handle degrades to the fallback texture at draw time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub usize);

/// Handle to a vertex/index buffer pair created from generated geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

/// A resolved uniform binding point.
///
/// Locations are resolved once when a program is compiled and never during
/// a frame; draw hooks only upload values to locations they already hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
}

/// A compiled shader program together with its link-time uniform table.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramHandle {
    index: usize,
    uniforms: HashMap<String, UniformLocation>,
}

impl ProgramHandle {
    pub fn new(index: usize, uniforms: HashMap<String, UniformLocation>) -> Self {
        Self { index, uniforms }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Look up a uniform by name. `None` means the program simply does not
    /// declare it; callers skip the upload rather than fail.
    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }
}

/// Value stored in a node's named resource slots.
///
/// Slots are written by loaders (possibly after an async load completes) and
/// read by draw hooks. The variants stay a closed set on purpose: everything
/// a draw hook can bind goes through here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceHandle {
    Texture(TextureHandle),
    Mesh(MeshHandle),
}

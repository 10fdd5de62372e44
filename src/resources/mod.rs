//! Resource loading and the registry that owns what gets loaded.
//!
//! Shader programs, meshes and textures live in a [`ResourceRegistry`] value
//! (owned by [`crate::context::Context`]); the scene graph only ever sees the
//! opaque handles it hands out. There is no process-wide resource state.

use crate::{
    data_structures::{
        handle::{MeshHandle, TextureHandle},
        mesh::{GpuMesh, MeshData},
    },
    resources::{
        shader::ProgramEntry,
        texture::{Texture, create_default_sampler},
    },
};

pub mod geometry;
pub mod shader;
pub mod texture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> reqwest::Url {
    let window = web_sys::window().unwrap();
    let location = window.location();
    let origin = location.origin().unwrap();
    let base = reqwest::Url::parse(&format!("{}/assets/", origin)).unwrap();
    base.join(file_name).unwrap()
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name);
        reqwest::get(url).await?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read_to_string(path).await?
    };

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name);
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(path).await?
    };

    Ok(data)
}

/// Owner of every compiled program, uploaded mesh and uploaded texture.
///
/// Handles index into these tables. Slot 0 of the texture table is a solid
/// white 1x1 fallback used for texture uniforms whose node slot is unbound
/// (typically an async load that has not completed yet).
pub struct ResourceRegistry {
    pub(crate) programs: Vec<ProgramEntry>,
    pub(crate) meshes: Vec<GpuMesh>,
    pub(crate) textures: Vec<Texture>,
    default_texture: TextureHandle,
    pub(crate) default_sampler: wgpu::Sampler,
}

impl ResourceRegistry {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let default_sampler = create_default_sampler(device);
        let white = Texture::create_solid([255, 255, 255, 255], device, queue, "default white");
        Self {
            programs: Vec::new(),
            meshes: Vec::new(),
            textures: vec![white],
            default_texture: TextureHandle(0),
            default_sampler,
        }
    }

    /// Upload generated geometry; used at node-construction time only.
    pub fn create_mesh(
        &mut self,
        device: &wgpu::Device,
        data: &MeshData,
        label: &str,
    ) -> MeshHandle {
        let handle = MeshHandle(self.meshes.len());
        self.meshes.push(GpuMesh::new(device, data, label));
        handle
    }

    pub fn register_texture(&mut self, texture: Texture) -> TextureHandle {
        let handle = TextureHandle(self.textures.len());
        self.textures.push(texture);
        handle
    }

    /// Read, decode and upload a texture in one go.
    pub async fn load_texture(
        &mut self,
        file_name: &str,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> anyhow::Result<TextureHandle> {
        let data = load_binary(file_name).await?;
        let texture = Texture::from_bytes(device, queue, &data, file_name, None)?;
        Ok(self.register_texture(texture))
    }

    pub fn default_texture(&self) -> TextureHandle {
        self.default_texture
    }

    pub(crate) fn texture(&self, handle: TextureHandle) -> &Texture {
        // Stale or foreign handles degrade to the fallback instead of failing
        // the frame.
        self.textures
            .get(handle.0)
            .unwrap_or(&self.textures[self.default_texture.0])
    }

    pub(crate) fn mesh(&self, handle: MeshHandle) -> Option<&GpuMesh> {
        self.meshes.get(handle.0)
    }

    pub(crate) fn program(&self, index: usize) -> Option<&ProgramEntry> {
        self.programs.get(index)
    }
}

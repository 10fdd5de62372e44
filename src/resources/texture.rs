//! GPU textures: creation, sync loading and late (async) loading.

use anyhow::Result;
use image::{ImageFormat, load_from_memory_with_format};

use crate::{
    data_structures::{handle::ResourceHandle, scene_graph::NodeId},
    driver::SceneProxy,
    resources::load_binary,
};

/// A GPU texture with a view and optional sampler.
///
/// Used for color maps bound to node resource slots as well as the per-frame
/// depth target. Typically created via [`from_bytes`](Self::from_bytes) or
/// [`create_depth_texture`](Self::create_depth_texture).
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create the depth texture the render pass depth-tests against.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Create a solid single-colour texture.
    ///
    /// The registry keeps a white one around as the fallback for texture
    /// uniforms whose slot has not been bound yet (e.g. an async load that
    /// has not completed).
    pub fn create_solid(
        rgba: [u8; 4],
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
    ) -> Texture {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));
        Texture {
            texture,
            view,
            sampler,
        }
    }

    /// Load a texture from raw image file contents (PNG, JPEG, ...).
    ///
    /// `format` is an optional file format hint (e.g. "png"); if `None` the
    /// format is auto-detected.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
    ) -> Result<Self> {
        let img = match format.and_then(ImageFormat::from_extension) {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
        };
        Self::from_image(device, queue, &img, Some(label))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
    ) -> Result<Self> {
        let rgba = img.to_rgba8();
        let dimensions = rgba.dimensions();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Load and decode a texture without blocking the frame loop, then bind it
/// to `slot` on `node` once it is ready.
///
/// The file read and decode run off the event loop; the GPU upload, registry
/// insert and `set_resource` call ride a [`SceneProxy`] mutation, which the
/// driver applies between frames. Until then the slot simply stays unbound.
/// A failed load logs and leaves the slot unbound indefinitely.
pub fn load_texture_async(
    file_name: impl Into<String>,
    node: NodeId,
    slot: impl Into<String>,
    proxy: SceneProxy,
) {
    let file_name = file_name.into();
    let slot = slot.into();
    let load = async move {
        let decoded = match load_binary(&file_name).await {
            Ok(bytes) => image::load_from_memory(&bytes),
            Err(e) => {
                log::error!("could not read texture {file_name}: {e}");
                return;
            }
        };
        let img = match decoded {
            Ok(img) => img,
            Err(e) => {
                log::error!("could not decode texture {file_name}: {e}");
                return;
            }
        };
        proxy.mutate(move |ctx, scene| {
            match Texture::from_image(&ctx.device, &ctx.queue, &img, Some(&file_name)) {
                Ok(texture) => {
                    let handle = ctx.registry.register_texture(texture);
                    scene.set_resource(node, slot, ResourceHandle::Texture(handle));
                    log::info!("loaded {file_name} into {node:?}");
                }
                Err(e) => log::error!("could not upload texture {file_name}: {e}"),
            }
        });
    };

    #[cfg(not(target_arch = "wasm32"))]
    tokio::spawn(load);

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(load);
}

//! Shader program compilation.
//!
//! A [`ShaderDescriptor`] names the WGSL source and the uniforms it declares;
//! [`compile`](crate::resources::ResourceRegistry::compile) builds the
//! pipeline and resolves every uniform to a [`UniformLocation`] once, at link
//! time. Frames afterwards only upload values to locations they already hold.
//!
//! The binding convention is fixed: matrix uniforms live in group 0 at
//! consecutive bindings, texture uniforms in group 1 at even bindings with
//! their sampler at the following odd binding.

use std::collections::HashMap;

use anyhow::{Result, bail};

use crate::{
    data_structures::{
        handle::{ProgramHandle, UniformLocation},
        mesh::Vertex,
    },
    resources::{ResourceRegistry, texture::Texture},
};

/// The stock shader: projection + model_view matrices, one diffuse texture,
/// and a fixed-direction lambert term.
pub const BASIC_SHADER: &str = include_str!("../shaders/basic.wgsl");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Matrix,
    Texture,
}

/// What to compile: label, WGSL source, and the declared uniform set.
pub struct ShaderDescriptor<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub uniforms: &'a [(&'a str, UniformKind)],
}

impl ShaderDescriptor<'_> {
    /// Descriptor for [`BASIC_SHADER`].
    pub fn basic() -> ShaderDescriptor<'static> {
        ShaderDescriptor {
            label: "basic",
            source: BASIC_SHADER,
            uniforms: &[
                ("projection", UniformKind::Matrix),
                ("model_view", UniformKind::Matrix),
                ("diffuse", UniformKind::Texture),
            ],
        }
    }
}

/// A compiled program as the registry stores it: the pipeline plus the
/// layout data the command replay needs to build per-draw bind groups.
pub struct ProgramEntry {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) matrix_layout: wgpu::BindGroupLayout,
    pub(crate) texture_layout: Option<wgpu::BindGroupLayout>,
    pub(crate) matrix_bindings: Vec<u32>,
    pub(crate) texture_bindings: Vec<u32>,
}

impl ResourceRegistry {
    /// Compile `desc` into a render pipeline and resolve its uniform table.
    ///
    /// A node holding the returned handle becomes drawable; compile failures
    /// leave the caller free to simply not assign a program, which the
    /// traversal treats as "not drawn", never as an error.
    pub fn compile(
        &mut self,
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        desc: &ShaderDescriptor<'_>,
    ) -> Result<ProgramHandle> {
        let mut uniforms: HashMap<String, UniformLocation> = HashMap::new();
        let mut matrix_bindings = Vec::new();
        let mut texture_bindings = Vec::new();

        for (name, kind) in desc.uniforms {
            let location = match kind {
                UniformKind::Matrix => {
                    let binding = matrix_bindings.len() as u32;
                    matrix_bindings.push(binding);
                    UniformLocation { group: 0, binding }
                }
                UniformKind::Texture => {
                    let binding = 2 * texture_bindings.len() as u32;
                    texture_bindings.push(binding);
                    UniformLocation { group: 1, binding }
                }
            };
            if uniforms.insert(name.to_string(), location).is_some() {
                bail!("shader {}: duplicate uniform {name}", desc.label);
            }
        }

        let matrix_layout = matrix_layout(device, desc.label, &matrix_bindings);
        let texture_layout = if texture_bindings.is_empty() {
            None
        } else {
            Some(texture_layout(device, desc.label, &texture_bindings))
        };

        let mut bind_group_layouts = vec![&matrix_layout];
        if let Some(layout) = &texture_layout {
            bind_group_layouts.push(layout);
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", desc.label)),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let shader = wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        };
        let pipeline = mk_render_pipeline(
            device,
            &pipeline_layout,
            config.format,
            Some(wgpu::BlendState {
                alpha: wgpu::BlendComponent::REPLACE,
                color: wgpu::BlendComponent::REPLACE,
            }),
            Some(Texture::DEPTH_FORMAT),
            &[Vertex::desc()],
            shader,
        );

        let index = self.programs.len();
        self.programs.push(ProgramEntry {
            pipeline,
            matrix_layout,
            texture_layout,
            matrix_bindings,
            texture_bindings,
        });
        Ok(ProgramHandle::new(index, uniforms))
    }
}

fn matrix_layout(device: &wgpu::Device, label: &str, bindings: &[u32]) -> wgpu::BindGroupLayout {
    let entries: Vec<_> = bindings
        .iter()
        .map(|&binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some(&format!("{label} matrix_bind_group_layout")),
    })
}

fn texture_layout(device: &wgpu::Device, label: &str, bindings: &[u32]) -> wgpu::BindGroupLayout {
    let mut entries = Vec::new();
    for &binding in bindings {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: binding + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some(&format!("{label} texture_bind_group_layout")),
    })
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

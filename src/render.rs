//! Command recording and replay for the wgpu backend.
//!
//! The traversal records plain [`DrawCommand`]s into a [`CommandList`];
//! [`submit`] replays them into a single render pass and presents. Commands
//! are never reordered, so draw submission order stays traversal order.

use std::{collections::HashMap, iter};

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::handle::{MeshHandle, ProgramHandle, TextureHandle, UniformLocation},
    frame::RenderBackend,
};

/// One recorded backend call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    BindProgram(usize),
    SetMatrix(UniformLocation, Matrix4<f32>),
    BindTexture(UniformLocation, TextureHandle),
    DrawMesh(MeshHandle),
}

/// Records one frame's worth of draw commands.
#[derive(Debug, Default)]
pub struct CommandList {
    commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl RenderBackend for CommandList {
    fn begin_frame(&mut self) {
        // The actual clear happens once per replayed pass; recording starts
        // over.
        self.commands.clear();
    }

    fn bind_program(&mut self, program: &ProgramHandle) {
        self.commands.push(DrawCommand::BindProgram(program.index()));
    }

    fn set_matrix(&mut self, location: UniformLocation, value: Matrix4<f32>) {
        self.commands.push(DrawCommand::SetMatrix(location, value));
    }

    fn bind_texture(&mut self, location: UniformLocation, texture: TextureHandle) {
        self.commands.push(DrawCommand::BindTexture(location, texture));
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) {
        self.commands.push(DrawCommand::DrawMesh(mesh));
    }
}

struct BakedDraw {
    program: usize,
    matrix_group: wgpu::BindGroup,
    texture_group: Option<wgpu::BindGroup>,
    mesh: MeshHandle,
}

/// Replay a recorded frame into one render pass and present it.
///
/// Colour and depth are cleared exactly once, at pass begin. `Lost` and
/// `Outdated` surface errors propagate to the driver, which reacts with a
/// resize.
pub fn submit(ctx: &Context, list: &CommandList) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    // Phase one: walk the commands and bake the GPU-side state every draw
    // needs. Bind groups must outlive the pass, so this cannot be interleaved
    // with recording it.
    let mut baked: Vec<BakedDraw> = Vec::new();
    let mut current_program: Option<usize> = None;
    let mut matrices: HashMap<UniformLocation, Matrix4<f32>> = HashMap::new();
    let mut textures: HashMap<UniformLocation, TextureHandle> = HashMap::new();
    for command in list.commands() {
        match command {
            DrawCommand::BindProgram(index) => {
                current_program = Some(*index);
                matrices.clear();
                textures.clear();
            }
            DrawCommand::SetMatrix(location, value) => {
                matrices.insert(*location, *value);
            }
            DrawCommand::BindTexture(location, texture) => {
                textures.insert(*location, *texture);
            }
            DrawCommand::DrawMesh(mesh) => match current_program {
                Some(program) => {
                    if let Some(draw) = bake_draw(ctx, program, &matrices, &textures, *mesh) {
                        baked.push(draw);
                    }
                }
                None => log::warn!("draw command without a bound program was dropped"),
            },
        }
    }

    let mut encoder: wgpu::CommandEncoder =
        ctx.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
    {
        let mut render_pass: wgpu::RenderPass<'_> =
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

        for draw in &baked {
            let Some(entry) = ctx.registry.program(draw.program) else {
                continue;
            };
            let Some(mesh) = ctx.registry.mesh(draw.mesh) else {
                log::warn!("mesh {:?} is not registered, skipping draw", draw.mesh);
                continue;
            };
            render_pass.set_pipeline(&entry.pipeline);
            render_pass.set_bind_group(0, &draw.matrix_group, &[]);
            if let Some(group) = &draw.texture_group {
                render_pass.set_bind_group(1, group, &[]);
            }
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.num_elements, 0, 0..1);
        }
    }

    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}

fn bake_draw(
    ctx: &Context,
    program: usize,
    matrices: &HashMap<UniformLocation, Matrix4<f32>>,
    textures: &HashMap<UniformLocation, TextureHandle>,
    mesh: MeshHandle,
) -> Option<BakedDraw> {
    let entry = ctx.registry.program(program)?;

    // One small uniform buffer per matrix binding; values never uploaded
    // this frame default to identity.
    let buffers: Vec<wgpu::Buffer> = entry
        .matrix_bindings
        .iter()
        .map(|&binding| {
            let value = matrices
                .get(&UniformLocation { group: 0, binding })
                .copied()
                .unwrap_or_else(Matrix4::identity);
            let raw: [[f32; 4]; 4] = value.into();
            ctx.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Matrix Uniform Buffer"),
                    contents: bytemuck::cast_slice(&[raw]),
                    usage: wgpu::BufferUsages::UNIFORM,
                })
        })
        .collect();
    let entries: Vec<wgpu::BindGroupEntry> = entry
        .matrix_bindings
        .iter()
        .zip(&buffers)
        .map(|(&binding, buffer)| wgpu::BindGroupEntry {
            binding,
            resource: buffer.as_entire_binding(),
        })
        .collect();
    let matrix_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &entry.matrix_layout,
        entries: &entries,
        label: Some("matrix_bind_group"),
    });

    // Texture uniforms with no binding this draw fall back to the registry's
    // white texture; an in-flight async load shows up as plain white until
    // its slot is written.
    let texture_group = entry.texture_layout.as_ref().map(|layout| {
        let mut entries = Vec::new();
        for &binding in &entry.texture_bindings {
            let handle = textures
                .get(&UniformLocation { group: 1, binding })
                .copied()
                .unwrap_or(ctx.registry.default_texture());
            let texture = ctx.registry.texture(handle);
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: binding + 1,
                resource: wgpu::BindingResource::Sampler(
                    texture
                        .sampler
                        .as_ref()
                        .unwrap_or(&ctx.registry.default_sampler),
                ),
            });
        }
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some("texture_bind_group"),
        })
    });

    Some(BakedDraw {
        program,
        matrix_group,
        texture_group,
        mesh,
    })
}

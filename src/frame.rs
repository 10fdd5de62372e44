//! Per-frame scene traversal.
//!
//! [`FrameDriver`] walks the scene graph once per frame: depth-first,
//! pre-order, parent before children, children and roots in list order. Draw
//! submission order is traversal order. Nothing is reordered or batched;
//! overlap is resolved by depth testing.
//!
//! Each visit runs the node's update hook (the only point at which its own
//! transform may change this frame), composes the world transform from the
//! parent's post-update pose, emits the node's draw if a program is bound,
//! and recurses regardless of drawability so that programless pivot nodes
//! still propagate their transform.
//!
//! The traversal itself never fails: a missing program, missing hooks, empty
//! children and unbound resource slots are valid degraded states, not errors.

use std::collections::HashMap;

use cgmath::{Matrix4, SquareMatrix};
use instant::Duration;

use crate::data_structures::{
    handle::{MeshHandle, ProgramHandle, ResourceHandle, TextureHandle, UniformLocation},
    scene_graph::{NodeId, Scene},
};

/// Name of the program-global projection uniform the driver uploads after
/// every bind. Programs that do not declare it simply skip the upload.
pub const PROJECTION_UNIFORM: &str = "projection";

/// Name of the per-object uniform the stock draw hook uploads.
pub const MODEL_VIEW_UNIFORM: &str = "model_view";

/// Sink for the GPU commands a traversal emits.
///
/// Uniform locations were resolved when the program was compiled; a frame
/// only uploads values and issues draws. The engine's wgpu-backed
/// implementation is [`crate::render::CommandList`]; tests substitute a
/// recording backend.
pub trait RenderBackend {
    /// Start a fresh frame. Color and depth targets are cleared exactly once
    /// per frame, never per node.
    fn begin_frame(&mut self);
    fn bind_program(&mut self, program: &ProgramHandle);
    fn set_matrix(&mut self, location: UniformLocation, value: Matrix4<f32>);
    fn bind_texture(&mut self, location: UniformLocation, texture: TextureHandle);
    fn draw_mesh(&mut self, mesh: MeshHandle);
}

/// Everything a [`crate::data_structures::scene_graph::Drawable`] hook gets
/// to see: the resolved program, the composed matrices, the node's resource
/// slots, and the command sink.
pub struct DrawContext<'a> {
    pub program: &'a ProgramHandle,
    pub world: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub slots: &'a HashMap<String, ResourceHandle>,
    pub backend: &'a mut dyn RenderBackend,
}

/// Walks a [`Scene`] once per display refresh.
#[derive(Debug, Default)]
pub struct FrameDriver {
    frames: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames driven so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Drive one frame: clear, then visit every root with an identity parent
    /// transform.
    pub fn frame(
        &mut self,
        scene: &mut Scene,
        dt: Duration,
        projection: Matrix4<f32>,
        view: Matrix4<f32>,
        backend: &mut dyn RenderBackend,
    ) {
        backend.begin_frame();
        for root in scene.roots().to_vec() {
            self.visit(scene, root, Matrix4::identity(), dt, projection, view, backend);
        }
        self.frames += 1;
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &mut self,
        scene: &mut Scene,
        id: NodeId,
        parent_world: Matrix4<f32>,
        dt: Duration,
        projection: Matrix4<f32>,
        view: Matrix4<f32>,
        backend: &mut dyn RenderBackend,
    ) {
        // The hook is taken out for the call so it can borrow the node's
        // transform without aliasing itself.
        if let Some(mut hook) = scene.node_mut(id).update.take() {
            let node = scene.node_mut(id);
            hook.update(&mut node.transform, dt);
            node.update = Some(hook);
        }

        // Children compose against the parent's post-update pose, so the
        // whole subtree sees one consistent world transform per frame.
        let world = parent_world * scene.node(id).transform.to_matrix();

        let mut drawable = scene.node_mut(id).draw.take();
        {
            let node = scene.node(id);
            if let Some(program) = node.program() {
                backend.bind_program(program);
                if let Some(location) = program.uniform(PROJECTION_UNIFORM) {
                    backend.set_matrix(location, projection);
                }
                if let Some(hook) = drawable.as_mut() {
                    let mut cx = DrawContext {
                        program,
                        world,
                        view,
                        projection,
                        slots: node.slots(),
                        backend: &mut *backend,
                    };
                    hook.draw(&mut cx);
                }
            }
        }
        if let Some(hook) = drawable {
            scene.node_mut(id).draw = Some(hook);
        }

        // Recurse whether or not anything was drawn.
        for child in scene.node(id).children().to_vec() {
            self.visit(scene, child, world, dt, projection, view, backend);
        }
    }
}

#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, rc::Rc, time::Duration};

use arbor_ngin::{
    data_structures::{
        handle::{MeshHandle, ProgramHandle, ResourceHandle, TextureHandle, UniformLocation},
        scene_graph::{Drawable, Updatable},
        transform::Transform,
    },
    frame::{DrawContext, RenderBackend},
};
use cgmath::{InnerSpace, Matrix4, Quaternion, Vector3};

/// One recorded backend call, for asserting on whole frames.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    BeginFrame,
    BindProgram(usize),
    SetMatrix(UniformLocation, Matrix4<f32>),
    BindTexture(UniformLocation, TextureHandle),
    DrawMesh(MeshHandle),
}

/// Headless backend: records every call and nothing else.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub ops: Vec<Op>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drawn_meshes(&self) -> Vec<MeshHandle> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::DrawMesh(mesh) => Some(*mesh),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self) {
        self.ops.push(Op::BeginFrame);
    }

    fn bind_program(&mut self, program: &ProgramHandle) {
        self.ops.push(Op::BindProgram(program.index()));
    }

    fn set_matrix(&mut self, location: UniformLocation, value: Matrix4<f32>) {
        self.ops.push(Op::SetMatrix(location, value));
    }

    fn bind_texture(&mut self, location: UniformLocation, texture: TextureHandle) {
        self.ops.push(Op::BindTexture(location, texture));
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) {
        self.ops.push(Op::DrawMesh(mesh));
    }
}

/// A program declaring the stock uniform set (projection, model_view,
/// diffuse) without touching a GPU.
pub fn basic_program(index: usize) -> ProgramHandle {
    let mut uniforms = HashMap::new();
    uniforms.insert(
        "projection".to_string(),
        UniformLocation {
            group: 0,
            binding: 0,
        },
    );
    uniforms.insert(
        "model_view".to_string(),
        UniformLocation {
            group: 0,
            binding: 1,
        },
    );
    uniforms.insert(
        "diffuse".to_string(),
        UniformLocation {
            group: 1,
            binding: 0,
        },
    );
    ProgramHandle::new(index, uniforms)
}

/// A program declaring no uniforms at all.
pub fn bare_program(index: usize) -> ProgramHandle {
    ProgramHandle::new(index, HashMap::new())
}

/// Draw hook that appends its tag to a shared log and draws one mesh.
pub struct TagDraw {
    pub name: &'static str,
    pub mesh: MeshHandle,
    pub log: Rc<RefCell<Vec<&'static str>>>,
}

impl Drawable for TagDraw {
    fn draw(&mut self, cx: &mut DrawContext<'_>) {
        self.log.borrow_mut().push(self.name);
        cx.backend.draw_mesh(self.mesh);
    }
}

/// Draw hook that records the composed world transform it was handed.
pub struct WorldProbe {
    pub worlds: Rc<RefCell<Vec<Matrix4<f32>>>>,
}

impl Drawable for WorldProbe {
    fn draw(&mut self, cx: &mut DrawContext<'_>) {
        self.worlds.borrow_mut().push(cx.world);
    }
}

/// Draw hook that records what a named resource slot resolved to.
pub struct SlotProbe {
    pub slot: &'static str,
    pub seen: Rc<RefCell<Vec<Option<ResourceHandle>>>>,
}

impl Drawable for SlotProbe {
    fn draw(&mut self, cx: &mut DrawContext<'_>) {
        self.seen.borrow_mut().push(cx.slots.get(self.slot).copied());
    }
}

/// Update hook that translates by a fixed offset every frame.
pub struct Shift {
    pub offset: Vector3<f32>,
}

impl Updatable for Shift {
    fn update(&mut self, transform: &mut Transform, _dt: Duration) {
        transform.position += self.offset;
    }
}

/// Update hook that only counts its invocations.
pub struct CountUpdates {
    pub count: Rc<RefCell<u32>>,
}

impl Updatable for CountUpdates {
    fn update(&mut self, _transform: &mut Transform, _dt: Duration) {
        *self.count.borrow_mut() += 1;
    }
}

pub fn assert_mat4_near(actual: Matrix4<f32>, expected: Matrix4<f32>, eps: f32) {
    let actual: [[f32; 4]; 4] = actual.into();
    let expected: [[f32; 4]; 4] = expected.into();
    for col in 0..4 {
        for row in 0..4 {
            let (a, e) = (actual[col][row], expected[col][row]);
            assert!(
                (a - e).abs() <= eps,
                "matrix mismatch at column {col} row {row}: {a} vs {e}\nactual: {actual:?}\nexpected: {expected:?}"
            );
        }
    }
}

pub fn assert_vec3_near(actual: Vector3<f32>, expected: Vector3<f32>, eps: f32) {
    assert!(
        (actual - expected).magnitude() <= eps,
        "vector mismatch: {actual:?} vs {expected:?}"
    );
}

/// Quaternions double-cover rotations, so compare up to sign.
pub fn assert_quat_near(actual: Quaternion<f32>, expected: Quaternion<f32>, eps: f32) {
    let dot = actual.normalize().dot(expected.normalize()).abs();
    assert!(
        dot >= 1.0 - eps,
        "rotation mismatch: {actual:?} vs {expected:?} (|dot| = {dot})"
    );
}

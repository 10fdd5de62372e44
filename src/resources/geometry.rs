//! Procedural geometry for the primitive shapes nodes are built from.
//!
//! Generation happens at node-construction time only; a traversal never asks
//! for geometry. The output is plain [`MeshData`]; uploading it is the
//! registry's job.

use crate::data_structures::mesh::{MeshData, Vertex};

/// A rectangular region of a texture atlas in normalized UV coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl UvRect {
    /// The whole texture.
    pub const FULL: UvRect = UvRect {
        min: [0.0, 0.0],
        max: [1.0, 1.0],
    };

    pub fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }
}

/// The primitive shapes the generator knows about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// A single square in the XY plane facing +Z.
    Quad { size: f32 },
    /// An axis-aligned cube with the full texture on every face.
    Cube { size: f32 },
    /// A cube sampling different atlas regions for top, sides and bottom,
    /// in the style of a voxel-game block.
    AtlasBlock {
        size: f32,
        top: UvRect,
        side: UvRect,
        bottom: UvRect,
    },
}

/// Generate vertex and index data for `shape`.
pub fn generate(shape: &Shape) -> MeshData {
    let mut data = MeshData::default();
    match *shape {
        Shape::Quad { size } => {
            let s = size / 2.0;
            push_face(
                &mut data,
                [[-s, -s, 0.0], [s, -s, 0.0], [s, s, 0.0], [-s, s, 0.0]],
                [0.0, 0.0, 1.0],
                UvRect::FULL,
            );
        }
        Shape::Cube { size } => {
            push_cube(&mut data, size, UvRect::FULL, UvRect::FULL, UvRect::FULL);
        }
        Shape::AtlasBlock {
            size,
            top,
            side,
            bottom,
        } => {
            push_cube(&mut data, size, top, side, bottom);
        }
    }
    data
}

fn push_cube(data: &mut MeshData, size: f32, top: UvRect, side: UvRect, bottom: UvRect) {
    let s = size / 2.0;
    // front (+Z)
    push_face(
        data,
        [[-s, -s, s], [s, -s, s], [s, s, s], [-s, s, s]],
        [0.0, 0.0, 1.0],
        side,
    );
    // back (-Z)
    push_face(
        data,
        [[s, -s, -s], [-s, -s, -s], [-s, s, -s], [s, s, -s]],
        [0.0, 0.0, -1.0],
        side,
    );
    // right (+X)
    push_face(
        data,
        [[s, -s, s], [s, -s, -s], [s, s, -s], [s, s, s]],
        [1.0, 0.0, 0.0],
        side,
    );
    // left (-X)
    push_face(
        data,
        [[-s, -s, -s], [-s, -s, s], [-s, s, s], [-s, s, -s]],
        [-1.0, 0.0, 0.0],
        side,
    );
    // top (+Y)
    push_face(
        data,
        [[-s, s, s], [s, s, s], [s, s, -s], [-s, s, -s]],
        [0.0, 1.0, 0.0],
        top,
    );
    // bottom (-Y)
    push_face(
        data,
        [[-s, -s, -s], [s, -s, -s], [s, -s, s], [-s, -s, s]],
        [0.0, -1.0, 0.0],
        bottom,
    );
}

/// Append one quad face. `corners` are in counter-clockwise order as seen
/// from the outside, starting bottom-left.
fn push_face(data: &mut MeshData, corners: [[f32; 3]; 4], normal: [f32; 3], uv: UvRect) {
    let base = data.vertices.len() as u32;
    let tex_coords = [
        [uv.min[0], uv.max[1]],
        [uv.max[0], uv.max[1]],
        [uv.max[0], uv.min[1]],
        [uv.min[0], uv.min[1]],
    ];
    for (position, tex_coords) in corners.into_iter().zip(tex_coords) {
        data.vertices.push(Vertex {
            position,
            tex_coords,
            normal,
        });
    }
    data.indices
        .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

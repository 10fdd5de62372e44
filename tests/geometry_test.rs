use arbor_ngin::resources::geometry::{Shape, UvRect, generate};

#[test]
fn should_generate_a_quad_with_one_face() {
    let data = generate(&Shape::Quad { size: 2.0 });
    assert_eq!(data.vertices.len(), 4);
    assert_eq!(data.indices.len(), 6);
    // Corners sit at half the size in the XY plane.
    for v in &data.vertices {
        assert_eq!(v.position[0].abs(), 1.0);
        assert_eq!(v.position[1].abs(), 1.0);
        assert_eq!(v.position[2], 0.0);
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
    }
}

#[test]
fn should_generate_a_cube_with_unshared_face_vertices() {
    // Per-face normals and UVs need 4 vertices per face, not 8 shared ones.
    let data = generate(&Shape::Cube { size: 1.0 });
    assert_eq!(data.vertices.len(), 24);
    assert_eq!(data.indices.len(), 36);
}

#[test]
fn should_keep_indices_in_bounds() {
    for shape in [
        Shape::Quad { size: 1.0 },
        Shape::Cube { size: 3.0 },
        Shape::AtlasBlock {
            size: 1.0,
            top: UvRect::FULL,
            side: UvRect::new([0.25, 0.0], [0.5, 1.0]),
            bottom: UvRect::new([0.5, 0.0], [0.75, 1.0]),
        },
    ] {
        let data = generate(&shape);
        let max = data.vertices.len() as u32;
        assert!(data.indices.iter().all(|&i| i < max), "{shape:?}");
        // Triangles only.
        assert_eq!(data.indices.len() % 3, 0);
    }
}

#[test]
fn should_sample_atlas_regions_per_face_group() {
    let top = UvRect::new([0.0, 0.0], [0.25, 1.0]);
    let side = UvRect::new([0.25, 0.0], [0.5, 1.0]);
    let bottom = UvRect::new([0.5, 0.0], [0.75, 1.0]);
    let data = generate(&Shape::AtlasBlock {
        size: 2.0,
        top,
        side,
        bottom,
    });

    let in_rect = |uv: [f32; 2], rect: &UvRect| {
        uv[0] >= rect.min[0] && uv[0] <= rect.max[0] && uv[1] >= rect.min[1] && uv[1] <= rect.max[1]
    };

    for v in &data.vertices {
        let rect = if v.normal[1] > 0.5 {
            &top
        } else if v.normal[1] < -0.5 {
            &bottom
        } else {
            &side
        };
        assert!(
            in_rect(v.tex_coords, rect),
            "uv {:?} outside its atlas region for normal {:?}",
            v.tex_coords,
            v.normal
        );
    }
}

#[test]
fn should_scale_geometry_with_size() {
    let data = generate(&Shape::Cube { size: 4.0 });
    for v in &data.vertices {
        for c in v.position {
            assert_eq!(c.abs(), 2.0);
        }
    }
}

use anyhow::Result;
use arbor_ngin::{
    data_structures::{
        scene_graph::{MeshDrawable, Node, Scene, Spin},
        transform::Transform,
    },
    driver,
    resources::{
        geometry::{self, Shape, UvRect},
        shader::ShaderDescriptor,
        texture,
    },
};
use cgmath::{Deg, Quaternion, Rotation3, Vector3};

fn main() -> Result<()> {
    driver::run(Box::new(|ctx, proxy| {
        let program = ctx
            .registry
            .compile(&ctx.device, &ctx.config, &ShaderDescriptor::basic())?;

        let mut scene = Scene::new();

        // A textured plane, built and kept in the arena but never attached,
        // so it is ready to drop in as a root without re-uploading anything.
        let plane_mesh = ctx.registry.create_mesh(
            &ctx.device,
            &geometry::generate(&Shape::Quad { size: 1.0 }),
            "plane",
        );
        let plane = scene.insert(
            Node::new()
                .with_transform(
                    Transform::new().with_rotation(Quaternion::from_angle_x(Deg(90.0))),
                )
                .with_program(program.clone())
                .with_draw(MeshDrawable::new(plane_mesh)),
        );
        texture::load_texture_async("texture.png", plane, "diffuse", proxy.clone());

        // A voxel-style block: grass top, dirt sides and bottom out of one
        // 2x2 atlas.
        let block_mesh = ctx.registry.create_mesh(
            &ctx.device,
            &geometry::generate(&Shape::AtlasBlock {
                size: 1.0,
                top: UvRect::new([0.0, 0.0], [0.5, 0.5]),
                side: UvRect::new([0.5, 0.0], [1.0, 0.5]),
                bottom: UvRect::new([0.0, 0.5], [0.5, 1.0]),
            }),
            "block",
        );
        let block = scene.insert_root(
            Node::new()
                .with_transform(Transform::new().with_position(Vector3::new(-0.8, 0.0, 0.0)))
                .with_program(program.clone())
                .with_draw(MeshDrawable::new(block_mesh)),
        );
        // Renders white until the load lands between two later frames.
        texture::load_texture_async("texture.png", block, "diffuse", proxy.clone());

        let cube_mesh = ctx.registry.create_mesh(
            &ctx.device,
            &geometry::generate(&Shape::Cube { size: 1.0 }),
            "cube",
        );
        scene.insert_root(
            Node::new()
                .with_transform(
                    Transform::new()
                        .with_position(Vector3::new(0.8, 0.0, 0.0))
                        .with_rotation(
                            Quaternion::from_angle_y(Deg(45.0))
                                * Quaternion::from_angle_x(Deg(45.0)),
                        )
                        .with_scale(Vector3::new(0.5, 0.5, 0.5)),
                )
                .with_program(program)
                .with_update(Spin {
                    axis: Vector3::unit_y(),
                    speed: 1.0,
                })
                .with_draw(MeshDrawable::new(cube_mesh)),
        );

        Ok(scene)
    }))
}

mod common;

use std::{cell::RefCell, rc::Rc, time::Duration};

use arbor_ngin::{
    data_structures::{
        handle::{MeshHandle, ResourceHandle, TextureHandle, UniformLocation},
        scene_graph::{Node, Scene},
        transform::Transform,
    },
    frame::FrameDriver,
};
use cgmath::{Matrix4, Vector3};

use crate::common::test_utils::{
    CountUpdates, Op, RecordingBackend, Shift, SlotProbe, TagDraw, WorldProbe, assert_mat4_near,
    bare_program, basic_program,
};

const DT: Duration = Duration::from_millis(16);

fn matrices() -> (Matrix4<f32>, Matrix4<f32>) {
    (
        Matrix4::from_scale(2.0),
        Matrix4::from_translation(Vector3::new(0.0, 0.0, -3.0)),
    )
}

#[test]
fn should_emit_only_a_clear_for_an_empty_scene() {
    let mut scene = Scene::new();
    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();

    driver.frame(&mut scene, DT, projection, view, &mut backend);

    assert_eq!(backend.ops, vec![Op::BeginFrame]);
    assert_eq!(driver.frames(), 1);
}

#[test]
fn should_submit_draws_in_depth_first_pre_order() {
    // Root a with child c, then root b: submission order a, c, b.
    let log = Rc::new(RefCell::new(Vec::new()));
    let tag = |name, index| TagDraw {
        name,
        mesh: MeshHandle(index),
        log: log.clone(),
    };

    let mut scene = Scene::new();
    let a = scene.insert_root(Node::new().with_program(bare_program(0)).with_draw(tag("a", 0)));
    let c = scene.insert(Node::new().with_program(bare_program(0)).with_draw(tag("c", 1)));
    scene.add_child(a, c).unwrap();
    scene.insert_root(Node::new().with_program(bare_program(0)).with_draw(tag("b", 2)));

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    assert_eq!(*log.borrow(), vec!["a", "c", "b"]);
    assert_eq!(
        backend.drawn_meshes(),
        vec![MeshHandle(0), MeshHandle(1), MeshHandle(2)]
    );
}

#[test]
fn should_skip_drawing_programless_nodes_but_still_traverse_them() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut scene = Scene::new();
    // The pivot has a draw hook but no program, so the hook must not run.
    let pivot = scene.insert_root(Node::new().with_draw(TagDraw {
        name: "pivot",
        mesh: MeshHandle(0),
        log: log.clone(),
    }));
    let child = scene.insert(Node::new().with_program(bare_program(0)).with_draw(TagDraw {
        name: "child",
        mesh: MeshHandle(1),
        log: log.clone(),
    }));
    scene.add_child(pivot, child).unwrap();

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    assert_eq!(*log.borrow(), vec!["child"]);
    assert_eq!(backend.drawn_meshes(), vec![MeshHandle(1)]);
}

#[test]
fn should_compose_children_against_the_parents_post_update_pose() {
    let worlds = Rc::new(RefCell::new(Vec::new()));

    let mut scene = Scene::new();
    let parent = scene.insert_root(Node::new().with_update(Shift {
        offset: Vector3::new(1.0, 0.0, 0.0),
    }));
    let child = scene.insert(
        Node::new()
            .with_program(bare_program(0))
            .with_draw(WorldProbe {
                worlds: worlds.clone(),
            }),
    );
    scene.add_child(parent, child).unwrap();

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    // The child sees the parent's shift of the same frame, not last frame's.
    let worlds = worlds.borrow();
    assert_eq!(worlds.len(), 2);
    assert_mat4_near(
        worlds[0],
        Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)),
        1e-6,
    );
    assert_mat4_near(
        worlds[1],
        Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)),
        1e-6,
    );
}

#[test]
fn should_compose_a_three_deep_chain_through_the_traversal() {
    let worlds = Rc::new(RefCell::new(Vec::new()));
    let one_along_x = || Transform::new().with_position(Vector3::new(1.0, 0.0, 0.0));

    let mut scene = Scene::new();
    let top = scene.insert(Node::new().with_transform(one_along_x()));
    let middle = scene.insert(Node::new().with_transform(one_along_x()));
    let leaf = scene.insert(
        Node::new()
            .with_transform(one_along_x())
            .with_program(bare_program(0))
            .with_draw(WorldProbe {
                worlds: worlds.clone(),
            }),
    );
    scene.add_root(top).unwrap();
    scene.add_child(top, middle).unwrap();
    scene.add_child(middle, leaf).unwrap();

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    // Each link is one unit along X, so the leaf lands at (3, 0, 0).
    assert_mat4_near(
        worlds.borrow()[0],
        Matrix4::from_translation(Vector3::new(3.0, 0.0, 0.0)),
        1e-6,
    );
}

#[test]
fn should_ignore_nodes_that_were_never_attached() {
    // A node can sit fully built in the arena (the way a prepared-but-unused
    // object does) without being updated or drawn.
    let log = Rc::new(RefCell::new(Vec::new()));
    let count = Rc::new(RefCell::new(0));

    let mut scene = Scene::new();
    scene.insert(
        Node::new()
            .with_program(bare_program(0))
            .with_update(CountUpdates {
                count: count.clone(),
            })
            .with_draw(TagDraw {
                name: "detached",
                mesh: MeshHandle(0),
                log: log.clone(),
            }),
    );
    scene.insert_root(Node::new().with_program(bare_program(1)).with_draw(TagDraw {
        name: "attached",
        mesh: MeshHandle(1),
        log: log.clone(),
    }));

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    assert_eq!(*log.borrow(), vec!["attached"]);
    assert_eq!(*count.borrow(), 0);
    assert_eq!(backend.drawn_meshes(), vec![MeshHandle(1)]);
}

#[test]
fn should_upload_the_projection_after_every_bind() {
    let mut scene = Scene::new();
    scene.insert_root(Node::new().with_program(basic_program(0)));
    scene.insert_root(Node::new().with_program(basic_program(1)));

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    let location = UniformLocation {
        group: 0,
        binding: 0,
    };
    assert_eq!(
        backend.ops,
        vec![
            Op::BeginFrame,
            Op::BindProgram(0),
            Op::SetMatrix(location, projection),
            Op::BindProgram(1),
            Op::SetMatrix(location, projection),
        ]
    );
}

#[test]
fn should_not_upload_a_projection_the_program_does_not_declare() {
    let mut scene = Scene::new();
    scene.insert_root(Node::new().with_program(bare_program(0)));

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    assert_eq!(backend.ops, vec![Op::BeginFrame, Op::BindProgram(0)]);
}

#[test]
fn should_run_update_hooks_on_undrawn_nodes() {
    let count = Rc::new(RefCell::new(0));

    let mut scene = Scene::new();
    scene.insert_root(Node::new().with_update(CountUpdates {
        count: count.clone(),
    }));

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);
    driver.frame(&mut scene, DT, projection, view, &mut backend);
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    assert_eq!(*count.borrow(), 3);
}

#[test]
fn should_see_late_slot_writes_on_the_next_traversal() {
    let seen = Rc::new(RefCell::new(Vec::new()));

    let mut scene = Scene::new();
    let node = scene.insert_root(
        Node::new()
            .with_program(bare_program(0))
            .with_draw(SlotProbe {
                slot: "diffuse",
                seen: seen.clone(),
            }),
    );

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();

    driver.frame(&mut scene, DT, projection, view, &mut backend);
    // An async load completing between frames lands exactly like this.
    scene.set_resource(node, "diffuse", ResourceHandle::Texture(TextureHandle(3)));
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    assert_eq!(
        *seen.borrow(),
        vec![None, Some(ResourceHandle::Texture(TextureHandle(3)))]
    );
}

#[test]
fn should_emit_model_view_and_texture_binds_from_the_stock_draw_hook() {
    use arbor_ngin::data_structures::scene_graph::MeshDrawable;

    let mut scene = Scene::new();
    scene.insert_root(
        Node::new()
            .with_program(basic_program(0))
            .with_resource("diffuse", ResourceHandle::Texture(TextureHandle(2)))
            .with_draw(MeshDrawable::new(MeshHandle(5))),
    );

    let mut driver = FrameDriver::new();
    let mut backend = RecordingBackend::new();
    let (projection, view) = matrices();
    driver.frame(&mut scene, DT, projection, view, &mut backend);

    assert_eq!(
        backend.ops,
        vec![
            Op::BeginFrame,
            Op::BindProgram(0),
            Op::SetMatrix(
                UniformLocation {
                    group: 0,
                    binding: 0,
                },
                projection,
            ),
            Op::SetMatrix(
                UniformLocation {
                    group: 0,
                    binding: 1,
                },
                // Identity node transform, so model-view is just the view.
                view,
            ),
            Op::BindTexture(
                UniformLocation {
                    group: 1,
                    binding: 0,
                },
                TextureHandle(2),
            ),
            Op::DrawMesh(MeshHandle(5)),
        ]
    );
}

#[test]
fn should_clear_recorded_commands_each_frame() {
    use arbor_ngin::render::CommandList;

    let mut scene = Scene::new();
    scene.insert_root(Node::new().with_program(basic_program(0)));

    let mut driver = FrameDriver::new();
    let mut commands = CommandList::new();
    let (projection, view) = matrices();

    driver.frame(&mut scene, DT, projection, view, &mut commands);
    let first = commands.commands().len();
    driver.frame(&mut scene, DT, projection, view, &mut commands);

    // Re-recording, not appending.
    assert_eq!(commands.commands().len(), first);
    assert!(!commands.is_empty());
}

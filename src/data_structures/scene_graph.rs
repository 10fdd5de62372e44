//! Scene graph: nodes, ownership, hooks and resource slots.
//!
//! A [`Scene`] stores its nodes in one arena and wires the hierarchy up with
//! [`NodeId`] indices, so ownership stays explicit and checkable: every node
//! has at most one owner (the root list, or a parent node), and structural
//! mistakes are rejected at the mutation site instead of corrupting a later
//! traversal.
//!
//! Per-node behavior is attached through the [`Updatable`] and [`Drawable`]
//! traits rather than free closures; whatever state a hook needs lives as
//! explicit owned fields on the implementing type.
//!
//! Structural edits (`add_root`, `add_child`) must happen between frames.
//! Resource-slot writes may arrive late (async texture loads) and become
//! visible to the next traversal.

use std::collections::HashMap;

use cgmath::{Rad, Vector3};
use instant::Duration;
use thiserror::Error;

use crate::{
    data_structures::{
        handle::{MeshHandle, ProgramHandle, ResourceHandle},
        transform::Transform,
    },
    frame::{DrawContext, MODEL_VIEW_UNIFORM},
};

/// Index of a node inside its [`Scene`]. Only meaningful for the scene that
/// issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Who currently owns a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    /// The node is one of the scene's ordered roots.
    Scene,
    /// The node is a child of another node.
    Node(NodeId),
}

/// Structural violations, rejected before they can take effect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {child:?} already has an owner ({owner:?})")]
    AlreadyOwned { child: NodeId, owner: Owner },
    #[error("adopting {child:?} under {parent:?} would close a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Per-frame update behavior.
///
/// Invoked once per traversal with the elapsed time, before the node's world
/// transform is composed. By contract a hook mutates only the transform it is
/// handed; hierarchical effects flow through composition.
pub trait Updatable {
    fn update(&mut self, transform: &mut Transform, dt: Duration);
}

/// Per-frame draw behavior: pure command emission.
///
/// Invoked with the node's resolved program, composed world transform, the
/// camera matrices and the node's resource slots. Uploads per-object uniforms
/// and issues the geometry draw through [`DrawContext::backend`]; it reads
/// but never mutates graph state. How an unbound slot is handled is up to the
/// implementation (skip, default handle, ...).
pub trait Drawable {
    fn draw(&mut self, cx: &mut DrawContext<'_>);
}

/// A unit of the scene graph.
///
/// Carries a local [`Transform`], an optional program (a node without one is
/// not drawn, but still updates and still traverses its children), named
/// resource slots, and optional hooks.
pub struct Node {
    pub transform: Transform,
    pub(crate) program: Option<ProgramHandle>,
    pub(crate) slots: HashMap<String, ResourceHandle>,
    pub(crate) update: Option<Box<dyn Updatable>>,
    pub(crate) draw: Option<Box<dyn Drawable>>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) owner: Option<Owner>,
}

impl Node {
    pub fn new() -> Self {
        Self {
            transform: Transform::new(),
            program: None,
            slots: HashMap::new(),
            update: None,
            draw: None,
            children: Vec::new(),
            owner: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_program(mut self, program: ProgramHandle) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_update(mut self, hook: impl Updatable + 'static) -> Self {
        self.update = Some(Box::new(hook));
        self
    }

    pub fn with_draw(mut self, hook: impl Drawable + 'static) -> Self {
        self.draw = Some(Box::new(hook));
        self
    }

    pub fn with_resource(mut self, slot: impl Into<String>, handle: ResourceHandle) -> Self {
        self.slots.insert(slot.into(), handle);
        self
    }

    pub fn program(&self) -> Option<&ProgramHandle> {
        self.program.as_ref()
    }

    pub fn set_program(&mut self, program: Option<ProgramHandle>) {
        self.program = program;
    }

    /// Bind `handle` to the named slot, replacing any previous binding
    /// (last write wins). Callable at any time outside an in-flight
    /// traversal; the next traversal sees the new value.
    pub fn set_resource(&mut self, slot: impl Into<String>, handle: ResourceHandle) {
        self.slots.insert(slot.into(), handle);
    }

    pub fn resource(&self, slot: &str) -> Option<&ResourceHandle> {
        self.slots.get(slot)
    }

    pub fn slots(&self) -> &HashMap<String, ResourceHandle> {
        &self.slots
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn owner(&self) -> Option<Owner> {
        self.owner
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered collection of root nodes plus the arena backing the whole
/// graph. Root order is draw submission order; there is no depth sorting.
#[derive(Default)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node in the arena, detached. Attach it later with
    /// [`add_root`](Self::add_root) or [`add_child`](Self::add_child).
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Append a detached node to the ordered root list.
    pub fn add_root(&mut self, id: NodeId) -> Result<(), SceneError> {
        if let Some(owner) = self.nodes[id.0].owner {
            return Err(SceneError::AlreadyOwned { child: id, owner });
        }
        self.nodes[id.0].owner = Some(Owner::Scene);
        self.roots.push(id);
        Ok(())
    }

    /// Adopt `child` as the last child of `parent`.
    ///
    /// Rejected if `child` already has an owner or if the adoption would
    /// close a cycle (including `parent == child`); on error neither node is
    /// modified.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if parent == child {
            return Err(SceneError::Cycle { parent, child });
        }
        if let Some(owner) = self.nodes[child.0].owner {
            return Err(SceneError::AlreadyOwned { child, owner });
        }
        // A detached child may still have a subtree of its own; adopting an
        // ancestor of `parent` would loop the graph.
        if self.subtree_contains(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        self.nodes[child.0].owner = Some(Owner::Node(parent));
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Convenience: insert and attach as a root in one step.
    pub fn insert_root(&mut self, node: Node) -> NodeId {
        let id = self.insert(node);
        // A freshly inserted node is detached, so this cannot fail.
        let _ = self.add_root(id);
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// See [`Node::set_resource`]; handy when only the id is at hand, e.g.
    /// from an async load completion.
    pub fn set_resource(&mut self, id: NodeId, slot: impl Into<String>, handle: ResourceHandle) {
        self.nodes[id.0].set_resource(slot, handle);
    }

    fn subtree_contains(&self, root: NodeId, needle: NodeId) -> bool {
        if root == needle {
            return true;
        }
        self.nodes[root.0]
            .children
            .iter()
            .any(|&child| self.subtree_contains(child, needle))
    }
}

/// Stock update hook: rotate about a fixed local axis at a constant angular
/// velocity (radians per second).
pub struct Spin {
    pub axis: Vector3<f32>,
    pub speed: f32,
}

impl Updatable for Spin {
    fn update(&mut self, transform: &mut Transform, dt: Duration) {
        transform.rotate_about(self.axis, Rad(self.speed * dt.as_secs_f32()));
    }
}

/// Stock draw hook for a single mesh.
///
/// Uploads the combined model-view matrix, binds every texture slot whose
/// name matches a program uniform, and issues the indexed draw. A slot the
/// program does not declare is ignored; a declared uniform with no bound slot
/// is left to the backend's fallback texture.
pub struct MeshDrawable {
    pub mesh: MeshHandle,
}

impl MeshDrawable {
    pub fn new(mesh: MeshHandle) -> Self {
        Self { mesh }
    }
}

impl Drawable for MeshDrawable {
    fn draw(&mut self, cx: &mut DrawContext<'_>) {
        if let Some(location) = cx.program.uniform(MODEL_VIEW_UNIFORM) {
            cx.backend.set_matrix(location, cx.view * cx.world);
        }
        for (slot, handle) in cx.slots {
            if let (Some(location), ResourceHandle::Texture(texture)) =
                (cx.program.uniform(slot), handle)
            {
                cx.backend.bind_texture(location, *texture);
            }
        }
        cx.backend.draw_mesh(self.mesh);
    }
}

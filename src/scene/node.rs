use smallvec::SmallVec;

use crate::scene::transform::Transform;
use crate::scene::{NodeKey, ObjectKey};

/// What kind of movable object is attached to a node. The object contents
/// (mesh data, light parameters, ...) live in the rendering collaborator;
/// the graph only tracks the attachment relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    Camera,
    Light,
}

/// A movable object registered with a [`SceneGraph`]. Attached to at most
/// one node at a time.
///
/// [`SceneGraph`]: crate::scene::SceneGraph
#[derive(Debug, Clone)]
pub struct AttachedObject {
    pub name: String,
    pub kind: ObjectKind,
    pub(crate) node: Option<NodeKey>,
}

impl AttachedObject {
    #[must_use]
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            node: None,
        }
    }

    /// The node this object currently sits on, if any.
    #[inline]
    #[must_use]
    pub fn attached_to(&self) -> Option<NodeKey> {
        self.node
    }
}

/// A node of the transform hierarchy.
///
/// Nodes live in the arena of a [`SceneGraph`]; the parent back-reference,
/// child set and object list are keys into that arena, never ownership. A
/// node is created detached (no parent, not displayable) and joins the
/// renderable tree through [`SceneGraph::attach`].
///
/// Structural edits and TRS mutation go through the graph so that derived
/// caches of descendants are invalidated consistently; the node itself only
/// exposes its state read-only plus the [`visible`](Self::visible) flag.
///
/// [`SceneGraph`]: crate::scene::SceneGraph
/// [`SceneGraph::attach`]: crate::scene::SceneGraph::attach
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) name: String,

    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: SmallVec<[NodeKey; 4]>,
    pub(crate) objects: SmallVec<[ObjectKey; 2]>,

    // === Core Spatial Data ===
    pub(crate) transform: Transform,

    // === Core State ===
    /// This node's own visibility flag. Effective visibility also requires
    /// every ancestor to be visible, see `SceneGraph::is_visible`.
    pub visible: bool,
    /// True iff the node is the root or its parent is displayable, i.e. the
    /// node is reachable from the root and will be covered by the update
    /// pass. Maintained by attach/detach.
    pub(crate) displayable: bool,
}

impl SceneNode {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parent: None,
            children: SmallVec::new(),
            objects: SmallVec::new(),
            transform: Transform::new(),
            visible: true,
            displayable: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Read-only child key list.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Read-only attached object key list.
    #[inline]
    #[must_use]
    pub fn objects(&self) -> &[ObjectKey] {
        &self.objects
    }

    /// Read-only view of the transform. Mutation goes through the graph.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    #[must_use]
    pub fn is_displayable(&self) -> bool {
        self.displayable
    }
}

//! The scene graph: an arena of nodes plus every structural operation and
//! the per-frame matrix update pass.
//!
//! All mutation goes through `&mut SceneGraph`, which is what makes the
//! unlocked update traversal sound: the borrow checker rules out a
//! structural edit racing a traversal, so the simulation tick is
//! single-threaded by construction.

use glam::{Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::scene::node::{AttachedObject, ObjectKind, SceneNode};
use crate::scene::transform::Pose;
use crate::scene::{NodeKey, ObjectKey};

/// Owns every node and attached object of one scene and maintains the
/// hierarchy invariants:
///
/// - exactly one root; every other node has at most one parent
/// - a node is displayable iff it is the root or its parent is displayable
/// - after [`update`](Self::update), every node reachable from the root has
///   `derived = parent.derived * local`
///
/// Node names are expected to be unique per graph; duplicates are tolerated
/// with a warning, and the sibling-collision rule in [`attach`](Self::attach)
/// keeps any one child set free of them. Generated names come from a
/// graph-local counter (no process-wide state).
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
    objects: SlotMap<ObjectKey, AttachedObject>,
    root: NodeKey,
    names: FxHashMap<String, NodeKey>,
    /// Nodes whose derived matrix was recomputed by the last update pass.
    /// Consumed by collaborators that cache derived state (lights, cameras).
    changed: Vec<NodeKey>,
    /// Counter feeding generated node names.
    next_name_id: u32,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph holding only the distinguished root node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut root_node = SceneNode::new("Root");
        root_node.displayable = true;
        let root = nodes.insert(root_node);

        let mut names = FxHashMap::default();
        names.insert("Root".to_owned(), root);

        Self {
            nodes,
            objects: SlotMap::with_key(),
            root,
            names,
            changed: Vec::new(),
            next_name_id: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // Node lifecycle
    // ========================================================================

    /// Creates a detached node. It only becomes part of the renderable tree
    /// once attached under the root (directly or transitively).
    ///
    /// An empty name gets a generated one. A duplicate name logs a warning
    /// and still creates the node, but name lookup keeps resolving to the
    /// first holder; a later attach under the same parent as its namesake
    /// will be dropped by the collision rule.
    pub fn create_node(&mut self, name: &str) -> NodeKey {
        let name = if name.is_empty() {
            self.generated_name()
        } else {
            if self.names.contains_key(name) {
                log::warn!("A node named '{name}' already exists in this scene");
            }
            name.to_owned()
        };
        let key = self.nodes.insert(SceneNode::new(&name));
        self.names.entry(name).or_insert(key);
        key
    }

    fn generated_name(&mut self) -> String {
        loop {
            self.next_name_id += 1;
            let candidate = format!("Unnamed_{}", self.next_name_id);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Destroys a node: detaches it from its parent, detaches (but keeps
    /// alive) all of its children and attached objects, then releases it.
    pub fn remove_node(&mut self, key: NodeKey) {
        if key == self.root {
            log::warn!("The root node cannot be removed");
            return;
        }
        let Some(node) = self.nodes.get(key) else {
            log::warn!("remove_node: stale node key");
            return;
        };
        let children: SmallVec<[NodeKey; 4]> = node.children.clone();
        let objects: SmallVec<[ObjectKey; 2]> = node.objects.clone();
        let name = node.name.clone();

        self.detach(key);
        for child in children {
            self.detach(child);
        }
        for obj in objects {
            if let Some(o) = self.objects.get_mut(obj) {
                o.node = None;
            }
        }

        if self.names.get(&name) == Some(&key) {
            self.names.remove(&name);
        }
        self.nodes.remove(key);
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Mutable node access, e.g. for the `visible` flag. Transform and
    /// hierarchy edits go through the graph methods below.
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<NodeKey> {
        self.names.get(name).copied()
    }

    // ========================================================================
    // Hierarchy edits
    // ========================================================================

    /// Attaches `child` under `parent`, detaching it from any current parent
    /// first. The child (and its whole subtree) inherits the parent's
    /// displayable state. Re-attaching to the current parent is a legal
    /// no-op. A name collision among `parent`'s existing children logs a
    /// warning and drops the attachment, leaving the existing child
    /// untouched.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) {
        if child == parent {
            log::warn!("Cannot attach a node to itself");
            return;
        }
        if child == self.root {
            log::warn!("The root node cannot be attached to another node");
            return;
        }
        let Some(child_node) = self.nodes.get(child) else {
            log::warn!("attach: stale child key");
            return;
        };
        if child_node.parent == Some(parent) {
            return;
        }
        let child_name = child_node.name.clone();
        let Some(parent_node) = self.nodes.get(parent) else {
            log::warn!("attach: stale parent key");
            return;
        };
        let collision = parent_node
            .children
            .iter()
            .any(|&c| self.nodes.get(c).is_some_and(|n| n.name == child_name));
        if collision {
            log::warn!(
                "'{}' already has a child named '{child_name}', attachment dropped",
                parent_node.name
            );
            return;
        }
        let parent_displayable = parent_node.displayable;

        // Detach from the old parent, if any.
        self.unlink_from_parent(child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
        self.set_displayable_subtree(child, parent_displayable);
        self.mark_subtree_dirty(child);
    }

    /// `attach` with the arguments the other way around, for call sites that
    /// read as "parent adopts child".
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) {
        self.attach(child, parent);
    }

    /// Detaches a node from its parent. The subtree stays alive but becomes
    /// undisplayable. Detaching the root or an already-detached node is a
    /// no-op.
    pub fn detach(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            log::warn!("detach: stale node key");
            return;
        };
        if node.parent.is_none() {
            return;
        }
        self.unlink_from_parent(key);
        if let Some(n) = self.nodes.get_mut(key) {
            n.parent = None;
        }
        self.set_displayable_subtree(key, false);
        self.mark_subtree_dirty(key);
    }

    /// Detaches the child of `parent` named `name`. An unknown name logs a
    /// warning and no-ops.
    pub fn detach_child(&mut self, parent: NodeKey, name: &str) {
        let Some(parent_node) = self.nodes.get(parent) else {
            log::warn!("detach_child: stale parent key");
            return;
        };
        let parent_name = parent_node.name.clone();
        let child = parent_node
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes.get(c).is_some_and(|n| n.name == name));
        match child {
            Some(c) => self.detach(c),
            None => {
                log::warn!("'{parent_name}' has no child named '{name}'");
            }
        }
    }

    /// Removes `key` from its parent's child list (and nothing else).
    fn unlink_from_parent(&mut self, key: NodeKey) {
        let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent)
            && let Some(i) = p.children.iter().position(|&c| c == key)
        {
            p.children.remove(i);
        }
    }

    fn set_displayable_subtree(&mut self, key: NodeKey, displayable: bool) {
        let mut stack: SmallVec<[NodeKey; 16]> = SmallVec::new();
        stack.push(key);
        while let Some(k) = stack.pop() {
            if let Some(n) = self.nodes.get_mut(k) {
                n.displayable = displayable;
                stack.extend(n.children.iter().copied());
            }
        }
    }

    // ========================================================================
    // Attached objects
    // ========================================================================

    /// Registers a movable object with the graph (detached).
    pub fn create_object(&mut self, name: &str, kind: ObjectKind) -> ObjectKey {
        self.objects.insert(AttachedObject::new(name, kind))
    }

    #[must_use]
    pub fn object(&self, key: ObjectKey) -> Option<&AttachedObject> {
        self.objects.get(key)
    }

    /// Attaches an object to a node. If the object already sits on another
    /// node it is moved, not duplicated.
    pub fn attach_object(&mut self, node: NodeKey, object: ObjectKey) {
        if !self.nodes.contains_key(node) {
            log::warn!("attach_object: stale node key");
            return;
        }
        let Some(obj) = self.objects.get(object) else {
            log::warn!("attach_object: stale object key");
            return;
        };
        if let Some(previous) = obj.node {
            if previous == node {
                return;
            }
            if let Some(p) = self.nodes.get_mut(previous)
                && let Some(i) = p.objects.iter().position(|&o| o == object)
            {
                p.objects.remove(i);
            }
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.objects.push(object);
        }
        if let Some(o) = self.objects.get_mut(object) {
            o.node = Some(node);
        }
    }

    /// Detaches an object from `node`. Logs a warning and no-ops if the
    /// object is not attached there.
    pub fn detach_object(&mut self, node: NodeKey, object: ObjectKey) {
        let attached_here = self
            .objects
            .get(object)
            .is_some_and(|o| o.node == Some(node));
        if !attached_here {
            log::warn!("detach_object: object is not attached to this node");
            return;
        }
        if let Some(n) = self.nodes.get_mut(node)
            && let Some(i) = n.objects.iter().position(|&o| o == object)
        {
            n.objects.remove(i);
        }
        if let Some(o) = self.objects.get_mut(object) {
            o.node = None;
        }
    }

    // ========================================================================
    // Local transform mutation
    // ========================================================================

    pub fn set_position(&mut self, key: NodeKey, position: Vec3) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.transform.set_position(position);
            self.mark_descendants_derived_dirty(key);
        }
    }

    pub fn set_rotation(&mut self, key: NodeKey, rotation: Quat) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.transform.set_rotation(rotation);
            self.mark_descendants_derived_dirty(key);
        }
    }

    pub fn set_scale(&mut self, key: NodeKey, scale: Vec3) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.transform.set_scale(scale);
            self.mark_descendants_derived_dirty(key);
        }
    }

    pub fn translate(&mut self, key: NodeKey, delta: Vec3) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.transform.translate(delta);
            self.mark_descendants_derived_dirty(key);
        }
    }

    pub fn rotate(&mut self, key: NodeKey, delta: Quat) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.transform.rotate(delta);
            self.mark_descendants_derived_dirty(key);
        }
    }

    pub fn scale_by(&mut self, key: NodeKey, factor: Vec3) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.transform.scale_by(factor);
            self.mark_descendants_derived_dirty(key);
        }
    }

    /// Writes a full TRS pose into a node's local transform. The write path
    /// used by animation playback; dirty propagation matches the setters.
    pub fn apply_pose(&mut self, key: NodeKey, pose: &Pose) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.transform.set_pose(pose);
            self.mark_descendants_derived_dirty(key);
        }
    }

    /// Every local edit invalidates the derived caches of the whole subtree
    /// below it, eagerly and unconditionally. O(subtree) per edit; the
    /// trade-off that keeps matrix queries O(1) after an update pass.
    fn mark_descendants_derived_dirty(&mut self, key: NodeKey) {
        let mut stack: SmallVec<[NodeKey; 16]> = SmallVec::new();
        if let Some(n) = self.nodes.get(key) {
            stack.extend(n.children.iter().copied());
        }
        while let Some(k) = stack.pop() {
            if let Some(n) = self.nodes.get_mut(k) {
                n.transform.mark_derived_dirty();
                stack.extend(n.children.iter().copied());
            }
        }
    }

    /// Dirties a re-parented node (local + derived) and the derived caches
    /// of everything below it.
    fn mark_subtree_dirty(&mut self, key: NodeKey) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.transform.mark_dirty();
        }
        self.mark_descendants_derived_dirty(key);
    }

    // ========================================================================
    // Update pass
    // ========================================================================

    /// The single per-frame entry point that refreshes every cached matrix
    /// reachable from the root. Visits all children unconditionally; per
    /// node it recomputes the local matrix iff local-dirty and the derived
    /// matrix iff derived-dirty, recording each derived recomputation in
    /// [`changed_nodes`](Self::changed_nodes) exactly once.
    ///
    /// Uses an explicit work stack so deep hierarchies cannot overflow the
    /// call stack.
    pub fn update(&mut self) {
        self.changed.clear();

        let mut stack: Vec<(NodeKey, Mat4)> = Vec::with_capacity(64);
        stack.push((self.root, Mat4::IDENTITY));

        while let Some((key, parent_derived)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };

            node.transform.update_local();
            if node.transform.is_derived_dirty() {
                let derived = parent_derived * *node.transform.local_matrix();
                node.transform.set_derived_matrix(derived);
                self.changed.push(key);
            }

            let current = *node.transform.derived_matrix();
            for i in (0..node.children.len()).rev() {
                stack.push((node.children[i], current));
            }
        }
    }

    /// Keys whose derived matrix was recomputed by the last [`update`]
    /// pass, in traversal order. Collaborators caching derived state (light
    /// or camera matrices) refresh from this list.
    ///
    /// [`update`]: Self::update
    #[must_use]
    pub fn changed_nodes(&self) -> &[NodeKey] {
        &self.changed
    }

    // ========================================================================
    // Derived queries
    // ========================================================================

    /// Cached derived matrix. O(1), valid after [`update`](Self::update).
    #[must_use]
    pub fn derived_matrix(&self, key: NodeKey) -> Option<Mat4> {
        self.nodes.get(key).map(|n| *n.transform.derived_matrix())
    }

    /// Cached local matrix. O(1), valid after [`update`](Self::update).
    #[must_use]
    pub fn local_matrix(&self, key: NodeKey) -> Option<Mat4> {
        self.nodes.get(key).map(|n| *n.transform.local_matrix())
    }

    /// Derived position, composed on the fly by walking the parent chain.
    /// O(depth) per call and always current, unlike the cached matrices.
    #[must_use]
    pub fn derived_position(&self, key: NodeKey) -> Option<Vec3> {
        self.derived_trs(key).map(|(p, _, _)| p)
    }

    /// Derived rotation, composed on the fly. O(depth).
    #[must_use]
    pub fn derived_rotation(&self, key: NodeKey) -> Option<Quat> {
        self.derived_trs(key).map(|(_, r, _)| r)
    }

    /// Derived scale, composed on the fly. O(depth). With non-uniform
    /// ancestor scale under rotation this is the usual component-wise
    /// approximation.
    #[must_use]
    pub fn derived_scale(&self, key: NodeKey) -> Option<Vec3> {
        self.derived_trs(key).map(|(_, _, s)| s)
    }

    fn derived_trs(&self, key: NodeKey) -> Option<(Vec3, Quat, Vec3)> {
        let node = self.nodes.get(key)?;
        let t = &node.transform;
        match node.parent {
            None => Some((t.position(), t.rotation(), t.scale())),
            Some(parent) => {
                let (pp, pq, ps) = self.derived_trs(parent)?;
                // Mirrors the T * S * R matrix composition: rotate, then
                // scale in the parent frame, then offset.
                let position = pp + ps * (pq * t.position());
                let rotation = (pq * t.rotation()).normalize();
                let scale = ps * t.scale();
                Some((position, rotation, scale))
            }
        }
    }

    /// Effective visibility: the node's own flag and every ancestor's flag.
    /// A node hidden by an ancestor is never visible.
    #[must_use]
    pub fn is_visible(&self, key: NodeKey) -> bool {
        let Some(node) = self.nodes.get(key) else {
            return false;
        };
        if !node.visible {
            return false;
        }
        let mut current = node.parent;
        while let Some(k) = current {
            let Some(n) = self.nodes.get(k) else {
                return false;
            };
            if !n.visible {
                return false;
            }
            current = n.parent;
        }
        true
    }
}

//! Scene graph: node hierarchy, transforms and attached objects.
//!
//! - [`SceneNode`]: a tree node holding a name, a [`Transform`] and key-based
//!   links to its parent, children and attached objects
//! - [`Transform`]: local TRS with cached local/derived matrices and dirty
//!   tracking
//! - [`SceneGraph`]: the arena that owns every node and object and performs
//!   all structural edits and the per-frame update pass

pub mod graph;
pub mod node;
pub mod transform;

pub use graph::SceneGraph;
pub use node::{AttachedObject, ObjectKind, SceneNode};
pub use transform::{Pose, Transform};

use slotmap::new_key_type;

new_key_type! {
    /// Key of a node in a [`SceneGraph`] arena.
    pub struct NodeKey;
    /// Key of an attached object in a [`SceneGraph`] arena.
    pub struct ObjectKey;
}

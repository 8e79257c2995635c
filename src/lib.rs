//! Scene-graph transform hierarchy and animation playback core.
//!
//! The crate has two halves:
//!
//! - [`scene`]: a mutable node tree with lazily-cached derived (world)
//!   transforms. All nodes live in an arena owned by [`SceneGraph`]; the
//!   hierarchy is expressed as keys, never ownership. One
//!   [`SceneGraph::update`] pass per frame refreshes the cached matrices.
//! - [`animation`]: named keyframe [`Track`]s played back through
//!   per-binding [`PlaybackCursor`] state machines, fanned out from a single
//!   wall-clock tick by a [`PlaybackGroup`]. Sampled poses are written
//!   straight into the bound node's local transform.
//!
//! Rendering, GPU resources and asset containers are external collaborators:
//! they read [`SceneGraph::derived_matrix`] after an update pass and feed
//! track data in through the chunk boundary in [`animation::chunk`].

pub mod animation;
pub mod errors;
pub mod scene;
pub mod utils;

pub use animation::{
    AnimatedBinding, AnimationTarget, BracketCursor, KeyFrame, PlaybackCursor, PlaybackGroup,
    PlaybackState, Track, TrackParams, TrackSet,
};
pub use errors::{OrreryError, Result};
pub use scene::{AttachedObject, NodeKey, ObjectKey, ObjectKind, Pose, SceneGraph, SceneNode, Transform};
pub use utils::time::Timer;

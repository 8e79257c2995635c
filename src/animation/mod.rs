//! Animation playback: keyframe tracks, per-track playback cursors,
//! instance bindings and the group that drives them from one clock.
//!
//! Data flow per frame: [`PlaybackGroup::update`] ticks its timer once and
//! broadcasts the elapsed time to every [`AnimatedBinding`], which forwards
//! it to its playing [`PlaybackCursor`]; the cursor advances, resolves the
//! keyframe bracket on its [`Track`], interpolates, and the binding writes
//! the resulting pose into the bound node's local transform. Cached world
//! matrices refresh separately in the scene graph's own update pass.

pub mod binding;
pub mod chunk;
pub mod cursor;
pub mod group;
pub mod track;

pub use binding::{AnimatedBinding, AnimationTarget, TrackSet};
pub use cursor::{PlaybackCursor, PlaybackState};
pub use group::{PlaybackGroup, TrackParams};
pub use track::{BracketCursor, KeyFrame, Track};

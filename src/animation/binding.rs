use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::animation::cursor::{PlaybackCursor, PlaybackState};
use crate::animation::track::Track;
use crate::scene::graph::SceneGraph;
use crate::scene::NodeKey;

/// The animable source: the named tracks defined on one entity. Bindings
/// share the tracks by `Arc`, the set itself stays with whoever owns the
/// entity description (typically a loaded asset).
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    tracks: FxHashMap<String, Arc<Track>>,
}

impl TrackSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a track under its own name. A name collision logs a warning and
    /// keeps the existing track (same policy as duplicate child names).
    pub fn insert(&mut self, track: Track) -> Arc<Track> {
        if let Some(existing) = self.tracks.get(track.name()) {
            log::warn!(
                "A track named '{}' already exists in this set, keeping the existing one",
                track.name()
            );
            return existing.clone();
        }
        let track = Arc::new(track);
        self.tracks.insert(track.name().to_owned(), track.clone());
        track
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Track>> {
        self.tracks.get(name)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tracks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Which live instance a binding drives, chosen at construction.
///
/// Both variants land the sampled pose on a node's local transform: a plain
/// scene node, or the root bone of a skeleton-driven instance (the skinning
/// math downstream of that bone is the renderer's business).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTarget {
    Node(NodeKey),
    SkeletonRoot(NodeKey),
}

impl AnimationTarget {
    #[must_use]
    pub fn node_key(self) -> NodeKey {
        match self {
            Self::Node(key) | Self::SkeletonRoot(key) => key,
        }
    }
}

/// Binds one live instance to the tracks defined on it and holds at most
/// one actively playing cursor.
///
/// Cursors are built lazily per named track via
/// [`add_track`](Self::add_track). Starting a second track while one is
/// playing is a protocol violation (a debug assertion, not a recoverable
/// error); lookups of unknown track names fail silently throughout.
pub struct AnimatedBinding {
    name: String,
    target: AnimationTarget,
    source: Arc<TrackSet>,
    cursors: FxHashMap<String, PlaybackCursor>,
    /// Name of the active cursor; aliases an entry of `cursors`.
    playing: Option<String>,
}

impl AnimatedBinding {
    #[must_use]
    pub fn new(name: &str, target: AnimationTarget, source: Arc<TrackSet>) -> Self {
        Self {
            name: name.to_owned(),
            target,
            source,
            cursors: FxHashMap::default(),
            playing: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> AnimationTarget {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &Arc<TrackSet> {
        &self.source
    }

    /// Builds a cursor for the named track if the source defines it and no
    /// cursor exists yet; otherwise silently does nothing.
    pub fn add_track(&mut self, name: &str) {
        if self.cursors.contains_key(name) {
            return;
        }
        if let Some(track) = self.source.get(name) {
            self.cursors
                .insert(name.to_owned(), PlaybackCursor::new(track.clone()));
        }
    }

    #[must_use]
    pub fn cursor(&self, name: &str) -> Option<&PlaybackCursor> {
        self.cursors.get(name)
    }

    pub fn cursor_mut(&mut self, name: &str) -> Option<&mut PlaybackCursor> {
        self.cursors.get_mut(name)
    }

    /// Starts (or resumes) the named track. Unknown names are ignored.
    pub fn start(&mut self, name: &str) {
        if !self.cursors.contains_key(name) {
            return;
        }
        if self.playing.as_deref() != Some(name) {
            self.on_start(name);
        }
        if let Some(cursor) = self.cursors.get_mut(name) {
            cursor.play();
        }
    }

    /// Stops the named track. Unknown names and already-stopped cursors are
    /// ignored, so group-level fan-out can stop every name blindly; actually
    /// stopping a cursor while a *different* track is active trips the
    /// `on_stop` precondition.
    pub fn stop(&mut self, name: &str) {
        let Some(cursor) = self.cursors.get_mut(name) else {
            return;
        };
        if cursor.state() == PlaybackState::Stopped {
            return;
        }
        cursor.stop();
        self.on_stop(name);
    }

    /// Pauses the named track in place; it stays the active cursor.
    pub fn pause(&mut self, name: &str) {
        if let Some(cursor) = self.cursors.get_mut(name) {
            cursor.pause();
        }
    }

    /// Precondition: no cursor is currently active on this binding.
    fn on_start(&mut self, name: &str) {
        debug_assert!(
            self.playing.is_none(),
            "binding '{}': cannot start '{}', '{}' is still playing",
            self.name,
            name,
            self.playing.as_deref().unwrap_or_default()
        );
        self.playing = Some(name.to_owned());
    }

    /// Precondition: `name` is the active cursor.
    fn on_stop(&mut self, name: &str) {
        debug_assert!(
            self.playing.as_deref() == Some(name),
            "binding '{}': stopping '{}' but '{}' is the active track",
            self.name,
            name,
            self.playing.as_deref().unwrap_or_default()
        );
        self.playing = None;
    }

    /// True iff an active cursor reference is held (Playing or Paused).
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.is_some()
    }

    #[must_use]
    pub fn playing_track(&self) -> Option<&str> {
        self.playing.as_deref()
    }

    /// Forwards `elapsed` to the active cursor and writes the sampled pose
    /// into the target node's local transform. No-op when nothing plays. A
    /// non-looping cursor that runs off its stopping point releases the
    /// active reference so the binding can start another track.
    pub fn update(&mut self, elapsed: f32, graph: &mut SceneGraph) {
        let Some(name) = self.playing.as_deref() else {
            return;
        };
        let Some(cursor) = self.cursors.get_mut(name) else {
            return;
        };

        let pose = cursor.update(elapsed);
        let finished = cursor.state() == PlaybackState::Stopped;

        if let Some(pose) = pose {
            graph.apply_pose(self.target.node_key(), &pose);
        }
        if finished {
            self.playing = None;
        }
    }
}

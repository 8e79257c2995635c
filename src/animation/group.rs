use rustc_hash::FxHashMap;

use crate::animation::binding::AnimatedBinding;
use crate::errors::{OrreryError, Result};
use crate::scene::graph::SceneGraph;
use crate::utils::time::Timer;

/// Group-level playback defaults for one named track.
///
/// These are defaults applied when a cursor is (re)started through the
/// group, not live overrides: changing a parameter after a cursor started
/// takes effect on its next start.
#[derive(Debug, Clone, Copy)]
pub struct TrackParams {
    pub looped: bool,
    pub time_scale: f32,
    /// Lower playback bound; `None` keeps the cursor's default (track start).
    pub start_point: Option<f32>,
    /// Upper playback bound; `None` keeps the cursor's default (track end).
    pub stop_point: Option<f32>,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            looped: false,
            time_scale: 1.0,
            start_point: None,
            stop_point: None,
        }
    }
}

/// Owns a set of [`AnimatedBinding`]s and drives them all from one clock.
///
/// One [`update`](Self::update) per frame reads a single elapsed value from
/// the internal monotonic timer and broadcasts it to every binding in
/// registration order; there are no per-binding clocks.
pub struct PlaybackGroup {
    /// Registration order is broadcast order, so a Vec rather than a map.
    bindings: Vec<AnimatedBinding>,
    params: FxHashMap<String, TrackParams>,
    timer: Timer,
}

impl Default for PlaybackGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackGroup {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            params: FxHashMap::default(),
            timer: Timer::new(),
        }
    }

    // ========================================================================
    // Bindings
    // ========================================================================

    /// Registers a binding. Fails if one with the same name already exists.
    pub fn add_binding(&mut self, binding: AnimatedBinding) -> Result<()> {
        if self.bindings.iter().any(|b| b.name() == binding.name()) {
            return Err(OrreryError::DuplicateBinding(binding.name().to_owned()));
        }
        self.bindings.push(binding);
        Ok(())
    }

    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&AnimatedBinding> {
        self.bindings.iter().find(|b| b.name() == name)
    }

    pub fn binding_mut(&mut self, name: &str) -> Option<&mut AnimatedBinding> {
        self.bindings.iter_mut().find(|b| b.name() == name)
    }

    #[must_use]
    pub fn bindings(&self) -> &[AnimatedBinding] {
        &self.bindings
    }

    // ========================================================================
    // Track parameters
    // ========================================================================

    /// Records default parameters for a named track and adds the track to
    /// every *currently* registered binding. Bindings registered afterwards
    /// do not pick it up automatically; repeat the call for them.
    pub fn add_track(&mut self, name: &str) {
        self.params.entry(name.to_owned()).or_default();
        for binding in &mut self.bindings {
            binding.add_track(name);
        }
    }

    #[must_use]
    pub fn track_params(&self, name: &str) -> Option<&TrackParams> {
        self.params.get(name)
    }

    pub fn set_track_looped(&mut self, name: &str, looped: bool) {
        match self.params.get_mut(name) {
            Some(p) => p.looped = looped,
            None => log::warn!("This group has no track parameters named '{name}'"),
        }
    }

    pub fn set_track_time_scale(&mut self, name: &str, scale: f32) {
        match self.params.get_mut(name) {
            Some(p) => p.time_scale = scale,
            None => log::warn!("This group has no track parameters named '{name}'"),
        }
    }

    pub fn set_track_start_point(&mut self, name: &str, start: f32) {
        match self.params.get_mut(name) {
            Some(p) => p.start_point = Some(start),
            None => log::warn!("This group has no track parameters named '{name}'"),
        }
    }

    pub fn set_track_stop_point(&mut self, name: &str, stop: f32) {
        match self.params.get_mut(name) {
            Some(p) => p.stop_point = Some(stop),
            None => log::warn!("This group has no track parameters named '{name}'"),
        }
    }

    fn apply_params(binding: &mut AnimatedBinding, name: &str, params: TrackParams) {
        if let Some(cursor) = binding.cursor_mut(name) {
            cursor.set_looped(params.looped);
            cursor.set_time_scale(params.time_scale);
            if let Some(start) = params.start_point {
                cursor.set_start_point(start);
            }
            if let Some(stop) = params.stop_point {
                cursor.set_stop_point(stop);
            }
        }
    }

    // ========================================================================
    // Playback fan-out
    // ========================================================================

    /// Starts the named track on every binding, applying the group's
    /// parameter record to each cursor first.
    pub fn start(&mut self, name: &str) {
        let Some(params) = self.params.get(name).copied() else {
            log::warn!("This group has no track parameters named '{name}'");
            return;
        };
        for binding in &mut self.bindings {
            Self::apply_params(binding, name, params);
            binding.start(name);
        }
    }

    /// Stops the named track on every binding.
    pub fn stop(&mut self, name: &str) {
        for binding in &mut self.bindings {
            binding.stop(name);
        }
    }

    /// Pauses the named track on every binding.
    pub fn pause(&mut self, name: &str) {
        for binding in &mut self.bindings {
            binding.pause(name);
        }
    }

    /// Starts every known track on every binding. With sources defining
    /// more than one of the group's tracks this violates the one-active-
    /// cursor rule; such callers start tracks by name instead.
    pub fn start_all(&mut self) {
        for name in self.track_names() {
            self.start(&name);
        }
    }

    /// Stops every known track on every binding.
    pub fn stop_all(&mut self) {
        for name in self.track_names() {
            self.stop(&name);
        }
    }

    /// Pauses every known track on every binding.
    pub fn pause_all(&mut self) {
        for name in self.track_names() {
            self.pause(&name);
        }
    }

    fn track_names(&self) -> Vec<String> {
        self.params.keys().cloned().collect()
    }

    // ========================================================================
    // Per-frame drive
    // ========================================================================

    /// Reads the elapsed wall-clock time since the previous call from the
    /// internal timer and broadcasts it to every binding.
    pub fn update(&mut self, graph: &mut SceneGraph) {
        let dt = self.timer.tick().as_secs_f32();
        self.advance(dt, graph);
    }

    /// Clock-free variant of [`update`](Self::update): broadcasts an
    /// explicit elapsed time, in registration order.
    pub fn advance(&mut self, dt: f32, graph: &mut SceneGraph) {
        for binding in &mut self.bindings {
            binding.update(dt, graph);
        }
    }
}

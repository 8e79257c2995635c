use std::sync::Arc;

use crate::animation::track::{BracketCursor, Track};
use crate::scene::transform::Pose;

/// Lifecycle state of a [`PlaybackCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Initial and terminal state. Time rests at the starting point after an
    /// explicit stop, or at the stopping point after a non-looping run-off.
    Stopped,
    Playing,
    Paused,
}

/// The per-track playback state machine: advances time, resolves the
/// current keyframe bracket and yields the interpolated pose.
///
/// Invariant: `start_point <= time <= stop_point` after every call. State
/// changes only through [`play`](Self::play) / [`pause`](Self::pause) /
/// [`stop`](Self::stop), plus the automatic transition to `Stopped` when a
/// non-looping cursor runs off its stopping point.
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    track: Arc<Track>,
    time_scale: f32,
    looped: bool,
    start_point: f32,
    stop_point: f32,
    time: f32,
    state: PlaybackState,
    bracket: BracketCursor,
}

impl PlaybackCursor {
    /// A stopped cursor over the whole track, resting at its start.
    #[must_use]
    pub fn new(track: Arc<Track>) -> Self {
        let stop_point = track.duration();
        Self {
            track,
            time_scale: 1.0,
            looped: false,
            start_point: 0.0,
            stop_point,
            time: 0.0,
            state: PlaybackState::Stopped,
            bracket: BracketCursor::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    #[inline]
    #[must_use]
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
    }

    #[inline]
    #[must_use]
    pub fn start_point(&self) -> f32 {
        self.start_point
    }

    #[inline]
    #[must_use]
    pub fn stop_point(&self) -> f32 {
        self.stop_point
    }

    /// Moves the lower playback bound, clamping the current time back into
    /// the new range if necessary.
    pub fn set_start_point(&mut self, start: f32) {
        self.start_point = start;
        self.time = self.time.clamp(self.start_point, self.stop_point.max(self.start_point));
    }

    /// Moves the upper playback bound, clamping the current time back into
    /// the new range if necessary.
    pub fn set_stop_point(&mut self, stop: f32) {
        self.stop_point = stop;
        self.time = self.time.clamp(self.start_point.min(self.stop_point), self.stop_point);
    }

    /// Jumps to an absolute time, clamped into the playback bounds.
    pub fn set_time(&mut self, time: f32) {
        self.time = time.clamp(self.start_point, self.stop_point);
    }

    /// Stopped or Paused -> Playing. Resumes from the current time; an
    /// explicit [`stop`](Self::stop) is what rewinds.
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Playing -> Paused; no-op in any other state.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Any state -> Stopped, rewinding to the starting point.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = self.start_point;
    }

    /// Advances playback by `elapsed` seconds and returns the interpolated
    /// pose at the new time. A no-op returning `None` unless Playing.
    ///
    /// Running past the stopping point either wraps into
    /// `[start_point, stop_point)` (looped; handles arbitrarily large steps,
    /// not just one wrap) or clamps to the stopping point and transitions to
    /// Stopped, leaving the time there. Symmetric handling below the
    /// starting point covers negative time scales.
    pub fn update(&mut self, elapsed: f32) -> Option<Pose> {
        if self.state != PlaybackState::Playing {
            return None;
        }

        let span = self.stop_point - self.start_point;
        let mut new_time = self.time + elapsed * self.time_scale;

        if new_time > self.stop_point {
            if self.looped && span > 0.0 {
                new_time = self.start_point + (new_time - self.start_point).rem_euclid(span);
            } else {
                new_time = self.stop_point;
                self.state = PlaybackState::Stopped;
            }
        } else if new_time < self.start_point {
            if self.looped && span > 0.0 {
                new_time = self.start_point + (new_time - self.start_point).rem_euclid(span);
            } else {
                new_time = self.start_point;
                self.state = PlaybackState::Stopped;
            }
        }
        self.time = new_time;

        self.do_update()
    }

    /// Bracket lookup + interpolation at the current time.
    fn do_update(&mut self) -> Option<Pose> {
        self.track.sample(self.time, &mut self.bracket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::track::KeyFrame;
    use glam::Vec3;

    fn test_track() -> Arc<Track> {
        let mut track = Track::new("move");
        track.add_keyframe(KeyFrame::new(0.0));
        let mut end = KeyFrame::new(1.0);
        end.set_position(Vec3::new(10.0, 0.0, 0.0));
        track.add_keyframe(end);
        Arc::new(track)
    }

    #[test]
    fn looping_wraps_multiple_times() {
        let mut cursor = PlaybackCursor::new(test_track());
        cursor.set_looped(true);
        cursor.play();
        cursor.set_time(0.8);
        cursor.update(1.5);
        assert!((cursor.time() - 0.3).abs() < 1e-5);
        assert_eq!(cursor.state(), PlaybackState::Playing);
    }

    #[test]
    fn non_looping_clamps_and_stops() {
        let mut cursor = PlaybackCursor::new(test_track());
        cursor.play();
        cursor.set_time(0.8);
        cursor.update(1.5);
        assert!((cursor.time() - 1.0).abs() < 1e-6);
        assert_eq!(cursor.state(), PlaybackState::Stopped);

        // Idempotent once stopped.
        cursor.update(0.5);
        assert!((cursor.time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stop_rewinds_play_resumes() {
        let mut cursor = PlaybackCursor::new(test_track());
        cursor.play();
        cursor.update(0.4);
        cursor.pause();
        assert_eq!(cursor.state(), PlaybackState::Paused);
        let at = cursor.time();

        cursor.play();
        assert!((cursor.time() - at).abs() < 1e-6);

        cursor.stop();
        assert_eq!(cursor.state(), PlaybackState::Stopped);
        assert!((cursor.time() - 0.0).abs() < 1e-6);
    }
}

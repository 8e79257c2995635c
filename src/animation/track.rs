use glam::{Quat, Vec3};

use crate::scene::transform::Pose;

/// How far [`Track::find_bracket`] scans linearly from the cursor's last
/// position before falling back to a binary search.
const MAX_SCAN_OFFSET: usize = 3;

/// A single timestamped pose within a [`Track`].
///
/// Keyframes are written through the setters during construction and
/// deserialization and treated as immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyFrame {
    time: f32,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl KeyFrame {
    /// A keyframe at `time` (seconds) holding the identity pose.
    #[must_use]
    pub fn new(time: f32) -> Self {
        Self {
            time,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    #[must_use]
    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

/// Sampling state carried between [`Track::find_bracket`] calls.
///
/// Remembers the bracket index used last time so that monotonically
/// advancing playback resolves in amortized O(1); arbitrary seeks fall back
/// to a binary search.
#[derive(Debug, Clone, Default)]
pub struct BracketCursor {
    last_index: usize,
}

/// A named, time-ordered sequence of keyframes.
///
/// The keyframe list is kept sorted by non-decreasing time; a track with
/// zero or one keyframe is the degenerate non-interpolating case.
#[derive(Debug, Clone)]
pub struct Track {
    name: String,
    keyframes: Vec<KeyFrame>,
}

impl Track {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyframes: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn keyframes(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Time of the last keyframe, or zero for an empty track.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map_or(0.0, KeyFrame::time)
    }

    /// Inserts a keyframe at its sorted position. Equal time indices keep
    /// insertion order.
    pub fn add_keyframe(&mut self, keyframe: KeyFrame) {
        let at = self
            .keyframes
            .partition_point(|k| k.time <= keyframe.time);
        self.keyframes.insert(at, keyframe);
    }

    /// Inserts an identity keyframe at `time` and returns it for filling in,
    /// the shape deserialization wants.
    pub fn create_keyframe(&mut self, time: f32) -> &mut KeyFrame {
        let at = self.keyframes.partition_point(|k| k.time <= time);
        self.keyframes.insert(at, KeyFrame::new(time));
        &mut self.keyframes[at]
    }

    /// Resolves the keyframe bracket `(prev, curr)` straddling `time`,
    /// starting from where the cursor rested after the previous call.
    ///
    /// A short linear scan (forward or backward, so a loop rewind stays
    /// cheap) handles monotonic playback in amortized O(1); anything farther
    /// falls back to a binary search. Outside the track's time range the
    /// bracket rests on the first or last keyframe; a single-keyframe track
    /// resolves both indices to it. Returns `None` for an empty track.
    pub fn find_bracket(&self, time: f32, cursor: &mut BracketCursor) -> Option<(usize, usize)> {
        let len = self.keyframes.len();
        if len == 0 {
            return None;
        }
        if len == 1 {
            cursor.last_index = 0;
            return Some((0, 0));
        }

        // A stale cursor (track swapped underneath) clamps into range.
        let i = cursor.last_index.min(len - 1);
        let t_curr = self.keyframes[i].time;

        let found = if time >= t_curr {
            // Forward playback: check the next few intervals.
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if time >= self.keyframes[len - 1].time {
                        res = Some(len - 1);
                    }
                    break;
                }
                if time < self.keyframes[idx + 1].time {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Rewind (loop wrap or reverse playback): scan backward.
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= self.keyframes[idx].time {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let prev = found.unwrap_or_else(|| {
            // Large jump: binary search for the last keyframe at or before `time`.
            let next = self.keyframes.partition_point(|k| k.time <= time);
            next.saturating_sub(1)
        });
        cursor.last_index = prev;

        let curr = if time < self.keyframes[prev].time {
            // Before the first keyframe: rest on it.
            prev
        } else {
            (prev + 1).min(len - 1)
        };
        Some((prev, curr))
    }

    /// Interpolated pose at `time`: linear for position and scale, spherical
    /// for rotation. The ratio is zero when the bracket's two time indices
    /// coincide (degenerate tracks, duplicate time stamps), so exact
    /// keyframe hits reproduce the keyframe value. `None` for empty tracks.
    pub fn sample(&self, time: f32, cursor: &mut BracketCursor) -> Option<Pose> {
        let (prev, curr) = self.find_bracket(time, cursor)?;
        let a = &self.keyframes[prev];
        let b = &self.keyframes[curr];

        let dt = b.time - a.time;
        let ratio = if dt > f32::EPSILON {
            ((time - a.time) / dt).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Some(Pose {
            position: a.position.lerp(b.position, ratio),
            rotation: a.rotation.slerp(b.rotation, ratio),
            scale: a.scale.lerp(b.scale, ratio),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_key_track() -> Track {
        let mut track = Track::new("move");
        let kf = track.create_keyframe(0.0);
        kf.set_position(Vec3::ZERO);
        let kf = track.create_keyframe(1.0);
        kf.set_position(Vec3::new(10.0, 0.0, 0.0));
        track
    }

    #[test]
    fn add_keyframe_keeps_time_order() {
        let mut track = Track::new("t");
        track.add_keyframe(KeyFrame::new(1.0));
        track.add_keyframe(KeyFrame::new(0.25));
        track.add_keyframe(KeyFrame::new(0.5));
        let times: Vec<f32> = track.keyframes().iter().map(KeyFrame::time).collect();
        assert_eq!(times, vec![0.25, 0.5, 1.0]);
    }

    #[test]
    fn bracket_monotonic_forward() {
        let track = two_key_track();
        let mut cursor = BracketCursor::default();
        assert_eq!(track.find_bracket(0.2, &mut cursor), Some((0, 1)));
        assert_eq!(track.find_bracket(0.9, &mut cursor), Some((0, 1)));
        assert_eq!(track.find_bracket(1.5, &mut cursor), Some((1, 1)));
    }

    #[test]
    fn bracket_single_keyframe_degenerate() {
        let mut track = Track::new("t");
        track.add_keyframe(KeyFrame::new(0.5));
        let mut cursor = BracketCursor::default();
        assert_eq!(track.find_bracket(2.0, &mut cursor), Some((0, 0)));
        let pose = track.sample(2.0, &mut cursor).unwrap();
        assert_eq!(pose.position, Vec3::ZERO);
    }

    #[test]
    fn sample_midpoint_lerps() {
        let track = two_key_track();
        let mut cursor = BracketCursor::default();
        let pose = track.sample(0.5, &mut cursor).unwrap();
        assert!((pose.position.x - 5.0).abs() < 1e-5);
    }
}

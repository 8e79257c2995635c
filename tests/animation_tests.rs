//! Track and cursor tests
//!
//! Tests for:
//! - Keyframe ordering and duplicate time stamps
//! - Bracket resolution: scan, rewind, binary-search fallback, out-of-range
//! - Exact keyframe hits reproducing the keyframe value
//! - Playback bounds, looping and negative time scale

use glam::{Quat, Vec3};
use orrery::{BracketCursor, KeyFrame, PlaybackCursor, PlaybackState, Track};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

const EPSILON: f32 = 1e-5;

fn keyframe_at(time: f32, x: f32) -> KeyFrame {
    let mut kf = KeyFrame::new(time);
    kf.set_position(Vec3::new(x, 0.0, 0.0));
    kf
}

/// Ten keyframes at t = 0.0, 0.1, .. 0.9 with position.x = 10 * t.
fn ramp_track() -> Track {
    let mut track = Track::new("ramp");
    for i in 0..10 {
        let t = i as f32 * 0.1;
        track.add_keyframe(keyframe_at(t, t * 10.0));
    }
    track
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn keyframes_insert_in_time_order() {
    let mut track = Track::new("t");
    track.add_keyframe(KeyFrame::new(2.0));
    track.add_keyframe(KeyFrame::new(0.5));
    track.add_keyframe(KeyFrame::new(1.0));
    track.add_keyframe(KeyFrame::new(0.0));
    let times: Vec<f32> = track.keyframes().iter().map(KeyFrame::time).collect();
    assert_eq!(times, vec![0.0, 0.5, 1.0, 2.0]);
    assert!((track.duration() - 2.0).abs() < EPSILON);
}

#[test]
fn duplicate_times_keep_insertion_order() {
    let mut track = Track::new("t");
    track.add_keyframe(keyframe_at(1.0, 1.0));
    track.add_keyframe(keyframe_at(1.0, 2.0));
    let xs: Vec<f32> = track
        .keyframes()
        .iter()
        .map(|k| k.position().x)
        .collect();
    assert_eq!(xs, vec![1.0, 2.0]);

    // A zero-width bracket resolves to the last keyframe at that time.
    let mut cursor = BracketCursor::default();
    let pose = track.sample(1.0, &mut cursor).unwrap();
    assert!((pose.position.x - 2.0).abs() < EPSILON);
}

// ============================================================================
// Bracket resolution
// ============================================================================

#[test]
fn empty_track_has_no_bracket() {
    let track = Track::new("empty");
    let mut cursor = BracketCursor::default();
    assert_eq!(track.find_bracket(0.5, &mut cursor), None);
    assert!(track.sample(0.5, &mut cursor).is_none());
    assert!((track.duration() - 0.0).abs() < EPSILON);
}

#[test]
fn bracket_clamps_outside_the_time_range() {
    let track = ramp_track();
    let mut cursor = BracketCursor::default();
    // Before the first keyframe: rest on it.
    assert_eq!(track.find_bracket(-1.0, &mut cursor), Some((0, 0)));
    // Past the last keyframe: rest on it.
    assert_eq!(track.find_bracket(5.0, &mut cursor), Some((9, 9)));
}

#[test]
fn bracket_survives_large_forward_jump() {
    let track = ramp_track();
    let mut cursor = BracketCursor::default();
    assert_eq!(track.find_bracket(0.05, &mut cursor), Some((0, 1)));
    // Far beyond the linear-scan window; binary fallback must land right.
    assert_eq!(track.find_bracket(0.85, &mut cursor), Some((8, 9)));
}

#[test]
fn bracket_survives_loop_rewind() {
    let track = ramp_track();
    let mut cursor = BracketCursor::default();
    assert_eq!(track.find_bracket(0.85, &mut cursor), Some((8, 9)));
    // Wrapping back to near the start, well outside the backward window.
    assert_eq!(track.find_bracket(0.05, &mut cursor), Some((0, 1)));
}

#[test]
fn monotonic_advance_tracks_the_bracket() {
    let track = ramp_track();
    let mut cursor = BracketCursor::default();
    let mut t = 0.0;
    while t < 0.95 {
        let (prev, curr) = track.find_bracket(t, &mut cursor).unwrap();
        assert!(track.keyframes()[prev].time() <= t + EPSILON);
        if curr > prev {
            assert!(t < track.keyframes()[curr].time() + EPSILON);
        }
        t += 0.03;
    }
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn exact_keyframe_hit_reproduces_the_keyframe() {
    let mut track = Track::new("t");
    track.add_keyframe(keyframe_at(0.0, 0.0));
    track.add_keyframe(keyframe_at(1.0, 10.0));
    let mut cursor = BracketCursor::default();

    let pose = track.sample(0.0, &mut cursor).unwrap();
    assert!((pose.position.x - 0.0).abs() < EPSILON);
    let pose = track.sample(1.0, &mut cursor).unwrap();
    assert!((pose.position.x - 10.0).abs() < EPSILON);
}

#[test]
fn rotation_slerps_between_keyframes() {
    let mut track = Track::new("spin");
    track.add_keyframe(KeyFrame::new(0.0));
    let mut end = KeyFrame::new(1.0);
    end.set_rotation(Quat::from_rotation_y(FRAC_PI_2));
    track.add_keyframe(end);

    let mut cursor = BracketCursor::default();
    let pose = track.sample(0.5, &mut cursor).unwrap();
    let expected = Quat::from_rotation_y(FRAC_PI_2 / 2.0);
    assert!(pose.rotation.abs_diff_eq(expected, EPSILON));
}

#[test]
fn sampling_outside_the_range_holds_the_end_poses() {
    let mut track = Track::new("t");
    track.add_keyframe(keyframe_at(0.0, 1.0));
    track.add_keyframe(keyframe_at(1.0, 9.0));
    let mut cursor = BracketCursor::default();

    let pose = track.sample(-0.5, &mut cursor).unwrap();
    assert!((pose.position.x - 1.0).abs() < EPSILON);
    let pose = track.sample(2.0, &mut cursor).unwrap();
    assert!((pose.position.x - 9.0).abs() < EPSILON);
}

// ============================================================================
// Cursor playback bounds
// ============================================================================

fn ramp_cursor() -> PlaybackCursor {
    PlaybackCursor::new(Arc::new(ramp_track()))
}

#[test]
fn cursor_defaults_to_the_whole_track() {
    let cursor = ramp_cursor();
    assert!((cursor.start_point() - 0.0).abs() < EPSILON);
    assert!((cursor.stop_point() - 0.9).abs() < EPSILON);
    assert_eq!(cursor.state(), PlaybackState::Stopped);
}

#[test]
fn playback_bounds_clamp_the_current_time() {
    let mut cursor = ramp_cursor();
    cursor.play();
    cursor.set_time(0.8);
    cursor.set_stop_point(0.5);
    assert!((cursor.time() - 0.5).abs() < EPSILON);

    cursor.set_start_point(0.6);
    assert!(cursor.time() >= cursor.start_point() - EPSILON);
}

#[test]
fn looping_respects_a_sub_range() {
    let mut cursor = ramp_cursor();
    cursor.set_start_point(0.2);
    cursor.set_stop_point(0.6);
    cursor.set_looped(true);
    cursor.set_time(0.5);
    cursor.play();

    // 0.5 + 0.25 = 0.75 wraps into [0.2, 0.6) at 0.35.
    cursor.update(0.25);
    assert!((cursor.time() - 0.35).abs() < EPSILON);
    assert_eq!(cursor.state(), PlaybackState::Playing);
}

#[test]
fn negative_time_scale_plays_backwards() {
    let mut cursor = ramp_cursor();
    cursor.set_time_scale(-1.0);
    cursor.set_time(0.5);
    cursor.play();

    let pose = cursor.update(0.2).unwrap();
    assert!((cursor.time() - 0.3).abs() < EPSILON);
    assert!((pose.position.x - 3.0).abs() < 1e-4);

    // Running off the start without looping clamps there and stops.
    cursor.update(10.0);
    assert!((cursor.time() - 0.0).abs() < EPSILON);
    assert_eq!(cursor.state(), PlaybackState::Stopped);
}

#[test]
fn update_yields_the_interpolated_pose() {
    let mut cursor = ramp_cursor();
    cursor.play();
    let pose = cursor.update(0.45).unwrap();
    assert!((pose.position.x - 4.5).abs() < 1e-4);
}

#[test]
fn paused_and_stopped_cursors_do_not_advance() {
    let mut cursor = ramp_cursor();
    assert!(cursor.update(0.5).is_none());

    cursor.play();
    cursor.update(0.3);
    cursor.pause();
    let at = cursor.time();
    assert!(cursor.update(0.5).is_none());
    assert!((cursor.time() - at).abs() < EPSILON);
}

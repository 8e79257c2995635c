use glam::{Mat4, Quat, Vec3};

/// An interpolated TRS snapshot, the unit animation playback writes back
/// into a node's local transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Local TRS plus the cached local and derived (world) matrices.
///
/// Two dirty bits drive the caches: `local_dirty` means the local matrix no
/// longer matches the TRS components, `derived_dirty` means the derived
/// matrix no longer matches the local matrix and the parent chain. The bits
/// are set independently because a node's derived cache can go stale without
/// any local change (a re-parent, or an edit to an ancestor).
///
/// The local matrix composition order is fixed: translate, then scale, then
/// rotate (`T * S * R`).
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,

    local_matrix: Mat4,
    derived_matrix: Mat4,

    local_dirty: bool,
    derived_dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Mat4::IDENTITY,
            derived_matrix: Mat4::IDENTITY,
            // New transforms start dirty so the first update pass fills both caches.
            local_dirty: true,
            derived_dirty: true,
        }
    }

    // ========================================================================
    // Local components
    // ========================================================================

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
        self.mark_dirty();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.mark_dirty();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.mark_dirty();
    }

    /// Adds `delta` to the current position.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.mark_dirty();
    }

    /// Post-multiplies the current rotation by `delta` (a local-space turn).
    pub fn rotate(&mut self, delta: Quat) {
        self.rotation = (self.rotation * delta).normalize();
        self.mark_dirty();
    }

    /// Multiplies the current scale component-wise by `factor`.
    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
        self.mark_dirty();
    }

    /// Replaces all three components at once (one dirty mark).
    pub fn set_pose(&mut self, pose: &Pose) {
        self.position = pose.position;
        self.rotation = pose.rotation;
        self.scale = pose.scale;
        self.mark_dirty();
    }

    // ========================================================================
    // Dirty tracking
    // ========================================================================

    /// Marks both caches stale. Every local mutation ends up here.
    pub fn mark_dirty(&mut self) {
        self.local_dirty = true;
        self.derived_dirty = true;
    }

    /// Marks only the derived cache stale (ancestor moved, or re-parent).
    pub fn mark_derived_dirty(&mut self) {
        self.derived_dirty = true;
    }

    #[inline]
    #[must_use]
    pub fn is_local_dirty(&self) -> bool {
        self.local_dirty
    }

    #[inline]
    #[must_use]
    pub fn is_derived_dirty(&self) -> bool {
        self.derived_dirty
    }

    // ========================================================================
    // Matrix caches
    // ========================================================================

    /// Recomputes the local matrix if it is stale. Returns whether a
    /// recomputation happened.
    pub fn update_local(&mut self) -> bool {
        if !self.local_dirty {
            return false;
        }
        self.local_matrix = Mat4::from_translation(self.position)
            * Mat4::from_scale(self.scale)
            * Mat4::from_quat(self.rotation);
        self.local_dirty = false;
        true
    }

    /// Stores a freshly computed derived matrix and clears the dirty bit.
    /// Called by the graph's update pass, nothing else.
    pub(crate) fn set_derived_matrix(&mut self, matrix: Mat4) {
        self.derived_matrix = matrix;
        self.derived_dirty = false;
    }

    /// Cached local matrix. Valid after [`Transform::update_local`].
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Mat4 {
        &self.local_matrix
    }

    /// Cached derived matrix. Valid after the owning graph's update pass.
    #[inline]
    #[must_use]
    pub fn derived_matrix(&self) -> &Mat4 {
        &self.derived_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_order_is_translate_scale_rotate() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(1.0, 2.0, 3.0));
        t.set_scale(Vec3::new(2.0, 2.0, 2.0));
        t.set_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        t.update_local();

        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_scale(Vec3::splat(2.0))
            * Mat4::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        assert!(t.local_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn update_local_clears_dirty_bit_once() {
        let mut t = Transform::new();
        assert!(t.update_local());
        assert!(!t.update_local());

        t.translate(Vec3::X);
        assert!(t.is_local_dirty());
        assert!(t.is_derived_dirty());
        assert!(t.update_local());
    }
}

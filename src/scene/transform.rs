use glam::{Affine3A, EulerRot, Mat4, Quat, Vec3};

/// Transform component
///
/// Holds a node's local position, rotation and scale (TRS) together with the
/// cached local and world matrices.
///
/// Writes go through [`Scene`](crate::scene::Scene) so that world matrices of
/// the subtree are refreshed and transform listeners are notified.
#[derive(Debug, Clone)]
pub struct Transform {
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
        }
    }

    /// Creates a transform from TRS components.
    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self::new();
        transform.set_trs(position, rotation, scale);
        transform
    }

    // ========================================================================
    // TRS writes
    // ========================================================================

    /// Writes TRS and rebuilds the local matrix.
    ///
    /// Returns `false` (and leaves the matrices untouched) when the values are
    /// identical to the current ones.
    pub(crate) fn set_trs(&mut self, position: Vec3, rotation: Quat, scale: Vec3) -> bool {
        let changed =
            position != self.position || rotation != self.rotation || scale != self.scale;

        if changed {
            self.position = position;
            self.rotation = rotation;
            self.scale = scale;
            self.local_matrix = Affine3A::from_scale_rotation_translation(scale, rotation, position);
        }

        changed
    }

    // ========================================================================
    // Getters & Helpers
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

    /// Current rotation as Euler angles (XYZ order).
    #[must_use]
    pub fn rotation_euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// World matrix as `Mat4`, for skinning math.
    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.world_matrix)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

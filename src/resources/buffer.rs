use glam::Mat4;

/// Floats per bone slot (one 4x4 matrix).
pub const FLOATS_PER_BONE: usize = 16;

/// Bytes per bone slot.
pub const BYTES_PER_BONE: usize = FLOATS_PER_BONE * std::mem::size_of::<f32>();

/// Packed per-bone transform buffer for GPU vertex skinning.
///
/// One 4x4 matrix per material-bone slot, stored as the 16 floats of
/// [`Mat4::to_cols_array`] (translation in floats 12..15 of each slot), which
/// matches the WGSL/GLSL `mat4x4<f32>` layout. The byte view is native-endian.
///
/// The buffer keeps its allocation across frames; only a change of slot count
/// reallocates it. `version` increases on every content change so upload code
/// can skip untouched buffers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinningBuffer {
    data: Vec<f32>,
    version: u64,
}

impl SkinningBuffer {
    /// Creates a buffer with every slot set to the identity matrix.
    #[must_use]
    pub fn identity(bone_count: usize) -> Self {
        let mut buffer = Self {
            data: vec![0.0; bone_count * FLOATS_PER_BONE],
            version: 0,
        };
        buffer.reset_to_identity();
        buffer
    }

    /// Number of matrix slots.
    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.data.len() / FLOATS_PER_BONE
    }

    /// Number of floats.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Native-endian byte view for upload.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Reads the matrix stored in a slot.
    #[must_use]
    pub fn bone_matrix(&self, slot: usize) -> Option<Mat4> {
        let start = slot * FLOATS_PER_BONE;
        self.data
            .get(start..start + FLOATS_PER_BONE)
            .map(Mat4::from_cols_slice)
    }

    /// Writes one slot.
    ///
    /// # Panics
    /// Panics if `slot` is not a slot of this buffer.
    pub fn write_bone(&mut self, slot: usize, matrix: &Mat4) {
        let count = self.bone_count();
        assert!(
            slot < count,
            "bone slot out of range. slot={slot}, slot_count={count}"
        );
        let start = slot * FLOATS_PER_BONE;
        matrix.write_cols_to_slice(&mut self.data[start..start + FLOATS_PER_BONE]);
        self.version = self.version.wrapping_add(1);
    }

    /// Copies `source` over the whole buffer.
    ///
    /// Returns `true` when the length differed and the storage had to be
    /// reallocated.
    pub fn copy_from(&mut self, source: &[f32]) -> bool {
        let reallocated = self.data.len() != source.len();
        if reallocated {
            self.data = source.to_vec();
        } else {
            self.data.copy_from_slice(source);
        }
        self.version = self.version.wrapping_add(1);
        reallocated
    }

    pub fn reset_to_identity(&mut self) {
        let identity = Mat4::IDENTITY.to_cols_array();
        for slot in self.data.chunks_exact_mut(FLOATS_PER_BONE) {
            slot.copy_from_slice(&identity);
        }
        self.version = self.version.wrapping_add(1);
    }

    /// Swaps contents with another buffer without touching either allocation.
    pub(crate) fn swap_contents(&mut self, other: &mut SkinningBuffer) {
        std::mem::swap(&mut self.data, &mut other.data);
        self.version = self.version.wrapping_add(1);
        other.version = other.version.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn identity_buffer_layout() {
        let buffer = SkinningBuffer::identity(3);
        assert_eq!(buffer.len(), 48);
        assert_eq!(buffer.as_bytes().len(), 3 * BYTES_PER_BONE);
        for slot in 0..3 {
            assert_eq!(buffer.bone_matrix(slot), Some(Mat4::IDENTITY));
        }
        assert_eq!(buffer.bone_matrix(3), None);
    }

    #[test]
    fn write_bone_places_translation_at_slot_tail() {
        let mut buffer = SkinningBuffer::identity(2);
        buffer.write_bone(1, &Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        let slot = &buffer.as_slice()[16..32];
        assert_eq!(&slot[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(slot[15], 1.0);
        // Slot 0 untouched
        assert_eq!(&buffer.as_slice()[..16], &Mat4::IDENTITY.to_cols_array());
    }

    #[test]
    fn copy_from_reuses_storage_for_equal_length() {
        let mut buffer = SkinningBuffer::identity(2);
        let ptr = buffer.as_slice().as_ptr();
        let source = vec![2.0; 32];
        assert!(!buffer.copy_from(&source));
        assert_eq!(buffer.as_slice().as_ptr(), ptr);
        assert!(buffer.copy_from(&[1.0; 16]));
        assert_eq!(buffer.bone_count(), 1);
    }

    #[test]
    #[should_panic(expected = "bone slot out of range")]
    fn write_past_end_panics() {
        let mut buffer = SkinningBuffer::identity(1);
        buffer.write_bone(1, &Mat4::IDENTITY);
    }
}

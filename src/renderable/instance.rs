use glam::Mat4;

use crate::resources::SkinningBuffer;
use crate::scene::Scene;

/// Per-node render state of a [`ModelRenderable`](super::ModelRenderable).
///
/// Holds the model's relative transform (with its cached inverse) and the
/// live skinning buffer handed to the GPU.
#[derive(Debug, Clone, Default)]
pub struct RenderableInstance {
    relative_transform: Option<Mat4>,
    relative_transform_inverse: Option<Mat4>,
    bone_transforms: SkinningBuffer,
}

impl RenderableInstance {
    #[must_use]
    pub fn new(relative_transform: Option<Mat4>) -> Self {
        Self {
            relative_transform,
            relative_transform_inverse: relative_transform.map(|m| m.inverse()),
            bone_transforms: SkinningBuffer::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn relative_transform(&self) -> Option<Mat4> {
        self.relative_transform
    }

    #[inline]
    #[must_use]
    pub fn relative_transform_inverse(&self) -> Option<Mat4> {
        self.relative_transform_inverse
    }

    pub fn set_relative_transform(&mut self, transform: Option<Mat4>) {
        self.relative_transform = transform;
        self.relative_transform_inverse = transform.map(|m| m.inverse());
    }

    #[inline]
    #[must_use]
    pub fn bone_transforms(&self) -> &SkinningBuffer {
        &self.bone_transforms
    }

    #[inline]
    pub fn bone_transforms_mut(&mut self) -> &mut SkinningBuffer {
        &mut self.bone_transforms
    }
}

/// Capability the render layer queries before uploading skinning data.
pub trait SkinningModifier {
    /// Whether the bone buffer needs rebuilding before the next draw.
    fn is_modified_since_last_render(&self) -> bool;

    /// Returns the buffer to upload: `original` itself when nothing changed,
    /// otherwise a patched copy owned by the modifier.
    fn modify_material_bone_transforms<'a>(
        &'a mut self,
        scene: &Scene,
        original: &'a [f32],
    ) -> &'a [f32];
}

use std::sync::Arc;

use glam::Mat4;

use crate::animation::{AnimationData, RestPoseRigFactory, RigFactory, SkeletonRig};
use crate::assets::{MaterialBoneMap, SkeletonDef};
use crate::errors::Result;
use crate::renderable::RenderableInstance;

/// A renderable model, optionally skinned by a skeleton rig.
#[derive(Debug, Clone)]
pub struct ModelRenderable {
    pub name: String,
    rig: Option<Box<dyn SkeletonRig>>,
    animations: Vec<AnimationData>,
    relative_transform: Option<Mat4>,
}

impl ModelRenderable {
    #[must_use]
    pub fn builder(name: &str) -> ModelRenderableBuilder {
        ModelRenderableBuilder::new(name)
    }

    /// Number of skeleton bones, zero when the model is not rigged.
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.rig.as_ref().map_or(0, |r| r.bone_count())
    }

    #[track_caller]
    #[must_use]
    pub fn bone_name(&self, index: usize) -> Option<&str> {
        self.rig.as_deref().map(|r| r.bone_name(index))
    }

    #[track_caller]
    #[must_use]
    pub fn bone_parent_index(&self, index: usize) -> Option<usize> {
        self.rig.as_deref().and_then(|r| r.bone_parent_index(index))
    }

    #[inline]
    #[must_use]
    pub fn rig(&self) -> Option<&dyn SkeletonRig> {
        self.rig.as_deref()
    }

    #[inline]
    pub fn rig_mut(&mut self) -> Option<&mut (dyn SkeletonRig + 'static)> {
        self.rig.as_deref_mut()
    }

    /// Transform applied between the model and the node that shows it.
    #[inline]
    #[must_use]
    pub fn relative_transform(&self) -> Option<Mat4> {
        self.relative_transform
    }

    /// Deep copy with an independent rig.
    #[must_use]
    pub fn make_copy(&self) -> Self {
        self.clone()
    }

    #[must_use]
    pub fn animation_data(&self, name: &str) -> Option<&AnimationData> {
        self.animations.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn animation_data_at(&self, index: usize) -> Option<&AnimationData> {
        self.animations.get(index)
    }

    #[inline]
    #[must_use]
    pub fn animation_data_count(&self) -> usize {
        self.animations.len()
    }

    pub fn on_animation_engine_updated(&mut self) {
        if let Some(rig) = self.rig.as_deref_mut() {
            rig.update_bone_transforms();
        }
    }

    /// Creates the per-node render state for this model.
    #[must_use]
    pub fn create_instance(&self) -> RenderableInstance {
        let mut instance = RenderableInstance::new(self.relative_transform);
        if let Some(rig) = self.rig.as_deref() {
            instance
                .bone_transforms_mut()
                .copy_from(rig.material_bone_transforms().as_slice());
        }
        instance
    }
}

/// Builder for [`ModelRenderable`].
///
/// ```rust,ignore
/// let model = ModelRenderable::builder("fox")
///     .skeleton(skeleton, material_bones)
///     .relative_transform(Mat4::from_scale(Vec3::splat(0.01)))
///     .animation(AnimationData::new("walk", Duration::from_millis(1200)))
///     .build()?;
/// ```
pub struct ModelRenderableBuilder {
    name: String,
    skeleton: Option<(Arc<SkeletonDef>, Arc<MaterialBoneMap>)>,
    relative_transform: Option<Mat4>,
    animations: Vec<AnimationData>,
    rig_factory: Arc<dyn RigFactory>,
}

impl ModelRenderableBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            skeleton: None,
            relative_transform: None,
            animations: Vec::new(),
            rig_factory: Arc::new(RestPoseRigFactory),
        }
    }

    #[must_use]
    pub fn skeleton(mut self, skeleton: Arc<SkeletonDef>, material_bones: Arc<MaterialBoneMap>) -> Self {
        self.skeleton = Some((skeleton, material_bones));
        self
    }

    #[must_use]
    pub fn relative_transform(mut self, transform: Mat4) -> Self {
        self.relative_transform = Some(transform);
        self
    }

    #[must_use]
    pub fn animation(mut self, animation: AnimationData) -> Self {
        self.animations.push(animation);
        self
    }

    #[must_use]
    pub fn rig_factory(mut self, factory: Arc<dyn RigFactory>) -> Self {
        self.rig_factory = factory;
        self
    }

    pub fn build(self) -> Result<ModelRenderable> {
        let rig = match self.skeleton {
            Some((skeleton, material_bones)) => {
                material_bones.validate(&skeleton)?;
                let rig = self.rig_factory.create(skeleton, material_bones);
                if rig.is_none() {
                    log::warn!("Rig factory declined skeleton of model '{}'", self.name);
                }
                rig
            }
            None => None,
        };

        Ok(ModelRenderable {
            name: self.name,
            rig,
            animations: self.animations,
            relative_transform: self.relative_transform,
        })
    }
}

//! Pre-parsed skeleton assets.
//!
//! [`SkeletonDef`] is the read-only view of a loaded skeleton: an ordered bone
//! list where every bone carries a unique name, a serialized parent index and
//! a bind-relative affine matrix stored as three row vectors.
//!
//! [`MaterialBoneMap`] lists the skeleton bones actually consumed by the
//! skinning shader, in shader-slot order.

use glam::Mat4;
use rustc_hash::FxHashSet;
use uuid::Uuid;

use crate::errors::{Result, SkeletonError};

/// Serialized parent index marking a root bone.
pub const NO_PARENT: u8 = 255;

/// Maximum number of bones addressable with `u8` parent indices.
pub const MAX_BONES: usize = NO_PARENT as usize;

/// Three row vectors of an affine matrix; the fourth row is `[0, 0, 0, 1]`.
pub type BoneRows = [[f32; 4]; 3];

/// Converts stored rows into a full 4x4 matrix.
#[inline]
#[must_use]
pub fn rows_to_matrix(rows: &BoneRows) -> Mat4 {
    Mat4::from_cols_array_2d(&[rows[0], rows[1], rows[2], [0.0, 0.0, 0.0, 1.0]]).transpose()
}

/// Extracts the three stored rows of an affine matrix.
#[inline]
#[must_use]
pub fn matrix_to_rows(matrix: &Mat4) -> BoneRows {
    [
        matrix.row(0).to_array(),
        matrix.row(1).to_array(),
        matrix.row(2).to_array(),
    ]
}

/// Immutable skeleton definition.
#[derive(Debug, Clone)]
pub struct SkeletonDef {
    pub id: Uuid,
    pub name: String,

    bone_names: Vec<String>,
    bone_parents: Vec<u8>,
    bone_transforms: Vec<BoneRows>,
}

impl SkeletonDef {
    /// Validates and creates a skeleton definition.
    ///
    /// Rejects mismatched list lengths, more than [`MAX_BONES`] bones,
    /// duplicate or empty names, out-of-range parents and parent cycles.
    pub fn new(
        name: &str,
        bone_names: Vec<String>,
        bone_parents: Vec<u8>,
        bone_transforms: Vec<BoneRows>,
    ) -> Result<Self> {
        let invalid = |reason: String| SkeletonError::InvalidSkeleton {
            name: name.to_string(),
            reason,
        };

        let count = bone_names.len();
        if bone_parents.len() != count || bone_transforms.len() != count {
            return Err(invalid(format!(
                "{count} names, {} parents and {} transforms",
                bone_parents.len(),
                bone_transforms.len()
            )));
        }
        if count > MAX_BONES {
            return Err(invalid(format!("{count} bones exceed the limit of {MAX_BONES}")));
        }

        let mut seen = FxHashSet::default();
        for bone_name in &bone_names {
            if bone_name.is_empty() {
                return Err(invalid("empty bone name".to_string()));
            }
            if !seen.insert(bone_name.as_str()) {
                return Err(invalid(format!("duplicate bone name '{bone_name}'")));
            }
        }

        for (index, &parent) in bone_parents.iter().enumerate() {
            if parent == NO_PARENT {
                continue;
            }
            if usize::from(parent) >= count {
                return Err(invalid(format!("bone {index} has parent {parent} out of range")));
            }
        }

        // A parent chain longer than the bone count must revisit a bone.
        for start in 0..count {
            let mut current = start;
            let mut steps = 0;
            while bone_parents[current] != NO_PARENT {
                current = usize::from(bone_parents[current]);
                steps += 1;
                if steps > count {
                    return Err(invalid(format!("parent cycle through bone {start}")));
                }
            }
        }

        log::debug!("Skeleton '{name}' loaded with {count} bones");

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bone_names,
            bone_parents,
            bone_transforms,
        })
    }

    /// Starts building a skeleton bone by bone.
    #[must_use]
    pub fn builder(name: &str) -> SkeletonDefBuilder {
        SkeletonDefBuilder {
            name: name.to_string(),
            bone_names: Vec::new(),
            bone_parents: Vec::new(),
            bone_transforms: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bone_names.len()
    }

    #[inline]
    #[must_use]
    pub fn bone_name(&self, index: usize) -> Option<&str> {
        self.bone_names.get(index).map(String::as_str)
    }

    /// Raw serialized parent index, [`NO_PARENT`] for roots.
    #[inline]
    #[must_use]
    pub fn bone_parent(&self, index: usize) -> Option<u8> {
        self.bone_parents.get(index).copied()
    }

    #[inline]
    #[must_use]
    pub fn bone_transform(&self, index: usize) -> Option<&BoneRows> {
        self.bone_transforms.get(index)
    }

    /// Stored bone transform expanded to a 4x4 matrix.
    #[must_use]
    pub fn bone_matrix(&self, index: usize) -> Option<Mat4> {
        self.bone_transforms.get(index).map(rows_to_matrix)
    }

    /// Index of the bone with the given name.
    #[must_use]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bone_names.iter().position(|n| n == name)
    }
}

/// Incremental construction of a [`SkeletonDef`].
///
/// Validation happens in [`SkeletonDefBuilder::build`].
#[derive(Debug, Clone)]
pub struct SkeletonDefBuilder {
    name: String,
    bone_names: Vec<String>,
    bone_parents: Vec<Option<usize>>,
    bone_transforms: Vec<BoneRows>,
}

impl SkeletonDefBuilder {
    /// Appends a bone. `reference` is the stored (bind-relative) matrix; only
    /// its first three rows are kept.
    #[must_use]
    pub fn bone(mut self, name: &str, parent: Option<usize>, reference: Mat4) -> Self {
        self.bone_names.push(name.to_string());
        self.bone_parents.push(parent);
        self.bone_transforms.push(matrix_to_rows(&reference));
        self
    }

    pub fn build(self) -> Result<SkeletonDef> {
        let mut parents = Vec::with_capacity(self.bone_parents.len());
        for (index, parent) in self.bone_parents.iter().enumerate() {
            let serialized = match *parent {
                None => NO_PARENT,
                Some(p) if p < MAX_BONES => p as u8,
                Some(p) => {
                    return Err(SkeletonError::InvalidSkeleton {
                        name: self.name.clone(),
                        reason: format!("bone {index} has parent {p} out of range"),
                    });
                }
            };
            parents.push(serialized);
        }
        SkeletonDef::new(&self.name, self.bone_names, parents, self.bone_transforms)
    }
}

/// Shader slot → skeleton bone index table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialBoneMap {
    shader_to_mesh_bones: Vec<usize>,
}

impl MaterialBoneMap {
    #[must_use]
    pub fn new(shader_to_mesh_bones: Vec<usize>) -> Self {
        Self {
            shader_to_mesh_bones,
        }
    }

    /// Maps every skeleton bone to the slot of the same index.
    #[must_use]
    pub fn identity(bone_count: usize) -> Self {
        Self::new((0..bone_count).collect())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.shader_to_mesh_bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shader_to_mesh_bones.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<usize> {
        self.shader_to_mesh_bones.get(slot).copied()
    }

    /// Checks the map against the skeleton it will be paired with.
    pub fn validate(&self, skeleton: &SkeletonDef) -> Result<()> {
        let bone_count = skeleton.bone_count();
        if self.len() > bone_count {
            return Err(SkeletonError::InvalidSkeleton {
                name: skeleton.name.clone(),
                reason: format!(
                    "{} material bones for {bone_count} skeleton bones",
                    self.len()
                ),
            });
        }
        for (slot, &bone) in self.shader_to_mesh_bones.iter().enumerate() {
            if bone >= bone_count {
                return Err(SkeletonError::MaterialBoneOutOfRange {
                    slot,
                    bone,
                    bone_count,
                });
            }
        }
        Ok(())
    }
}

//! Asset Module
//!
//! Read-only, pre-parsed asset data consumed by the skeleton system:
//!
//! - [`SkeletonDef`]: bone names, parent indices and stored bone transforms
//! - [`MaterialBoneMap`]: the subset and order of bones read by the skinning shader
//!
//! Parsing asset files is not part of this crate; loaders hand over already
//! decoded data through these types.

pub mod skeleton_asset;

pub use skeleton_asset::{
    BoneRows, MAX_BONES, MaterialBoneMap, NO_PARENT, SkeletonDef, SkeletonDefBuilder,
    matrix_to_rows, rows_to_matrix,
};

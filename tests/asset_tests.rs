//! Skeleton Asset Tests
//!
//! Tests for:
//! - SkeletonDef construction and validation
//! - Stored row layout of bone transforms
//! - MaterialBoneMap validation

use glam::{Mat4, Quat, Vec3};
use myth_skeleton::assets::{MaterialBoneMap, NO_PARENT, SkeletonDef, rows_to_matrix};
use myth_skeleton::errors::SkeletonError;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn identity_rows(count: usize) -> Vec<[[f32; 4]; 3]> {
    vec![[[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]]; count]
}

fn is_invalid_skeleton(result: &Result<SkeletonDef, SkeletonError>) -> bool {
    matches!(result, Err(SkeletonError::InvalidSkeleton { .. }))
}

// ============================================================================
// SkeletonDef
// ============================================================================

#[test]
fn skeleton_def_accessors() -> anyhow::Result<()> {
    let skeleton = SkeletonDef::new(
        "tail",
        names(&["base", "mid", "tip"]),
        vec![NO_PARENT, 0, 1],
        identity_rows(3),
    )?;

    assert_eq!(skeleton.bone_count(), 3);
    assert_eq!(skeleton.bone_name(1), Some("mid"));
    assert_eq!(skeleton.bone_parent(0), Some(NO_PARENT));
    assert_eq!(skeleton.bone_parent(2), Some(1));
    assert_eq!(skeleton.bone_parent(3), None);
    assert_eq!(skeleton.find_bone("tip"), Some(2));
    assert_eq!(skeleton.find_bone("fin"), None);
    assert_eq!(skeleton.bone_matrix(0), Some(Mat4::IDENTITY));
    Ok(())
}

#[test]
fn skeleton_defs_get_distinct_ids() -> anyhow::Result<()> {
    let a = SkeletonDef::new("a", names(&["root"]), vec![NO_PARENT], identity_rows(1))?;
    let b = SkeletonDef::new("b", names(&["root"]), vec![NO_PARENT], identity_rows(1))?;
    assert_ne!(a.id, b.id);
    Ok(())
}

#[test]
fn stored_rows_hold_translation_in_last_column() -> anyhow::Result<()> {
    let matrix = Mat4::from_rotation_translation(Quat::from_rotation_y(0.3), Vec3::new(4.0, 5.0, 6.0));
    let skeleton = SkeletonDef::builder("one").bone("root", None, matrix).build()?;

    let rows = skeleton.bone_transform(0).expect("bone 0");
    assert_eq!([rows[0][3], rows[1][3], rows[2][3]], [4.0, 5.0, 6.0]);
    assert!(rows_to_matrix(rows).abs_diff_eq(matrix, 1e-6));
    Ok(())
}

#[test]
fn mismatched_lengths_rejected() {
    let result = SkeletonDef::new("bad", names(&["a", "b"]), vec![NO_PARENT], identity_rows(2));
    assert!(is_invalid_skeleton(&result));
}

#[test]
fn duplicate_names_rejected() {
    let result = SkeletonDef::new("bad", names(&["a", "a"]), vec![NO_PARENT, 0], identity_rows(2));
    assert!(is_invalid_skeleton(&result));
}

#[test]
fn empty_name_rejected() {
    let result = SkeletonDef::new("bad", names(&[""]), vec![NO_PARENT], identity_rows(1));
    assert!(is_invalid_skeleton(&result));
}

#[test]
fn parent_out_of_range_rejected() {
    let result = SkeletonDef::new("bad", names(&["a", "b"]), vec![NO_PARENT, 9], identity_rows(2));
    assert!(is_invalid_skeleton(&result));

    let built = SkeletonDef::builder("bad")
        .bone("a", None, Mat4::IDENTITY)
        .bone("b", Some(300), Mat4::IDENTITY)
        .build();
    assert!(is_invalid_skeleton(&built));
}

#[test]
fn parent_cycle_rejected() {
    let result = SkeletonDef::new("bad", names(&["a", "b", "c"]), vec![NO_PARENT, 2, 1], identity_rows(3));
    assert!(is_invalid_skeleton(&result));
}

// ============================================================================
// MaterialBoneMap
// ============================================================================

#[test]
fn material_map_validation() -> anyhow::Result<()> {
    let skeleton = SkeletonDef::new("pair", names(&["a", "b"]), vec![NO_PARENT, 0], identity_rows(2))?;

    MaterialBoneMap::identity(2).validate(&skeleton)?;
    MaterialBoneMap::new(vec![1]).validate(&skeleton)?;

    assert!(matches!(
        MaterialBoneMap::new(vec![0, 1, 1]).validate(&skeleton),
        Err(SkeletonError::InvalidSkeleton { .. })
    ));
    assert_eq!(
        MaterialBoneMap::new(vec![2]).validate(&skeleton),
        Err(SkeletonError::MaterialBoneOutOfRange {
            slot: 0,
            bone: 2,
            bone_count: 2
        })
    );
    Ok(())
}

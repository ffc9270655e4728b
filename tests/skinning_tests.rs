//! Skinning Buffer Tests
//!
//! Tests for:
//! - Buffer reuse when nothing is stale
//! - Per-slot patching of moved attachments
//! - Scratch buffer reuse across builds
//! - Re-parented attachments and relative transforms
//! - sync_skinning commit into the live instance buffer

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use myth_skeleton::animation::SkeletonRig;
use myth_skeleton::assets::{MaterialBoneMap, SkeletonDef};
use myth_skeleton::renderable::{ModelRenderable, SkinningModifier};
use myth_skeleton::resources::{FLOATS_PER_BONE, SkinningBuffer};
use myth_skeleton::scene::{Node, NodeHandle, Scene};
use myth_skeleton::skeleton::{DirtyFlag, SkeletonNode, SkinningBufferBuilder, SkinningWorkspace};

const EPSILON: f32 = 1e-4;

fn slot(buffer: &[f32], index: usize) -> &[f32] {
    &buffer[index * FLOATS_PER_BONE..(index + 1) * FLOATS_PER_BONE]
}

fn slot_matrix(buffer: &[f32], index: usize) -> Mat4 {
    Mat4::from_cols_slice(slot(buffer, index))
}

// ============================================================================
// Fixtures
// ============================================================================

fn skeleton_def() -> Arc<SkeletonDef> {
    let root = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
    let tip = root * Mat4::from_rotation_translation(Quat::from_rotation_x(0.4), Vec3::new(0.0, 0.5, 0.0));
    Arc::new(
        SkeletonDef::builder("neck")
            .bone("root", None, root.inverse())
            .bone("tip", Some(0), tip.inverse())
            .build()
            .expect("valid skeleton"),
    )
}

fn model(relative: Option<Mat4>) -> ModelRenderable {
    let builder = ModelRenderable::builder("neck")
        .skeleton(skeleton_def(), Arc::new(MaterialBoneMap::identity(2)));
    match relative {
        Some(m) => builder.relative_transform(m),
        None => builder,
    }
    .build()
    .expect("valid model")
}

struct Fixture {
    scene: Scene,
    skeleton: SkeletonNode,
    root: NodeHandle,
    tip: NodeHandle,
}

fn fixture(relative: Option<Mat4>) -> Fixture {
    let mut scene = Scene::new();
    let mut skeleton = SkeletonNode::new(&mut scene);
    scene.set_local_position(skeleton.node(), Vec3::new(2.0, 0.0, 0.0));
    let root = scene
        .add_to_parent(Node::with_name("root"), skeleton.node())
        .expect("skeleton node exists");
    let tip = scene
        .add_to_parent(Node::with_name("tip"), skeleton.node())
        .expect("skeleton node exists");

    skeleton.set_renderable(&mut scene, Some(model(relative)));
    skeleton.set_bone_attachment(&mut scene, "root", Some(root)).expect("attach");
    skeleton.set_bone_attachment(&mut scene, "tip", Some(tip)).expect("attach");
    Fixture {
        scene,
        skeleton,
        root,
        tip,
    }
}

fn live_buffer(skeleton: &SkeletonNode) -> Vec<f32> {
    skeleton
        .renderable_instance()
        .expect("renderable set")
        .bone_transforms()
        .as_slice()
        .to_vec()
}

/// Moves a node away and back so its binding goes stale without changing
/// its final pose.
fn nudge(scene: &mut Scene, node: NodeHandle) {
    let position = scene.local_position(node).expect("node exists");
    scene.set_local_position(node, position + Vec3::X);
    scene.set_local_position(node, position);
}

// ============================================================================
// Reuse
// ============================================================================

#[test]
fn nothing_stale_returns_previous() {
    let Fixture { scene, mut skeleton, .. } = fixture(None);
    let previous = live_buffer(&skeleton);
    assert!(!skeleton.is_modified_since_last_render());

    let out = skeleton.modify_material_bone_transforms(&scene, &previous);
    assert_eq!(out.as_ptr(), previous.as_ptr());
}

#[test]
fn initial_buffer_is_identity() {
    let Fixture { skeleton, .. } = fixture(None);
    let live = live_buffer(&skeleton);
    assert_eq!(live.len(), 2 * FLOATS_PER_BONE);
    assert_eq!(live, SkinningBuffer::identity(2).as_slice());
}

#[test]
fn rest_pose_skins_to_identity() {
    let Fixture { mut scene, mut skeleton, tip, .. } = fixture(None);
    let previous = live_buffer(&skeleton);
    nudge(&mut scene, tip);

    let out = skeleton.modify_material_bone_transforms(&scene, &previous);
    assert_ne!(out.as_ptr(), previous.as_ptr());
    assert!(slot_matrix(out, 1).abs_diff_eq(Mat4::IDENTITY, EPSILON));
}

// ============================================================================
// Patching
// ============================================================================

#[test]
fn moved_attachment_patches_only_its_slot() {
    let Fixture { mut scene, mut skeleton, tip, .. } = fixture(None);
    let mut previous = live_buffer(&skeleton);
    // Make slot 0 recognizable so a stray overwrite would show.
    previous[0] = 42.0;

    scene.set_local_position(tip, Vec3::new(0.0, 3.0, 0.0));
    let local = Mat4::from(scene.local_matrix(tip).expect("tip exists"));
    let reference = skeleton
        .renderable()
        .and_then(ModelRenderable::rig)
        .expect("rigged")
        .reference_bone_transform(1);

    let out = skeleton
        .modify_material_bone_transforms(&scene, &previous)
        .to_vec();
    assert_eq!(slot(&out, 0), slot(&previous, 0));
    assert!(slot_matrix(&out, 1).abs_diff_eq(local * reference, EPSILON));
    assert!(!skeleton.is_modified_since_last_render());
}

#[test]
fn scratch_is_reused_across_builds() {
    let Fixture { mut scene, mut skeleton, root, .. } = fixture(None);
    let previous = live_buffer(&skeleton);

    scene.set_local_position(root, Vec3::new(0.0, 2.0, 0.0));
    let first = skeleton
        .modify_material_bone_transforms(&scene, &previous)
        .as_ptr();

    scene.set_local_position(root, Vec3::new(0.0, 4.0, 0.0));
    let second = skeleton
        .modify_material_bone_transforms(&scene, &previous)
        .as_ptr();

    assert_eq!(first, second);
}

#[test]
fn inactive_attachment_is_not_rebuilt() {
    let Fixture { mut scene, mut skeleton, tip, .. } = fixture(None);
    let previous = live_buffer(&skeleton);

    scene.set_local_position(tip, Vec3::new(0.0, 3.0, 0.0));
    scene.set_enabled(tip, false);
    let out = skeleton.modify_material_bone_transforms(&scene, &previous);
    assert_eq!(out.as_ptr(), previous.as_ptr());

    // The binding stays stale until the node is active again.
    scene.set_enabled(tip, true);
    let out = skeleton.modify_material_bone_transforms(&scene, &previous);
    assert_ne!(out.as_ptr(), previous.as_ptr());
}

#[test]
fn reparented_attachment_uses_skeleton_space() {
    let mut scene = Scene::new();
    let mut skeleton = SkeletonNode::new(&mut scene);
    scene.set_local_position(skeleton.node(), Vec3::new(0.0, 0.0, -3.0));
    let holder = scene.create_node();
    let hat = scene.add_to_parent(Node::new(), holder).expect("holder exists");

    skeleton.set_renderable(&mut scene, Some(model(None)));
    skeleton.set_bone_attachment(&mut scene, "root", Some(hat)).expect("attach");
    let previous = live_buffer(&skeleton);

    scene.set_local_rotation(holder, Quat::from_rotation_y(0.9));
    let skeleton_world = Mat4::from(scene.world_matrix(skeleton.node()).expect("skeleton exists"));
    let hat_world = Mat4::from(scene.world_matrix(hat).expect("hat exists"));
    let reference = skeleton_def().bone_matrix(0).expect("bone 0");

    let out = skeleton.modify_material_bone_transforms(&scene, &previous);
    let expected = skeleton_world.inverse() * hat_world * reference;
    assert!(slot_matrix(out, 0).abs_diff_eq(expected, EPSILON));
}

#[test]
fn relative_transform_cancels_out_at_rest() {
    let relative = Mat4::from_scale_rotation_translation(
        Vec3::splat(0.25),
        Quat::from_rotation_y(1.2),
        Vec3::new(0.0, -1.0, 0.0),
    );
    let Fixture { mut scene, mut skeleton, root, .. } = fixture(Some(relative));
    let previous = live_buffer(&skeleton);
    nudge(&mut scene, root);

    let out = skeleton.modify_material_bone_transforms(&scene, &previous);
    assert!(slot_matrix(out, 0).abs_diff_eq(Mat4::IDENTITY, EPSILON));
}

#[test]
fn subset_material_map_addresses_bones_by_slot() {
    let model = ModelRenderable::builder("neck")
        .skeleton(skeleton_def(), Arc::new(MaterialBoneMap::new(vec![1])))
        .build()
        .expect("valid model");
    let mut scene = Scene::new();
    let mut skeleton = SkeletonNode::new(&mut scene);
    let tip = scene.add_to_parent(Node::new(), skeleton.node()).expect("skeleton exists");
    skeleton.set_renderable(&mut scene, Some(model));
    skeleton.set_bone_attachment(&mut scene, "tip", Some(tip)).expect("attach");

    let previous = live_buffer(&skeleton);
    assert_eq!(previous.len(), FLOATS_PER_BONE);
    scene.set_local_scale(tip, Vec3::splat(2.0));

    let out = skeleton.modify_material_bone_transforms(&scene, &previous);
    assert!(!slot_matrix(out, 0).abs_diff_eq(Mat4::IDENTITY, EPSILON));
}

#[test]
#[should_panic(expected = "skinning buffer does not match")]
fn mismatched_previous_buffer_panics() {
    let Fixture { scene, mut skeleton, .. } = fixture(None);
    let _ = skeleton.modify_material_bone_transforms(&scene, &[0.0; 4]);
}

#[test]
fn builder_staleness_follows_aggregate_flag() {
    let Fixture { scene, skeleton, .. } = fixture(None);
    let rig = skeleton.renderable().and_then(ModelRenderable::rig).expect("rigged");
    let aggregate = DirtyFlag::new(true);
    let builder = SkinningBufferBuilder::new(
        &scene,
        skeleton.node(),
        rig,
        skeleton.renderable_instance(),
        skeleton.bindings(),
        &aggregate,
    );
    assert!(builder.is_stale());

    // Flag set but no binding stale: previous comes back, flag is cleared.
    let previous = live_buffer(&skeleton);
    let mut workspace = SkinningWorkspace::new();
    let out = builder.build(&previous, &mut workspace);
    assert_eq!(out.as_ptr(), previous.as_ptr());
    assert!(!builder.is_stale());
    assert!(!workspace.has_pending());
}

// ============================================================================
// sync_skinning
// ============================================================================

#[test]
fn sync_skinning_commits_into_live_buffer() {
    let Fixture { mut scene, mut skeleton, tip, .. } = fixture(None);
    scene.set_local_position(tip, Vec3::new(0.0, 3.0, 0.0));
    let local = Mat4::from(scene.local_matrix(tip).expect("tip exists"));
    let reference = skeleton_def().bone_matrix(1).expect("bone 1");

    let synced = skeleton.sync_skinning(&scene).expect("rigged").to_vec();
    assert!(slot_matrix(&synced, 1).abs_diff_eq(local * reference, EPSILON));
    assert_eq!(live_buffer(&skeleton), synced);
    assert!(!skeleton.is_modified_since_last_render());

    let version = skeleton
        .renderable_instance()
        .expect("renderable set")
        .bone_transforms()
        .version();
    let again = skeleton.sync_skinning(&scene).expect("rigged").to_vec();
    assert_eq!(again, synced);
    assert_eq!(
        skeleton
            .renderable_instance()
            .expect("renderable set")
            .bone_transforms()
            .version(),
        version
    );
}

#[test]
fn sync_skinning_without_renderable() {
    let mut scene = Scene::new();
    let mut skeleton = SkeletonNode::new(&mut scene);
    assert!(skeleton.sync_skinning(&scene).is_none());
}

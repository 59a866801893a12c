mod common;

use std::sync::Arc;

use common::{assert_mat_eq, parse, translation_clip, BufferBuilder};
use glam::{Mat4, Quat, Vec3};
use proptest::prelude::*;
use scene_anim::{
    animation::{AnimationEvaluator, KeyframeSearch},
    sim::{SceneInstance, TimeWrapMode, Timeline},
    config::PlaybackConfig,
    EvaluationError, LoadError,
};
use serde_json::json;

#[test]
fn linear_translation_at_frame_fifteen() {
    let fps = 24;
    let asset = Arc::new(parse(&translation_clip(fps as f32)).unwrap());
    let mut instance = SceneInstance::new(asset, KeyframeSearch::Linear);
    instance.play(0, TimeWrapMode::Clamp, 1.0, 0.0).unwrap();

    let mut timeline = Timeline::new(&PlaybackConfig { fps, ..Default::default() });
    timeline.current_frame = 15;
    instance.tick(timeline.current_time()).unwrap();

    let translation = instance.graph.node(0).unwrap().trs.translation;
    assert!(translation.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5), "{:?}", translation);
    assert_mat_eq(instance.graph.world_matrix(0), Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn clamps_to_first_and_last_keyframe() {
    let asset = parse(&translation_clip(30.0)).unwrap();
    let mut graph = asset.scene.clone();
    let mut evaluator = AnimationEvaluator::new(KeyframeSearch::Binary);

    evaluator.evaluate(&asset, 0, -3.0, &mut graph).unwrap();
    assert_eq!(graph.node(0).unwrap().trs.translation, Vec3::ZERO);

    evaluator.evaluate(&asset, 0, 1.0, &mut graph).unwrap();
    assert_eq!(graph.node(0).unwrap().trs.translation, Vec3::new(10.0, 0.0, 0.0));

    evaluator.evaluate(&asset, 0, 100.0, &mut graph).unwrap();
    assert_eq!(graph.node(0).unwrap().trs.translation, Vec3::new(10.0, 0.0, 0.0));
}

#[test]
fn repeated_boundary_times_keep_the_boundary_keys() {
    // a snap at both ends: two keys at t = 0 and two at t = 1
    let mut buffers = BufferBuilder::new();
    let times = buffers.floats(&[0.0, 0.0, 1.0, 1.0], "SCALAR");
    let values = buffers.floats(&[3.0, 0.0, 0.0, 5.0, 0.0, 0.0, 7.0, 0.0, 0.0, 9.0, 0.0, 0.0], "VEC3");
    let mut doc = json!({
        "nodes": [ {} ],
        "animations": [ {
            "channels": [ { "sampler": 0, "target": { "node": 0, "path": "translation" } } ],
            "samplers": [ { "input": times, "output": values, "interpolation": "LINEAR" } ]
        } ]
    });
    buffers.embed(&mut doc);
    let asset = parse(&doc).unwrap();
    let mut graph = asset.scene.clone();

    for search in [KeyframeSearch::Binary, KeyframeSearch::Linear] {
        let mut evaluator = AnimationEvaluator::new(search);
        for (t, x) in [(-1.0, 3.0), (0.0, 3.0), (0.5, 6.0), (1.0, 9.0), (4.0, 9.0)] {
            evaluator.evaluate(&asset, 0, t, &mut graph).unwrap();
            assert_eq!(graph.node(0).unwrap().trs.translation.x, x, "t = {} with {:?}", t, search);
        }
    }
}

fn cubic_scale_doc() -> serde_json::Value {
    let mut buffers = BufferBuilder::new();
    let times = buffers.floats(&[0.0, 2.0], "SCALAR");
    #[rustfmt::skip]
    let values = buffers.floats(&[
        // key 0: in, value, out
        0.0, 0.0, 0.0,   1.0, 1.0, 1.0,   0.0, 0.0, 0.0,
        // key 1
        0.0, 0.0, 0.0,   3.0, 3.0, 3.0,   0.0, 0.0, 0.0,
    ], "VEC3");
    let mut doc = json!({
        "nodes": [ {} ],
        "animations": [ {
            "channels": [ { "sampler": 0, "target": { "node": 0, "path": "scale" } } ],
            "samplers": [ { "input": times, "output": values, "interpolation": "CUBICSPLINE" } ]
        } ]
    });
    buffers.embed(&mut doc);
    doc
}

#[test]
fn cubic_spline_hits_keyframes_exactly() {
    let asset = parse(&cubic_scale_doc()).unwrap();
    let mut graph = asset.scene.clone();
    let mut evaluator = AnimationEvaluator::default();

    evaluator.evaluate(&asset, 0, 0.0, &mut graph).unwrap();
    assert_eq!(graph.node(0).unwrap().trs.scale, Vec3::ONE);
    evaluator.evaluate(&asset, 0, 2.0, &mut graph).unwrap();
    assert_eq!(graph.node(0).unwrap().trs.scale, Vec3::splat(3.0));
    evaluator.evaluate(&asset, 0, 1.0, &mut graph).unwrap();
    assert!(graph.node(0).unwrap().trs.scale.abs_diff_eq(Vec3::splat(2.0), 1e-6));
    // zero tangents ease: below the straight line early on
    evaluator.evaluate(&asset, 0, 0.5, &mut graph).unwrap();
    assert!(graph.node(0).unwrap().trs.scale.x < 1.5);
}

#[test]
fn cubic_output_needs_three_elements_per_key() {
    let mut buffers = BufferBuilder::new();
    let times = buffers.floats(&[0.0, 1.0], "SCALAR");
    let values = buffers.floats(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0], "VEC3");
    let mut doc = json!({
        "nodes": [ {} ],
        "animations": [ {
            "channels": [ { "sampler": 0, "target": { "node": 0, "path": "translation" } } ],
            "samplers": [ { "input": times, "output": values, "interpolation": "CUBICSPLINE" } ]
        } ]
    });
    buffers.embed(&mut doc);
    let asset = parse(&doc).unwrap();
    let mut graph = asset.scene.clone();

    let err = AnimationEvaluator::default().evaluate(&asset, 0, 0.0, &mut graph).unwrap_err();
    assert!(matches!(err, EvaluationError::KeyframeCountMismatch { times: 2, values: 2, expected: 6, .. }));
}

#[test]
fn channel_targeting_missing_node_fails_loudly() {
    let mut doc = translation_clip(24.0);
    doc["animations"][0]["channels"][0]["target"]["node"] = json!(7);
    let asset = parse(&doc).unwrap();
    let mut graph = asset.scene.clone();
    let err = AnimationEvaluator::default().evaluate(&asset, 0, 0.0, &mut graph).unwrap_err();
    assert!(matches!(err, EvaluationError::NodeOutOfRange { node: 7, len: 1, .. }));

    let err = AnimationEvaluator::default().evaluate(&asset, 3, 0.0, &mut graph).unwrap_err();
    assert!(matches!(err, EvaluationError::AnimationOutOfRange { animation: 3, len: 1 }));
}

#[test]
fn truncated_keyframe_accessor_surfaces_on_first_evaluation() {
    let mut doc = translation_clip(24.0);
    doc["accessors"][0]["count"] = json!(40);
    let asset = parse(&doc).unwrap();
    let mut graph = asset.scene.clone();
    let err = AnimationEvaluator::default().evaluate(&asset, 0, 0.0, &mut graph).unwrap_err();
    assert!(matches!(err, EvaluationError::Accessor(LoadError::AccessorRange { accessor: 0, .. })));
}

#[test]
fn weights_and_untargeted_channels_are_skipped() {
    let mut doc = translation_clip(24.0);
    doc["animations"][0]["channels"] = json!([
        { "sampler": 0, "target": { "node": 0, "path": "weights" } },
        { "sampler": 0, "target": { "path": "translation" } },
        { "sampler": 0, "target": { "node": 0, "path": "translation" } }
    ]);
    let asset = parse(&doc).unwrap();
    let mut graph = asset.scene.clone();
    let written = AnimationEvaluator::default().evaluate(&asset, 0, 1.25, &mut graph).unwrap();
    assert_eq!(written, 1);
}

#[test]
fn rotation_channel_is_spherical() {
    let mut buffers = BufferBuilder::new();
    let times = buffers.floats(&[0.0, 1.0], "SCALAR");
    let q1 = Quat::from_rotation_y(std::f32::consts::PI * 0.9);
    let values = buffers.floats(&[Quat::IDENTITY.to_array(), q1.to_array()].concat(), "VEC4");
    let mut doc = json!({
        "nodes": [ {} ],
        "animations": [ {
            "channels": [ { "sampler": 0, "target": { "node": 0, "path": "rotation" } } ],
            "samplers": [ { "input": times, "output": values } ]
        } ]
    });
    buffers.embed(&mut doc);
    let asset = parse(&doc).unwrap();
    let mut graph = asset.scene.clone();
    AnimationEvaluator::default().evaluate(&asset, 0, 0.5, &mut graph).unwrap();
    let q = graph.node(0).unwrap().trs.rotation;
    assert!(q.abs_diff_eq(Quat::from_rotation_y(std::f32::consts::PI * 0.45), 1e-5));
    assert!((q.length() - 1.0).abs() < 1e-5);
}

/// root -> a -> b -> c, each with its own TRS, plus a two-joint skin on a and c.
fn rig_doc() -> serde_json::Value {
    let mut buffers = BufferBuilder::new();
    let ibms = [
        Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)).inverse(),
        Mat4::from_scale_rotation_translation(Vec3::ONE, Quat::from_rotation_z(0.3), Vec3::new(0.5, 2.0, 0.0)).inverse(),
    ];
    let ibm = buffers.floats(&ibms.iter().flat_map(|m| m.to_cols_array()).collect::<Vec<_>>(), "MAT4");
    let times = buffers.floats(&[0.0, 1.0, 2.0], "SCALAR");
    let rotations = buffers.floats(
        &[Quat::IDENTITY, Quat::from_rotation_x(1.0), Quat::from_rotation_z(-0.7)]
            .iter()
            .flat_map(|q| q.to_array())
            .collect::<Vec<_>>(),
        "VEC4",
    );
    let translations = buffers.floats(&[0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 1.0, 1.0, 0.0], "VEC3");
    let mut doc = json!({
        "nodes": [
            { "name": "root", "children": [1], "translation": [0.0, 0.0, 1.0], "scale": [2.0, 2.0, 2.0] },
            { "name": "a", "children": [2], "translation": [0.0, 1.0, 0.0] },
            { "name": "b", "children": [3], "rotation": [0.0, 0.0, 0.3826834, 0.9238795] },
            { "name": "c", "translation": [0.5, 1.0, 0.0] },
            { "name": "skinned", "mesh": null, "skin": 0 }
        ],
        "skins": [ { "joints": [1, 3], "inverseBindMatrices": ibm, "skeleton": 0 } ],
        "animations": [ {
            "name": "wiggle",
            "channels": [
                { "sampler": 0, "target": { "node": 2, "path": "rotation" } },
                { "sampler": 1, "target": { "node": 1, "path": "translation" } }
            ],
            "samplers": [
                { "input": times, "output": rotations },
                { "input": times, "output": translations, "interpolation": "STEP" }
            ]
        } ]
    });
    buffers.embed(&mut doc);
    doc
}

#[test]
fn world_matrix_composes_through_three_levels() {
    let asset = Arc::new(parse(&rig_doc()).unwrap());
    let mut instance = SceneInstance::new(asset, KeyframeSearch::Binary);
    instance.play(0, TimeWrapMode::Repeat, 1.0, 0.0).unwrap();

    for t in [0.0, 0.4, 1.0, 1.7, 2.5] {
        instance.tick(t).unwrap();
        let graph = &instance.graph;
        for node in graph.nodes() {
            match node.parent {
                Some(parent) => assert_mat_eq(graph.world_matrix(node.index), graph.world_matrix(parent) * graph.compose_local(node.index)),
                None => assert_mat_eq(graph.world_matrix(node.index), graph.compose_local(node.index)),
            }
        }
    }
}

#[test]
fn joint_matrices_follow_world_times_inverse_bind() {
    let asset = Arc::new(parse(&rig_doc()).unwrap());
    let mut instance = SceneInstance::new(Arc::clone(&asset), KeyframeSearch::Binary);
    instance.play(0, TimeWrapMode::PingPong, 1.0, 0.0).unwrap();

    let report = instance.tick(0.75).unwrap();
    assert_eq!(report.channels_written, 2);
    assert_eq!(report.palettes_refreshed, 1);

    let skin = &asset.skins[0];
    for (i, &joint) in skin.joints.iter().enumerate() {
        assert_mat_eq(instance.palettes[0].matrices[i], instance.graph.world_matrix(joint) * skin.inverse_bind_matrices[i]);
    }

    // nothing moved since, nothing recomputed
    instance.stop(0);
    let report = instance.tick(0.75).unwrap();
    assert_eq!(report.nodes_updated, 0);
    assert_eq!(report.palettes_refreshed, 0);
}

#[test]
fn instances_do_not_share_pose() {
    let asset = Arc::new(parse(&rig_doc()).unwrap());
    let mut a = SceneInstance::new(Arc::clone(&asset), KeyframeSearch::Binary);
    let b = SceneInstance::new(Arc::clone(&asset), KeyframeSearch::Binary);
    a.play(0, TimeWrapMode::Clamp, 1.0, 0.0).unwrap();
    a.tick(1.5).unwrap();

    assert_ne!(a.graph.node(1).unwrap().trs, b.graph.node(1).unwrap().trs);
    assert_eq!(b.graph.node(1).unwrap().trs, asset.scene.node(1).unwrap().trs);

    a.reset_to_bind_pose();
    assert_eq!(a.graph.node(1).unwrap().trs, asset.scene.node(1).unwrap().trs);
    assert_mat_eq(a.palettes[0].matrices[1], b.palettes[0].matrices[1]);
}

#[test]
fn later_animation_wins_on_shared_property() {
    let mut doc = translation_clip(24.0);
    let first = doc["animations"][0].clone();
    let mut second = first.clone();
    second["name"] = json!("hold");
    doc["animations"] = json!([first, second]);
    let asset = Arc::new(parse(&doc).unwrap());
    let mut instance = SceneInstance::new(asset, KeyframeSearch::Binary);
    instance.play(1, TimeWrapMode::Clamp, 1.0, 0.0).unwrap();
    instance.play(0, TimeWrapMode::Clamp, 1.0, -10.0).unwrap();

    instance.tick(0.625).unwrap();
    // animation 0 sits at its end (x = 10), animation 1 runs after it at t = 0.625
    assert!(instance.graph.node(0).unwrap().trs.translation.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
}

proptest! {
    #[test]
    fn linear_clamps_outside_range(t in -100.0f32..100.0) {
        let asset = parse(&translation_clip(24.0)).unwrap();
        let mut graph = asset.scene.clone();
        let mut evaluator = AnimationEvaluator::default();
        evaluator.evaluate(&asset, 0, t, &mut graph).unwrap();
        let x = graph.node(0).unwrap().trs.translation.x;
        if t <= 0.0 {
            prop_assert_eq!(x, 0.0);
        } else if t >= 1.25 {
            prop_assert_eq!(x, 10.0);
        } else {
            prop_assert!((x - t / 1.25 * 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn binary_and_linear_search_evaluate_identically(t in -1.0f32..3.0) {
        let asset = parse(&rig_doc()).unwrap();
        let mut g1 = asset.scene.clone();
        let mut g2 = asset.scene.clone();
        AnimationEvaluator::new(KeyframeSearch::Binary).evaluate(&asset, 0, t, &mut g1).unwrap();
        AnimationEvaluator::new(KeyframeSearch::Linear).evaluate(&asset, 0, t, &mut g2).unwrap();
        for (a, b) in g1.nodes().iter().zip(g2.nodes()) {
            prop_assert_eq!(a.trs, b.trs);
        }
    }

    #[test]
    fn parsed_forests_have_single_parents_and_no_cycles(parents in prop::collection::vec(prop::option::of(0usize..12), 1..12)) {
        // build a forest by only ever pointing at lower indices
        let n = parents.len();
        let mut children = vec![vec![]; n];
        for (i, p) in parents.iter().enumerate() {
            if let Some(p) = p {
                if i > 0 {
                    children[p % i].push(i);
                }
            }
        }
        let nodes: Vec<_> = children.iter().map(|c| json!({ "children": c })).collect();
        let asset = parse(&json!({ "nodes": nodes })).unwrap();

        for node in asset.scene.nodes() {
            let mut seen = 0;
            let mut cursor = node.parent;
            while let Some(p) = cursor {
                prop_assert_ne!(p, node.index);
                seen += 1;
                prop_assert!(seen <= n);
                cursor = asset.scene.node(p).unwrap().parent;
            }
        }
    }

    #[test]
    fn joint_palette_matches_definition_after_any_ticks(times in prop::collection::vec(-1.0f32..4.0, 1..6)) {
        let asset = Arc::new(parse(&rig_doc()).unwrap());
        let mut instance = SceneInstance::new(Arc::clone(&asset), KeyframeSearch::Binary);
        instance.play(0, TimeWrapMode::Repeat, 1.0, 0.0).unwrap();
        for t in times {
            instance.tick(t).unwrap();
        }
        let skin = &asset.skins[0];
        for (i, &joint) in skin.joints.iter().enumerate() {
            let expected = instance.graph.compute_world_matrix(joint) * skin.inverse_bind_matrices[i];
            prop_assert!(instance.palettes[0].matrices[i].abs_diff_eq(expected, 1e-4));
        }
    }
}

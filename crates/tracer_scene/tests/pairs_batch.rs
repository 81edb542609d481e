//! Offline pair batch over a loaded scene.

mod common;

use common::{perspective_camera, RecordingRenderer, ScratchDir, CUBE_OBJ};
use serde_json::json;
use tracer_scene::batch::run_pairs;
use tracer_scene::config::LoaderConfig;
use tracer_scene::device::HostAllocator;
use tracer_scene::loader::Loader;
use tracer_scene::scene::Scene;

fn scene_with_pairs(dir: &ScratchDir, shots: serde_json::Value, pairs: serde_json::Value) -> std::path::PathBuf {
    dir.write("cube.obj", CUBE_OBJ);
    dir.write_scene(&json!({
        "camera": perspective_camera(),
        "meshes": [{"name": "cube", "path": "cube.obj"}],
        "instances": [{"mesh": "cube"}],
        "shots": shots,
        "pairs": pairs
    }))
}

fn two_shots() -> serde_json::Value {
    json!([
        {"type": "lookat", "eye": [0, 0, 5], "lookat": [0, 0, 0], "up": [0, 1, 0]},
        {"type": "lookat", "eye": [5, 0, 0], "lookat": [0, 0, 0], "up": [0, 1, 0]}
    ])
}

#[test]
fn each_pair_renders_once_reference_first() {
    let dir = ScratchDir::new("pairs_once");
    let path = scene_with_pairs(&dir, two_shots(), json!([{"ref": 0, "src": 1}]));
    let mut scene = Scene::new(HostAllocator::new(), LoaderConfig::default());
    Loader::load_scene(&path, &mut scene).unwrap();

    scene.set_shot(0).unwrap();
    let at_shot0 = scene.camera().unwrap().gpu_camera();
    scene.set_shot(1).unwrap();
    let at_shot1 = scene.camera().unwrap().gpu_camera();
    scene.set_shot(0).unwrap();

    let mut renderer = RecordingRenderer::default();
    let rendered = run_pairs(&mut scene, &mut renderer).unwrap();

    assert_eq!(rendered, 1);
    assert_eq!(renderer.rendered.len(), 1);
    let (pair_id, cameras) = renderer.rendered[0];
    assert_eq!(pair_id, 0);
    assert_eq!(cameras.reference, at_shot0);
    assert_eq!(cameras.source, at_shot1);
    // Source pose stays active after the pair
    assert_eq!(scene.current_shot(), Some(1));
}

#[test]
fn pairs_render_in_declaration_order() {
    let dir = ScratchDir::new("pairs_order");
    let path = scene_with_pairs(
        &dir,
        two_shots(),
        json!([{"ref": 1, "src": 0}, {"ref": 0, "src": 1}, {"ref": 1, "src": 1}]),
    );
    let mut scene = Scene::new(HostAllocator::new(), LoaderConfig::default());
    Loader::load_scene(&path, &mut scene).unwrap();

    let mut renderer = RecordingRenderer::default();
    assert_eq!(run_pairs(&mut scene, &mut renderer).unwrap(), 3);
    let ids: Vec<_> = renderer.rendered.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, [0, 1, 2]);
    assert_eq!(renderer.rendered[0].1.reference, renderer.rendered[1].1.source);
}

#[test]
fn renderer_failure_aborts_batch_as_device_error() {
    let dir = ScratchDir::new("pairs_fail");
    let path = scene_with_pairs(&dir, two_shots(), json!([{"ref": 0, "src": 1}, {"ref": 1, "src": 0}]));
    let mut scene = Scene::new(HostAllocator::new(), LoaderConfig::default());
    Loader::load_scene(&path, &mut scene).unwrap();

    let mut renderer = RecordingRenderer {
        fail_on: Some(0),
        ..RecordingRenderer::default()
    };
    let err = run_pairs(&mut scene, &mut renderer).unwrap_err();
    assert!(err.is_device());
    assert!(renderer.rendered.is_empty());
}

#[test]
fn pair_with_unknown_shot_is_reference_error() {
    let dir = ScratchDir::new("pairs_dangling");
    let path = scene_with_pairs(&dir, two_shots(), json!([{"ref": 0, "src": 2}]));
    let mut scene = Scene::new(HostAllocator::new(), LoaderConfig::default());

    let err = Loader::load_scene(&path, &mut scene).unwrap_err();
    assert!(err.is_reference(), "{err}");
    assert_eq!(scene.pairs_num(), 0);
}

#[test]
fn pairs_may_use_the_synthesized_shot() {
    let dir = ScratchDir::new("pairs_fitted");
    let path = scene_with_pairs(&dir, json!([]), json!([{"ref": 0, "src": 0}]));
    let mut scene = Scene::new(HostAllocator::new(), LoaderConfig::default());
    Loader::load_scene(&path, &mut scene).unwrap();

    let mut renderer = RecordingRenderer::default();
    assert_eq!(run_pairs(&mut scene, &mut renderer).unwrap(), 1);
    let (_, cameras) = renderer.rendered[0];
    assert_eq!(cameras.reference, cameras.source);
}

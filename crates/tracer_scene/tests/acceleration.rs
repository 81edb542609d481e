//! Acceleration topology export and the builder hand-off.

mod common;

use common::{perspective_camera, RecordingBuilder, ScratchDir, CUBE_OBJ, TRIANGLE_OBJ};
use serde_json::json;
use tracer_scene::accel::{self, INSTANCE_MASK_ALL};
use tracer_scene::config::LoaderConfig;
use tracer_scene::device::HostAllocator;
use tracer_scene::loader::Loader;
use tracer_scene::scene::{MeshId, Scene, VERTEX_STRIDE};

fn loaded_scene(dir: &ScratchDir) -> Scene<HostAllocator> {
    dir.write("cube.obj", CUBE_OBJ);
    dir.write("tri.obj", TRIANGLE_OBJ);
    let path = dir.write_scene(&json!({
        "camera": perspective_camera(),
        "meshes": [
            {"name": "tri", "path": "tri.obj"},
            {"name": "cube", "path": "cube.obj"}
        ],
        "instances": [
            {"mesh": "cube", "toworld": [{"type": "translate", "value": [3, 0, 0]}]},
            {"mesh": "tri"},
            {"mesh": "cube", "toworld": [{"type": "rotate", "value": [0, 90, 0]}]}
        ],
        "shots": [],
        "pairs": []
    }));

    let mut scene = Scene::new(HostAllocator::new(), LoaderConfig::default());
    Loader::load_scene(&path, &mut scene).unwrap();
    scene
}

#[test]
fn export_maps_meshes_and_instances() {
    let dir = ScratchDir::new("export");
    let scene = loaded_scene(&dir);
    let topology = accel::export(&scene).unwrap();

    assert_eq!(topology.geometries.len(), 2);
    for (i, geometry) in topology.geometries.iter().enumerate() {
        let alloc = scene.mesh_alloc(MeshId(i as u32)).unwrap();
        assert_eq!(geometry.mesh_id, MeshId(i as u32));
        assert_eq!(geometry.vertex_address, alloc.vertex_address);
        assert_eq!(geometry.index_address, alloc.index_address);
        assert_eq!(geometry.vertex_stride, VERTEX_STRIDE);
    }
    assert_eq!(topology.geometries[0].triangle_count, 1);
    assert_eq!(topology.geometries[1].triangle_count, 12);

    let ids: Vec<_> = topology.instances.iter().map(|i| i.mesh_id).collect();
    assert_eq!(ids, [MeshId(1), MeshId(0), MeshId(1)]);
    assert!(topology.instances.iter().all(|i| i.mask == INSTANCE_MASK_ALL && i.sbt_record_offset == 0));
    assert_eq!(topology.instances[0].transform[3], 3.0);
    assert_eq!(topology.instanced_triangles(), 25);
}

#[test]
fn build_resolves_bottom_level_references_by_mesh_id() {
    let dir = ScratchDir::new("build");
    let scene = loaded_scene(&dir);
    let mut builder = RecordingBuilder::default();

    accel::build(&scene, &mut builder).unwrap();

    assert_eq!(builder.calls, ["blas", "tlas"]);
    assert_eq!(builder.blas.len(), scene.meshes_num());
    assert_eq!(builder.tlas.len(), scene.instances_num());
    for resolved in &builder.tlas {
        assert_eq!(resolved.blas_address, builder.addresses[&resolved.instance.mesh_id]);
    }
    assert_eq!(builder.tlas[0].blas_address, builder.tlas[2].blas_address);
    assert_ne!(builder.tlas[0].blas_address, builder.tlas[1].blas_address);
}

#[test]
fn export_requires_submitted_scene() {
    let scene = Scene::new(HostAllocator::new(), LoaderConfig::default());
    assert!(accel::export(&scene).is_err());
}

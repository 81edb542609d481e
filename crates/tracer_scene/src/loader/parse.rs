//! Description parsing
//!
//! Turns a scene description document into a [`SceneDescription`]. Sections
//! are processed in a fixed order (camera, meshes, instances, shots, pairs)
//! because later sections refer back to earlier ones by name or index.

use super::json::{self, as_array, as_str, check_keys, field};
use crate::assets::{find_file, ObjLoader};
use crate::config::{CameraDefaults, LoaderConfig};
use crate::error::{SceneError, SceneResult};
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::camera::{Camera, CameraShot, Extent2D};
use crate::scene::instance::Instance;
use crate::scene::lifecycle::SceneDescription;
use crate::scene::mesh::{Mesh, MeshOptions};
use crate::scene::registry::{MeshRegistry, Pair};
use crate::scene::transform::{compose, TransformOp};
use serde_json::Value;
use std::path::Path;

/// Top-level keys every description must carry
pub const REQUIRED_KEYS: [&str; 5] = ["camera", "meshes", "instances", "shots", "pairs"];

/// Parser bound to the directory of one description file
pub struct DescriptionParser<'a> {
    scene_dir: &'a Path,
    root: &'a Path,
    camera_defaults: CameraDefaults,
}

impl<'a> DescriptionParser<'a> {
    /// Create a parser resolving mesh paths against `scene_dir`, then the
    /// configured root
    pub fn new(scene_dir: &'a Path, config: &'a LoaderConfig) -> Self {
        Self {
            scene_dir,
            root: &config.root,
            camera_defaults: config.camera_defaults,
        }
    }

    /// Parse a whole description
    pub fn parse(&self, doc: &Value) -> SceneResult<SceneDescription> {
        check_keys(doc, &REQUIRED_KEYS, "scene")?;

        let camera = self.parse_camera(field(doc, "camera", "scene")?)?;

        let mut meshes = MeshRegistry::new();
        for (i, mesh_json) in as_array(field(doc, "meshes", "scene")?, "meshes")?.iter().enumerate() {
            let (name, mesh) = self.parse_mesh(mesh_json, i)?;
            meshes.register(name, mesh);
        }

        let instances = as_array(field(doc, "instances", "scene")?, "instances")?
            .iter()
            .enumerate()
            .map(|(i, inst)| parse_instance(inst, i, &meshes))
            .collect::<SceneResult<Vec<_>>>()?;

        let shots = as_array(field(doc, "shots", "scene")?, "shots")?
            .iter()
            .enumerate()
            .map(|(i, shot)| parse_shot(shot, i))
            .collect::<SceneResult<Vec<_>>>()?;

        // Without shots, submit synthesizes exactly one
        let shot_count = shots.len().max(1);
        let pairs = as_array(field(doc, "pairs", "scene")?, "pairs")?
            .iter()
            .enumerate()
            .map(|(i, pair)| parse_pair(pair, i, shot_count))
            .collect::<SceneResult<Vec<_>>>()?;

        Ok(SceneDescription {
            camera,
            meshes,
            instances,
            shots,
            pairs,
        })
    }

    fn parse_camera(&self, camera_json: &Value) -> SceneResult<Camera> {
        check_keys(camera_json, &["type", "film"], "camera")?;
        let film = parse_film(camera_json)?;
        let camera_type = as_str(field(camera_json, "type", "camera")?, "camera.type")?;

        match camera_type {
            "perspective" => {
                let defaults = self.camera_defaults;
                let optional = |key: &str, default: f32| match camera_json.get(key) {
                    Some(value) => json::as_f32(value, &format!("camera.{key}")),
                    None => Ok(default),
                };
                let fov = optional("fov", defaults.fov)?;
                let aperture = optional("aperture", defaults.aperture)?;
                let focal_distance = optional("focal_distance", defaults.focal_distance)?;
                Ok(Camera::perspective(film, fov, focal_distance, aperture))
            }
            "opencv" => {
                check_keys(camera_json, &["fx", "fy", "cx", "cy"], "camera")?;
                let get = |key: &str| json::as_f32(&camera_json[key], &format!("camera.{key}"));
                Ok(Camera::opencv(film, get("fx")?, get("fy")?, get("cx")?, get("cy")?))
            }
            other => Err(SceneError::Config(format!("Unrecognized camera type '{other}'"))),
        }
    }

    fn parse_mesh(&self, mesh_json: &Value, index: usize) -> SceneResult<(String, Mesh)> {
        let context = format!("meshes[{index}]");
        check_keys(mesh_json, &["name", "path"], &context)?;
        let name = as_str(&mesh_json["name"], &context)?.to_string();
        let relative = as_str(&mesh_json["path"], &context)?;

        let path = find_file(relative, &[self.scene_dir, self.root])
            .ok_or_else(|| SceneError::Resource(format!("Failed to find mesh file '{relative}' for mesh '{name}'")))?;

        let mut options = MeshOptions::default();
        if let Some(value) = mesh_json.get("recompute_normal") {
            options.recompute_normal = json::as_bool(value, &context)?;
        }
        if let Some(value) = mesh_json.get("uv_scale") {
            options.uv_scale = json::as_floats::<2>(value, &context)?;
        }

        let data = ObjLoader::load_obj(&path, &options)?;
        log::debug!(
            "Loaded mesh '{}' from {}: {} vertices, {} triangles",
            name,
            path.display(),
            data.vertex_count(),
            data.triangle_count()
        );

        Ok((name, Mesh { path, options, data }))
    }
}

/// Film resolution of a camera object
pub fn parse_film(camera_json: &Value) -> SceneResult<Extent2D> {
    let film = field(camera_json, "film", "camera")?;
    check_keys(film, &["resolution"], "camera.film")?;
    let resolution = json::as_vec2(&film["resolution"], "camera.film.resolution")?;
    if resolution.x < 1.0 || resolution.y < 1.0 {
        return Err(SceneError::Config(format!(
            "camera.film.resolution must be positive, found {}x{}",
            resolution.x, resolution.y
        )));
    }
    Ok(Extent2D::new(resolution.x as u32, resolution.y as u32))
}

fn parse_instance(inst_json: &Value, index: usize, meshes: &MeshRegistry) -> SceneResult<Instance> {
    let context = format!("instances[{index}]");
    check_keys(inst_json, &["mesh"], &context)?;
    let mesh_name = as_str(&inst_json["mesh"], &context)?;

    let mesh_id = meshes
        .id_of(mesh_name)
        .ok_or_else(|| SceneError::Reference(format!("{context} refers to unknown mesh '{mesh_name}'")))?;

    let transform = match inst_json.get("toworld") {
        Some(toworld) => compose(&parse_transform_ops(toworld, &format!("{context}.toworld"))?, false),
        None => Mat4::identity(),
    };

    Ok(Instance::new(mesh_id, transform))
}

/// Parse a `toworld` operator list
pub fn parse_transform_ops(toworld: &Value, context: &str) -> SceneResult<Vec<TransformOp>> {
    as_array(toworld, context)?
        .iter()
        .enumerate()
        .map(|(i, op)| {
            let context = format!("{context}[{i}]");
            check_keys(op, &["type", "value"], &context)?;
            let value = &op["value"];
            Ok(match as_str(&op["type"], &context)? {
                "matrix" => TransformOp::Matrix(json::as_mat4(value, &context)?),
                "translate" => TransformOp::Translate(json::as_vec3(value, &context)?),
                "scale" => TransformOp::Scale(json::as_vec3(value, &context)?),
                "rotx" => TransformOp::RotateX(json::as_f32(value, &context)?),
                "roty" => TransformOp::RotateY(json::as_f32(value, &context)?),
                "rotz" => TransformOp::RotateZ(json::as_f32(value, &context)?),
                "rotate" => TransformOp::Rotate(json::as_vec3(value, &context)?),
                other => {
                    return Err(SceneError::Config(format!(
                        "{context}: unrecognized toworld type '{other}'"
                    )))
                }
            })
        })
        .collect()
}

/// Relative tolerance for a lookat direction parallel to up
const LOOKAT_TOLERANCE: f32 = 1e-6;

fn parse_shot(shot_json: &Value, index: usize) -> SceneResult<CameraShot> {
    let context = format!("shots[{index}]");
    check_keys(shot_json, &["type"], &context)?;

    match as_str(&shot_json["type"], &context)? {
        "lookat" => {
            check_keys(shot_json, &["eye", "lookat", "up"], &context)?;
            let vec = |key: &str| -> SceneResult<Vec3> { json::as_vec3(&shot_json[key], &format!("{context}.{key}")) };
            let (eye, lookat, up) = (vec("eye")?, vec("lookat")?, vec("up")?);

            // Degenerate frames make look_at produce NaN
            let forward = lookat - eye;
            if forward.cross(&up).norm() <= LOOKAT_TOLERANCE * forward.norm() * up.norm() {
                return Err(SceneError::Config(format!(
                    "{context}: eye, lookat and up do not define a camera frame"
                )));
            }
            Ok(CameraShot::new(eye, lookat, up))
        }
        "opencv" => {
            check_keys(shot_json, &["matrix"], &context)?;
            let extrinsic = json::as_mat4(&shot_json["matrix"], &format!("{context}.matrix"))?;
            Ok(CameraShot::from_opencv_extrinsic(&extrinsic))
        }
        other => Err(SceneError::Config(format!("{context}: unrecognized shot type '{other}'"))),
    }
}

fn parse_pair(pair_json: &Value, index: usize, shot_count: usize) -> SceneResult<Pair> {
    let context = format!("pairs[{index}]");
    check_keys(pair_json, &["ref", "src"], &context)?;

    let shot_index = |key: &str| -> SceneResult<usize> {
        let raw = json::as_i64(&pair_json[key], &format!("{context}.{key}"))?;
        usize::try_from(raw)
            .ok()
            .filter(|&i| i < shot_count)
            .ok_or_else(|| {
                SceneError::Reference(format!("{context}.{key} = {raw} is not a valid shot index ({shot_count} shots)"))
            })
    };

    Ok(Pair::new(shot_index("ref")?, shot_index("src")?))
}

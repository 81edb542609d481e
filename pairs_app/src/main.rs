//! Loads a scene description, exports its acceleration topology and runs the
//! offline multiview pair batch.

mod manifest;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use manifest::ManifestWriter;
use std::path::PathBuf;
use tracer_scene::accel::{self, AccelerationTopology};
use tracer_scene::batch::run_pairs;
use tracer_scene::config::{Config, LoaderConfig};
use tracer_scene::device::HostAllocator;
use tracer_scene::foundation::logging;
use tracer_scene::loader::Loader;
use tracer_scene::scene::Scene;

const DEFAULT_OUTPUT_PREFIX: &str = "asuna_out";

fn cli() -> Command {
    Command::new("pairs_app")
        .about("Loads a tracer scene and renders its multiview pairs")
        .arg(
            Arg::new("scene")
                .short('s')
                .long("scene")
                .value_name("FILE")
                .help("Scene description (JSON)")
                .required(true),
        )
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("DIR")
                .help("Search root for a relative scene path"),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("PREFIX")
                .help("Output file prefix")
                .default_value(DEFAULT_OUTPUT_PREFIX),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .help("Run the pair batch instead of printing a summary")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Loader settings (.toml or .ron)"),
        )
}

fn main() -> Result<()> {
    logging::init();
    let matches = cli().get_matches();

    let scene_path = PathBuf::from(
        matches
            .get_one::<String>("scene")
            .context("--scene is required")?,
    );

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => LoaderConfig::load_from_file(path).with_context(|| format!("Failed to load config {path}"))?,
        None => LoaderConfig::default(),
    };
    if let Some(root) = matches.get_one::<String>("root") {
        config.root = PathBuf::from(root);
    }

    let size = Loader::load_size_first(&scene_path, &config)
        .with_context(|| format!("Failed to read film size from {}", scene_path.display()))?;
    log::info!("Film resolution {}x{}", size.width, size.height);

    let mut scene = Scene::new(HostAllocator::new(), config);
    Loader::load_scene(&scene_path, &mut scene)
        .with_context(|| format!("Failed to load scene {}", scene_path.display()))?;

    let topology = accel::export(&scene).context("Failed to export acceleration topology")?;
    log::info!(
        "Acceleration topology: {} geometries, {} instances, {} instanced triangles",
        topology.geometries.len(),
        topology.instances.len(),
        topology.instanced_triangles()
    );

    if matches.get_flag("offline") {
        let prefix = matches
            .get_one::<String>("out")
            .map_or(DEFAULT_OUTPUT_PREFIX, String::as_str);
        let mut writer = ManifestWriter::new(prefix);
        let rendered = run_pairs(&mut scene, &mut writer).context("Pair batch failed")?;
        log::info!("Rendered {} pairs, {} manifests written", rendered, writer.written().len());
    } else {
        print_summary(&scene, &topology);
    }

    Ok(())
}

fn print_summary(scene: &Scene<HostAllocator>, topology: &AccelerationTopology) {
    println!("meshes:    {}", scene.meshes_num());
    for (id, name, mesh) in scene.meshes().iter() {
        println!(
            "  {} {:<16} {} vertices, {} triangles",
            id,
            name,
            mesh.data.vertex_count(),
            mesh.data.triangle_count()
        );
    }
    println!("instances: {}", scene.instances_num());
    println!("shots:     {}", scene.shots_num());
    println!("pairs:     {}", scene.pairs_num());
    if let Some(camera) = scene.camera_type() {
        println!("camera:    {camera:?}");
    }
    if let Some(dims) = scene.dimensions() {
        println!(
            "bounds:    [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}] (radius {:.3})",
            dims.min.x, dims.min.y, dims.min.z, dims.max.x, dims.max.y, dims.max.z, dims.radius
        );
    }
    println!("device buffers: {}", scene.allocator().live_buffers());
    println!("triangles (instanced): {}", topology.instanced_triangles());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let matches = cli().try_get_matches_from(["pairs_app", "--scene", "a.json"]).unwrap();
        assert_eq!(matches.get_one::<String>("out").map(String::as_str), Some("asuna_out"));
        assert!(!matches.get_flag("offline"));
    }

    #[test]
    fn test_cli_requires_scene() {
        assert!(cli().try_get_matches_from(["pairs_app", "--offline"]).is_err());
    }
}

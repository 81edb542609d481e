//! Scene description loading
//!
//! Descriptions are JSON documents with the top-level keys `camera`,
//! `meshes`, `instances`, `shots` and `pairs`. [`Loader::load_size_first`]
//! reads only the film resolution so a caller can size its output before the
//! full load; [`Loader::load_scene`] resets a [`Scene`], parses the whole
//! description and submits it.

pub mod json;
pub mod parse;

pub use parse::{parse_transform_ops, DescriptionParser, REQUIRED_KEYS};

use crate::assets::find_file;
use crate::config::LoaderConfig;
use crate::device::DeviceAllocator;
use crate::error::{SceneError, SceneResult};
use crate::scene::camera::Extent2D;
use crate::scene::lifecycle::{Scene, SceneDescription};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Entry points for reading description files
pub struct Loader;

impl Loader {
    /// Read only the film resolution of a description
    pub fn load_size_first<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> SceneResult<Extent2D> {
        let (doc, _) = Self::read_description(path.as_ref(), config)?;
        json::check_keys(&doc, &REQUIRED_KEYS, "scene")?;
        let camera = json::field(&doc, "camera", "scene")?;
        json::check_keys(camera, &["type", "film"], "camera")?;
        parse::parse_film(camera)
    }

    /// Reset `scene`, then parse and submit the description at `path`
    ///
    /// A parse failure leaves the scene empty. A submit failure leaves it
    /// parsed with no device resources.
    pub fn load_scene<P: AsRef<Path>, A: DeviceAllocator>(path: P, scene: &mut Scene<A>) -> SceneResult<()> {
        log::info!("Loading scene assets, this may take tens of seconds");
        scene.reset();

        let description = Self::parse_file(path.as_ref(), scene.config())?;
        scene.commit(description);
        scene.submit()?;

        log::info!(
            "Scene ready: {} meshes, {} instances, {} shots, {} pairs",
            scene.meshes_num(),
            scene.instances_num(),
            scene.shots_num(),
            scene.pairs_num()
        );
        Ok(())
    }

    /// Parse a description file without touching any scene
    pub fn parse_file(path: &Path, config: &LoaderConfig) -> SceneResult<SceneDescription> {
        let (doc, scene_dir) = Self::read_description(path, config)?;
        DescriptionParser::new(&scene_dir, config).parse(&doc)
    }

    /// Parse description text; relative mesh paths resolve against `scene_dir`
    pub fn parse_str(text: &str, scene_dir: &Path, config: &LoaderConfig) -> SceneResult<SceneDescription> {
        let doc: Value = serde_json::from_str(text)
            .map_err(|e| SceneError::Resource(format!("Malformed scene description: {e}")))?;
        DescriptionParser::new(scene_dir, config).parse(&doc)
    }

    fn read_description(path: &Path, config: &LoaderConfig) -> SceneResult<(Value, PathBuf)> {
        let resolved = find_file(path, &[config.root.as_path()]).ok_or_else(|| {
            SceneError::Resource(format!("Failed to find scene description '{}'", path.display()))
        })?;

        let text = std::fs::read_to_string(&resolved)
            .map_err(|e| SceneError::Resource(format!("Failed to read '{}': {}", resolved.display(), e)))?;
        let doc: Value = serde_json::from_str(&text)
            .map_err(|e| SceneError::Resource(format!("Malformed scene description '{}': {}", resolved.display(), e)))?;

        let scene_dir = resolved.parent().map(Path::to_path_buf).unwrap_or_default();
        log::debug!("Scene description resolved to {}", resolved.display());
        Ok((doc, scene_dir))
    }
}

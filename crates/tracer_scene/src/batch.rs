//! Offline multiview batch
//!
//! Walks the scene's pairs in order. For each pair the camera is posed at the
//! reference shot, then the source shot, and the renderer receives both
//! snapshots in a single call.

use crate::device::{DeviceAllocator, DeviceError};
use crate::error::SceneResult;
use crate::scene::camera::GpuCameraPair;
use crate::scene::lifecycle::Scene;

/// Renders one multiview pair
pub trait PairRenderer {
    /// Render pair `pair_id` with its reference and source cameras
    fn render_pair(&mut self, pair_id: usize, cameras: &GpuCameraPair) -> Result<(), DeviceError>;
}

/// Output file name of a pair, e.g. `out_pair_0007.exr`
pub fn pair_output_name(prefix: &str, pair_id: usize) -> String {
    format!("{prefix}_pair_{pair_id:04}.exr")
}

/// Render every pair once, in order; returns the number of pairs rendered
pub fn run_pairs<A: DeviceAllocator, R: PairRenderer + ?Sized>(
    scene: &mut Scene<A>,
    renderer: &mut R,
) -> SceneResult<usize> {
    let count = scene.pairs_num();
    log::info!("Rendering {} pairs", count);

    for pair_id in 0..count {
        let cameras = scene.set_current_pair(pair_id)?;
        renderer.render_pair(pair_id, &cameras)?;
        log::debug!("Pair {}/{} done", pair_id + 1, count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_output_name_is_zero_padded() {
        assert_eq!(pair_output_name("asuna_out", 0), "asuna_out_pair_0000.exr");
        assert_eq!(pair_output_name("out/run", 42), "out/run_pair_0042.exr");
        assert_eq!(pair_output_name("x", 12345), "x_pair_12345.exr");
    }
}

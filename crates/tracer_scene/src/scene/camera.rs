//! # Scene Camera
//!
//! The scene holds exactly one camera. Its intrinsics come from the
//! description (`perspective` or `opencv` model) and never change after load;
//! its extrinsic pose is swapped by activating one of the scene's
//! [`CameraShot`]s.
//!
//! ## Coordinate conventions
//! - Shots are stored as look-at triples in world space.
//! - A perspective camera looks down its local `-Z` with `+Y` up.
//! - An OpenCV camera looks down its local `+Z` with `+Y` down, so its
//!   camera-to-world matrix is the look-at frame with Y and Z flipped.
//! - Raster space has its origin at the top-left pixel corner.

use crate::config::CameraFitConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::scene::bounds::Aabb;
use bytemuck::{Pod, Zeroable};

/// Film size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent2D {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Extent2D {
    /// Create an extent
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Camera model tag, matching the value written to [`GpuCamera::camera_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CameraType {
    /// Pinhole/thin-lens perspective camera
    Perspective = 0,
    /// Pinhole camera with OpenCV intrinsics
    OpenCv = 1,
}

/// Intrinsic parameters; the variant decides which fields are meaningful
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraModel {
    /// Field-of-view based camera
    Perspective {
        /// Vertical field of view in degrees
        fov: f32,
        /// Distance to the plane in focus
        focal_distance: f32,
        /// Lens aperture radius
        aperture: f32,
    },
    /// Focal lengths and principal point in pixels
    OpenCv {
        /// Focal length along x
        fx: f32,
        /// Focal length along y
        fy: f32,
        /// Principal point x
        cx: f32,
        /// Principal point y
        cy: f32,
    },
}

/// One extrinsic camera pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraShot {
    /// Camera position
    pub eye: Vec3,
    /// Point the camera looks at
    pub lookat: Vec3,
    /// Up direction
    pub up: Vec3,
}

impl CameraShot {
    /// Create a shot from a look-at triple
    pub fn new(eye: Vec3, lookat: Vec3, up: Vec3) -> Self {
        Self { eye, lookat, up }
    }

    /// Derive a pose from an OpenCV world-to-camera extrinsic matrix
    pub fn from_opencv_extrinsic(extrinsic: &Mat4) -> Self {
        let camera_to_world = extrinsic.invert_rot_trans();
        let eye = camera_to_world.translation_part();
        let up = (camera_to_world * Vec4::new(0.0, -1.0, 0.0, 0.0)).xyz();
        let lookat = (camera_to_world * Vec4::new(0.0, 0.0, 1.0, 1.0)).xyz();
        Self { eye, lookat, up }
    }

    /// World-to-camera matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.eye, self.lookat, self.up)
    }

    /// Camera-to-world matrix
    pub fn to_world_matrix(&self) -> Mat4 {
        self.view_matrix().invert_rot_trans()
    }
}

/// Camera uniform consumed by the ray generation stage
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuCamera {
    /// Pixel coordinates to camera-space ray target
    pub raster_to_camera: [[f32; 4]; 4],
    /// Camera space to world space
    pub camera_to_world: [[f32; 4]; 4],
    /// World space to camera space
    pub world_to_camera: [[f32; 4]; 4],
    /// World space to homogeneous pixel coordinates
    pub world_to_raster: [[f32; 4]; 4],
    /// `[fx, fy, cx, cy]` for the OpenCV model, zero otherwise
    pub fxfycxcy: [f32; 4],
    /// Keeps `camera_type` on a 16-byte boundary
    pub padding: [f32; 3],
    /// [`CameraType`] as `u32`
    pub camera_type: u32,
}

/// Reference and source camera of one multiview pair
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuCameraPair {
    /// Reference view
    pub reference: GpuCamera,
    /// Source view
    pub source: GpuCamera,
}

/// The scene camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    film_resolution: Extent2D,
    model: CameraModel,
    shot: Option<CameraShot>,
}

impl Camera {
    /// Create a perspective camera
    pub fn perspective(film_resolution: Extent2D, fov: f32, focal_distance: f32, aperture: f32) -> Self {
        Self::new(
            film_resolution,
            CameraModel::Perspective {
                fov,
                focal_distance,
                aperture,
            },
        )
    }

    /// Create an OpenCV-model camera
    pub fn opencv(film_resolution: Extent2D, fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self::new(film_resolution, CameraModel::OpenCv { fx, fy, cx, cy })
    }

    /// Create a camera from a model
    pub fn new(film_resolution: Extent2D, model: CameraModel) -> Self {
        Self {
            film_resolution,
            model,
            shot: None,
        }
    }

    /// Film resolution fixed at load time
    pub fn film_resolution(&self) -> Extent2D {
        self.film_resolution
    }

    /// Intrinsic parameters
    pub fn model(&self) -> &CameraModel {
        &self.model
    }

    /// Model tag
    pub fn camera_type(&self) -> CameraType {
        match self.model {
            CameraModel::Perspective { .. } => CameraType::Perspective,
            CameraModel::OpenCv { .. } => CameraType::OpenCv,
        }
    }

    /// Vertical field of view in degrees implied by the intrinsics
    pub fn vertical_fov(&self) -> f32 {
        match self.model {
            CameraModel::Perspective { fov, .. } => fov,
            CameraModel::OpenCv { fy, .. } => {
                let half_height = self.film_resolution.height as f32 * 0.5;
                utils::rad_to_deg(2.0 * (half_height / fy).atan())
            }
        }
    }

    /// Activate an extrinsic pose
    pub fn set_to_world(&mut self, shot: &CameraShot) {
        self.shot = Some(*shot);
        log::trace!("Camera pose set: eye {:?} lookat {:?}", shot.eye, shot.lookat);
    }

    /// Currently active pose, if any
    pub fn shot(&self) -> Option<&CameraShot> {
        self.shot.as_ref()
    }

    /// Camera-to-world matrix in the model's own camera convention
    pub fn camera_to_world(&self) -> Mat4 {
        let Some(shot) = self.shot else {
            return Mat4::identity();
        };

        match self.model {
            CameraModel::Perspective { .. } => shot.to_world_matrix(),
            CameraModel::OpenCv { .. } => {
                shot.to_world_matrix() * Mat4::from_diagonal(&Vec4::new(1.0, -1.0, -1.0, 1.0))
            }
        }
    }

    /// Pixel coordinates to a point on the camera-space image plane
    pub fn raster_to_camera(&self) -> Mat4 {
        let w = self.film_resolution.width as f32;
        let h = self.film_resolution.height as f32;

        match self.model {
            CameraModel::Perspective { fov, .. } => {
                let tan = (utils::deg_to_rad(fov) * 0.5).tan();
                let aspect = self.film_resolution.aspect();
                Mat4::new(
                    2.0 * aspect * tan / w, 0.0, 0.0, -aspect * tan,
                    0.0, -2.0 * tan / h, 0.0, tan,
                    0.0, 0.0, 0.0, -1.0,
                    0.0, 0.0, 0.0, 1.0,
                )
            }
            CameraModel::OpenCv { fx, fy, cx, cy } => Mat4::new(
                1.0 / fx, 0.0, 0.0, -cx / fx,
                0.0, 1.0 / fy, 0.0, -cy / fy,
                0.0, 0.0, 0.0, 1.0,
                0.0, 0.0, 0.0, 1.0,
            ),
        }
    }

    /// Camera space to homogeneous pixel coordinates (divide by `w`)
    pub fn camera_to_raster(&self) -> Mat4 {
        let w = self.film_resolution.width as f32;
        let h = self.film_resolution.height as f32;

        match self.model {
            CameraModel::Perspective { fov, .. } => {
                let tan = (utils::deg_to_rad(fov) * 0.5).tan();
                let aspect = self.film_resolution.aspect();
                Mat4::new(
                    w / (2.0 * aspect * tan), 0.0, -w * 0.5, 0.0,
                    0.0, -h / (2.0 * tan), -h * 0.5, 0.0,
                    0.0, 0.0, 0.0, 1.0,
                    0.0, 0.0, -1.0, 0.0,
                )
            }
            CameraModel::OpenCv { fx, fy, cx, cy } => Mat4::new(
                fx, 0.0, cx, 0.0,
                0.0, fy, cy, 0.0,
                0.0, 0.0, 0.0, 1.0,
                0.0, 0.0, 1.0, 0.0,
            ),
        }
    }

    /// Snapshot the camera as a device uniform
    pub fn gpu_camera(&self) -> GpuCamera {
        let camera_to_world = self.camera_to_world();
        let world_to_camera = camera_to_world.invert_rot_trans();
        let fxfycxcy = match self.model {
            CameraModel::OpenCv { fx, fy, cx, cy } => [fx, fy, cx, cy],
            CameraModel::Perspective { .. } => [0.0; 4],
        };

        GpuCamera {
            raster_to_camera: self.raster_to_camera().into(),
            camera_to_world: camera_to_world.into(),
            world_to_camera: world_to_camera.into(),
            world_to_raster: (self.camera_to_raster() * world_to_camera).into(),
            fxfycxcy,
            padding: [0.0; 3],
            camera_type: self.camera_type() as u32,
        }
    }
}

/// Fit a pose so the bounding sphere of `bounds` fills the view
///
/// The eye is placed along `config.view_direction` from the box center, far
/// enough that the sphere touches the narrower field of view.
pub fn camera_fit(bounds: &Aabb, aspect: f32, fov_degrees: f32, config: &CameraFitConfig) -> CameraShot {
    let center = bounds.center();
    let radius = bounds.radius();

    let yfov = fov_degrees;
    let xfov = fov_degrees * aspect;
    let half_angle = if aspect > 1.0 { yfov * 0.5 } else { xfov * 0.5 };
    let offset = radius / utils::deg_to_rad(half_angle).sin();

    let view_dir = Vec3::from(config.view_direction)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vec3::z);

    CameraShot {
        eye: center + view_dir * offset,
        lookat: center,
        up: Vec3::from(config.up),
    }
}

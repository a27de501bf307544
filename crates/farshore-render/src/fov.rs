//! Distance and view-cone culling on the ground plane.

use glam::{Vec2, Vec3};

/// Camera state needed for culling decisions.
#[derive(Clone, Copy, Debug)]
pub struct CameraPose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    fn position_2d(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }

    fn forward_2d(&self) -> Vec2 {
        Vec2::new(self.forward.x, self.forward.z)
    }
}

/// Combined distance and horizontal field-of-view test.
///
/// Both tests run on the XZ plane: height differences never cull. A point
/// passes when it is within the culling distance and inside the view cone.
#[derive(Clone, Copy, Debug)]
pub struct FovCuller {
    cos_half_fov: f32,
    culling_distance_sq: f32,
    enabled: bool,
}

impl FovCuller {
    pub fn new(fov_degrees: f32, culling_distance: f32) -> Self {
        Self {
            cos_half_fov: (fov_degrees * 0.5).to_radians().cos(),
            culling_distance_sq: culling_distance * culling_distance,
            enabled: true,
        }
    }

    /// A culler that accepts every point. Used when culling is switched off.
    pub fn disabled() -> Self {
        Self {
            cos_half_fov: -1.0,
            culling_distance_sq: f32::INFINITY,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn visible(&self, camera: &CameraPose, point: Vec3) -> bool {
        if !self.enabled {
            return true;
        }
        let to = Vec2::new(point.x, point.z) - camera.position_2d();
        if to.length_squared() > self.culling_distance_sq {
            return false;
        }
        let Some(dir) = to.try_normalize() else {
            // Standing on the point.
            return true;
        };
        let Some(forward) = camera.forward_2d().try_normalize() else {
            // Looking straight up or down: the cone is undefined, keep it.
            return true;
        };
        forward.dot(dir) > self.cos_half_fov
    }
}

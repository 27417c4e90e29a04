/// Stereo camera and asymmetric frustum projection
use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

/// Which eyes are rendered each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StereoMode {
    /// One centered frustum, eye separation ignored
    Mono,
    /// Left eye frustum only
    #[default]
    #[serde(alias = "left")]
    LeftOnly,
    /// Left eye in red, right eye in green and blue
    Anaglyph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Center,
    Left,
    Right,
}

/// Parallel-axis stereo camera configuration.
///
/// Re-read every frame; nothing derived from it is cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoCamera {
    pub eye_separation: f64,
    /// Distance of the zero parallax plane
    pub convergence: f64,
    pub aspect_ratio: f64,
    /// Vertical field of view in radians
    pub fov: f64,
    pub near: f64,
    pub far: f64,
}

/// Side planes of a frustum at the near plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumBounds {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub near: f64,
    pub far: f64,
}

impl FrustumBounds {
    pub fn matrix(&self) -> Matrix4<f64> {
        frustum(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

impl StereoCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            aspect_ratio: width as f64 / height.max(1) as f64,
            ..Self::default()
        }
    }

    /// Reject parameters that would produce a degenerate or inverted frustum
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if !(self.convergence > 0.0) || !self.convergence.is_finite() {
            return Err(ProjectionError::NonPositiveConvergence(self.convergence));
        }
        if !(self.eye_separation >= 0.0) || !self.eye_separation.is_finite() {
            return Err(ProjectionError::InvalidCamera(format!(
                "eye separation must be non-negative, got {}",
                self.eye_separation
            )));
        }
        if !(self.aspect_ratio > 0.0) || !self.aspect_ratio.is_finite() {
            return Err(ProjectionError::InvalidCamera(format!(
                "aspect ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        if !(self.fov > 0.0 && self.fov < std::f64::consts::PI) {
            return Err(ProjectionError::InvalidCamera(format!(
                "field of view must be in (0, pi), got {}",
                self.fov
            )));
        }
        if !(self.near > 0.0) || !(self.far > self.near) || !self.far.is_finite() {
            return Err(ProjectionError::InvalidCamera(format!(
                "clip planes must satisfy 0 < near < far, got near {} far {}",
                self.near, self.far
            )));
        }
        Ok(())
    }

    /// Frustum bounds for one eye
    pub fn bounds(&self, eye: Eye) -> Result<FrustumBounds, ProjectionError> {
        self.validate()?;

        let half_fov_tan = (self.fov / 2.0).tan();
        let top = self.near * half_fov_tan;
        let bottom = -top;

        let a = self.aspect_ratio * half_fov_tan * self.convergence;
        let (b, c) = match eye {
            Eye::Center => (a, a),
            Eye::Left | Eye::Right => (
                a - self.eye_separation / 2.0,
                a + self.eye_separation / 2.0,
            ),
        };
        let scale = self.near / self.convergence;

        let (left, right) = match eye {
            Eye::Center | Eye::Left => (-b * scale, c * scale),
            Eye::Right => (-c * scale, b * scale),
        };

        Ok(FrustumBounds {
            left,
            right,
            bottom,
            top,
            near: self.near,
            far: self.far,
        })
    }

    pub fn left_frustum(&self) -> Result<Matrix4<f64>, ProjectionError> {
        Ok(self.bounds(Eye::Left)?.matrix())
    }

    pub fn right_frustum(&self) -> Result<Matrix4<f64>, ProjectionError> {
        Ok(self.bounds(Eye::Right)?.matrix())
    }

    pub fn projection(&self, eye: Eye) -> Result<Matrix4<f64>, ProjectionError> {
        Ok(self.bounds(eye)?.matrix())
    }

    /// Apply a change only if the result is still a valid camera
    pub fn update<F>(&mut self, change: F) -> Result<(), ProjectionError>
    where
        F: FnOnce(&mut StereoCamera),
    {
        let mut next = *self;
        change(&mut next);
        next.validate()?;
        *self = next;
        Ok(())
    }
}

impl Default for StereoCamera {
    fn default() -> Self {
        Self {
            eye_separation: 0.2,
            convergence: 10.0,
            aspect_ratio: 1.0,
            fov: std::f64::consts::PI / 8.0,
            near: 1.0,
            far: 20.0,
        }
    }
}

/// Off-axis perspective projection, OpenGL clip conventions
pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Matrix4<f64> {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;

    Matrix4::new(
        2.0 * near / width,
        0.0,
        (right + left) / width,
        0.0,
        0.0,
        2.0 * near / height,
        (top + bottom) / height,
        0.0,
        0.0,
        0.0,
        -(far + near) / depth,
        -2.0 * far * near / depth,
        0.0,
        0.0,
        -1.0,
        0.0,
    )
}

/// Map a clip-space position to screen space.
///
/// Returns `(x, y, depth)` with `y` growing downwards and depth in NDC, or
/// `None` when the point is behind the eye.
pub fn clip_to_screen(clip: &Vector4<f32>, width: u32, height: u32) -> Option<(f32, f32, f32)> {
    // Prevent division by near-zero depth values
    if clip.w < 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

    Some((screen_x, screen_y, depth))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_camera() -> StereoCamera {
        StereoCamera {
            eye_separation: 0.004,
            convergence: 1.0,
            aspect_ratio: 1.0,
            fov: 30f64.to_radians(),
            near: 0.0001,
            far: 20.0,
        }
    }

    #[test]
    fn test_camera_creation() {
        let camera = StereoCamera::new(800, 600);
        assert!((camera.aspect_ratio - 800.0 / 600.0).abs() < 1e-12);
        assert!(camera.validate().is_ok());
    }

    #[test]
    fn test_left_frustum_bounds() {
        let camera = reference_camera();
        let bounds = camera.bounds(Eye::Left).unwrap();
        assert!(bounds.left < 0.0 && 0.0 < bounds.right);

        let expected = 2.0 * camera.near * (camera.fov / 2.0).tan() * camera.aspect_ratio;
        assert!((bounds.right - bounds.left - expected).abs() < 1e-15);
        assert!((bounds.top + bounds.bottom).abs() < 1e-18);
    }

    #[test]
    fn test_eyes_mirror_each_other() {
        let camera = reference_camera();
        let left = camera.bounds(Eye::Left).unwrap();
        let right = camera.bounds(Eye::Right).unwrap();
        assert!((left.left + right.right).abs() < 1e-18);
        assert!((left.right + right.left).abs() < 1e-18);
    }

    #[test]
    fn test_zero_separation_is_symmetric() {
        let camera = StereoCamera {
            eye_separation: 0.0,
            ..reference_camera()
        };
        let left = camera.left_frustum().unwrap();
        let right = camera.right_frustum().unwrap();
        assert_eq!(left, right);
        assert_eq!(left, camera.projection(Eye::Center).unwrap());
    }

    #[test]
    fn test_zero_convergence_is_rejected() {
        let camera = StereoCamera {
            convergence: 0.0,
            ..reference_camera()
        };
        assert_eq!(
            camera.left_frustum(),
            Err(ProjectionError::NonPositiveConvergence(0.0))
        );
        assert!(camera.right_frustum().is_err());
    }

    #[test]
    fn test_convergence_at_near_plane_is_finite() {
        let camera = StereoCamera {
            convergence: 0.0001,
            ..reference_camera()
        };
        let m = camera.left_frustum().unwrap();
        assert!(m.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_update_keeps_state_on_rejection() {
        let mut camera = reference_camera();
        assert!(camera.update(|c| c.convergence = -1.0).is_err());
        assert_eq!(camera.convergence, 1.0);
        assert!(camera.update(|c| c.near = 30.0).is_err());
        assert!(camera.update(|c| c.convergence = 2.5).is_ok());
        assert_eq!(camera.convergence, 2.5);
    }

    #[test]
    fn test_frustum_maps_near_corners() {
        let m = frustum(-1.0, 3.0, -2.0, 2.0, 1.0, 10.0);
        let corner = m * Vector4::new(3.0, 2.0, -1.0, 1.0);
        assert!((corner.x / corner.w - 1.0).abs() < 1e-12);
        assert!((corner.y / corner.w - 1.0).abs() < 1e-12);
        assert!((corner.z / corner.w + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clip_to_screen() {
        let center = clip_to_screen(&Vector4::new(0.0, 0.0, 0.5, 1.0), 80, 40).unwrap();
        assert_eq!(center, (40.0, 20.0, 0.5));
        assert!(clip_to_screen(&Vector4::new(0.0, 0.0, 0.5, -1.0), 80, 40).is_none());
    }
}

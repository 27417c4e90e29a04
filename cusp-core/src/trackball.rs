/// Virtual trackball driven by pointer drags
use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackballOptions {
    /// Distance from the eye to the rotation center
    pub view_distance: f64,
}

impl Default for TrackballOptions {
    fn default() -> Self {
        Self { view_distance: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackballState {
    Idle,
    Dragging { last_ray: Vector3<f64> },
}

/// Screen positions map onto a unit sphere near the viewport center and a
/// hyperbolic sheet further out, so the mapping is defined everywhere. Each
/// drag step rotates the camera by the arc between consecutive mapped rays.
#[derive(Debug, Clone)]
pub struct TrackballRotator {
    state: TrackballState,
    /// Camera orientation; the view rotation is its inverse
    orientation: UnitQuaternion<f64>,
    view_distance: f64,
    width: f64,
    height: f64,
}

impl TrackballRotator {
    pub fn new(width: u32, height: u32, options: &TrackballOptions) -> Self {
        Self {
            state: TrackballState::Idle,
            orientation: UnitQuaternion::identity(),
            view_distance: options.view_distance,
            width: width.max(1) as f64,
            height: height.max(1) as f64,
        }
    }

    pub fn state(&self) -> TrackballState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, TrackballState::Dragging { .. })
    }

    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1) as f64;
        self.height = height.max(1) as f64;
    }

    pub fn reset(&mut self) {
        self.state = TrackballState::Idle;
        self.orientation = UnitQuaternion::identity();
    }

    /// Idle -> Dragging
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.state = TrackballState::Dragging {
            last_ray: self.map_to_ball(x, y),
        };
    }

    /// Returns true when the orientation changed
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let TrackballState::Dragging { last_ray } = self.state else {
            return false;
        };

        let ray = self.map_to_ball(x, y);
        self.state = TrackballState::Dragging { last_ray: ray };

        let delta = rotation_between_rays(&last_ray, &ray);
        if delta.angle() == 0.0 {
            return false;
        }
        // The scene follows the pointer, so the camera turns the other way.
        self.orientation = self.orientation * delta.inverse();
        true
    }

    /// Dragging -> Idle
    pub fn pointer_up(&mut self) {
        self.state = TrackballState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.state = TrackballState::Idle;
    }

    /// Current view matrix. Pure read of the accumulated orientation.
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&Vector3::new(0.0, 0.0, -self.view_distance))
            * self.orientation.inverse().to_homogeneous()
    }

    /// Map a pixel position to a unit vector on the virtual trackball
    pub fn map_to_ball(&self, x: f64, y: f64) -> Vector3<f64> {
        let scale = self.width.min(self.height) / 2.0;
        let px = (x - self.width / 2.0) / scale;
        let py = (self.height / 2.0 - y) / scale;
        project_to_ball(px, py)
    }
}

/// Sphere of radius 1 inside `r < 1/sqrt(2)`, hyperbolic sheet `z = 1/(2r)` outside
pub fn project_to_ball(x: f64, y: f64) -> Vector3<f64> {
    let d2 = x * x + y * y;
    let z = if d2 < 0.5 {
        (1.0 - d2).sqrt()
    } else {
        0.5 / d2.sqrt()
    };
    Vector3::new(x, y, z).normalize()
}

/// Shortest rotation taking `from` onto `to`.
///
/// Antipodal vectors have no unique shortest arc; a half turn around any
/// axis perpendicular to `from` is used.
pub fn rotation_between_rays(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    if let Some(rotation) = UnitQuaternion::rotation_between(from, to) {
        return rotation;
    }

    let helper = if from.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let axis = nalgebra::Unit::new_normalize(from.cross(&helper));
    UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotator() -> TrackballRotator {
        TrackballRotator::new(400, 400, &TrackballOptions::default())
    }

    #[test]
    fn test_starts_idle_with_identity_view() {
        let trackball = rotator();
        assert_eq!(trackball.state(), TrackballState::Idle);
        assert!((trackball.view_matrix() - Matrix4::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut trackball = rotator();
        assert!(!trackball.pointer_move(300.0, 200.0));
        assert_eq!(trackball.orientation(), UnitQuaternion::identity());
    }

    #[test]
    fn test_zero_displacement_is_identity() {
        let mut trackball = rotator();
        trackball.pointer_down(250.0, 180.0);
        assert!(!trackball.pointer_move(250.0, 180.0));
        assert!(trackball.orientation().angle().abs() < 1e-12);
        assert!(trackball.is_dragging());
    }

    #[test]
    fn test_antipodal_rays_give_half_turn() {
        let from = Vector3::new(1.0, 0.0, 0.0);
        let to = Vector3::new(-1.0, 0.0, 0.0);
        let rotation = rotation_between_rays(&from, &to);
        assert!((rotation.angle() - std::f64::consts::PI).abs() < 1e-9);
        assert!((rotation * from - to).norm() < 1e-9);
    }

    #[test]
    fn test_drag_across_the_sheet_approaches_half_turn() {
        let mut trackball = rotator();
        trackball.pointer_down(200.0 + 1.0e6, 200.0);
        assert!(trackball.pointer_move(200.0 - 1.0e6, 200.0));
        let angle = trackball.orientation().angle();
        assert!(angle > 179f64.to_radians(), "angle {angle}");
    }

    #[test]
    fn test_drag_rotates_scene_with_pointer() {
        let mut trackball = rotator();
        trackball.pointer_down(200.0, 200.0);
        trackball.pointer_move(260.0, 200.0);
        // a point facing the viewer moves to the right on screen
        let facing = trackball.view_matrix() * nalgebra::Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!(facing.x > 0.0);
    }

    #[test]
    fn test_release_and_leave_end_drag() {
        let mut trackball = rotator();
        trackball.pointer_down(10.0, 10.0);
        trackball.pointer_up();
        assert_eq!(trackball.state(), TrackballState::Idle);

        trackball.pointer_down(10.0, 10.0);
        trackball.pointer_leave();
        assert!(!trackball.pointer_move(50.0, 50.0));
    }

    #[test]
    fn test_view_matrix_does_not_mutate() {
        let mut trackball = rotator();
        trackball.pointer_down(200.0, 200.0);
        trackball.pointer_move(220.0, 240.0);
        let first = trackball.view_matrix();
        let second = trackball.view_matrix();
        assert_eq!(first, second);
    }

    #[test]
    fn test_view_distance_translates() {
        let trackball = TrackballRotator::new(
            100,
            100,
            &TrackballOptions { view_distance: 5.0 },
        );
        assert_eq!(trackball.view_matrix()[(2, 3)], -5.0);
    }

    #[test]
    fn test_center_maps_to_pole() {
        let trackball = rotator();
        let ray = trackball.map_to_ball(200.0, 200.0);
        assert!((ray - Vector3::z()).norm() < 1e-12);
    }
}

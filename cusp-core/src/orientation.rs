/// Device orientation readings and the external rotation cell
use nalgebra::{Matrix4, Rotation3, Vector3};

/// One orientation sensor sample, angles in degrees.
///
/// `alpha` turns around z, `beta` around x, `gamma` around y, composed in
/// that intrinsic order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationReading {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl OrientationReading {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    pub fn rotation_matrix(&self) -> Matrix4<f64> {
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), self.alpha.to_radians());
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), self.beta.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), self.gamma.to_radians());
        (rz * rx * ry).to_homogeneous()
    }
}

/// Latest externally supplied rotation.
///
/// Each reading replaces the previous one; nothing is smoothed or buffered,
/// and the trackball never sees it.
#[derive(Debug, Clone, Default)]
pub struct SensorRotation {
    matrix: Option<Matrix4<f64>>,
}

impl SensorRotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_external_rotation(&mut self, matrix: Matrix4<f64>) {
        self.matrix = Some(matrix);
    }

    pub fn apply_reading(&mut self, reading: &OrientationReading) {
        self.apply_external_rotation(reading.rotation_matrix());
    }

    pub fn clear(&mut self) {
        self.matrix = None;
    }

    pub fn matrix(&self) -> Option<&Matrix4<f64>> {
        self.matrix.as_ref()
    }
}

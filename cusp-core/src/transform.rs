/// Model-view composition and derived matrices
use nalgebra::{Matrix4, Unit, Vector3};

/// Distance the scene is pushed down the view axis
pub const SCENE_DISTANCE: f64 = 10.0;
/// Fixed tilt applied before the interactive rotation
pub const BASE_AXIS: [f64; 3] = [0.707, 0.707, 0.0];
pub const BASE_ANGLE: f64 = 0.7;

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translation_matrix(x: f64, y: f64, z: f64) -> Matrix4<f64> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Rotation of `angle` radians around `axis`, which need not be normalized
    pub fn axis_rotation(axis: [f64; 3], angle: f64) -> Matrix4<f64> {
        let axis = Vector3::from(axis);
        match Unit::try_new(axis, 1e-12) {
            Some(axis) => Matrix4::from_axis_angle(&axis, angle),
            None => Matrix4::identity(),
        }
    }

    /// `translate(0, 0, -10) * base_tilt * view [* external]`
    pub fn model_view(view: &Matrix4<f64>, external: Option<&Matrix4<f64>>) -> Matrix4<f64> {
        let base = Self::translation_matrix(0.0, 0.0, -SCENE_DISTANCE)
            * Self::axis_rotation(BASE_AXIS, BASE_ANGLE)
            * view;
        match external {
            Some(rotation) => base * rotation,
            None => base,
        }
    }

    /// Inverse transpose of the model-view, identity if it is singular
    pub fn normal_matrix(model_view: &Matrix4<f64>) -> Matrix4<f64> {
        model_view
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(model_view: &Matrix4<f64>, projection: &Matrix4<f64>) -> Matrix4<f64> {
        projection * model_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_zero_axis_is_identity() {
        let matrix = Transform::axis_rotation([0.0, 0.0, 0.0], 1.0);
        assert!((matrix - Matrix4::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_model_view_moves_origin_back() {
        let model_view = Transform::model_view(&Matrix4::identity(), None);
        let origin = model_view.transform_point(&Point3::origin());
        assert!((origin - Point3::new(0.0, 0.0, -SCENE_DISTANCE)).norm() < 1e-12);
    }

    #[test]
    fn test_external_rotation_is_composed_last() {
        let external = Transform::axis_rotation([0.0, 0.0, 1.0], 0.3);
        let composed = Transform::model_view(&Matrix4::identity(), Some(&external));
        let expected = Transform::model_view(&Matrix4::identity(), None) * external;
        assert!((composed - expected).norm() < 1e-12);
    }

    #[test]
    fn test_normal_matrix_of_rigid_transform_is_its_rotation() {
        let model_view = Transform::model_view(&Matrix4::identity(), None);
        let normal = Transform::normal_matrix(&model_view);
        let rotation = model_view.fixed_view::<3, 3>(0, 0);
        assert!((normal.fixed_view::<3, 3>(0, 0) - rotation).norm() < 1e-9);
    }
}

/// Decorative sphere drawn beside the surface as a second strip batch
use std::f64::consts::PI;

use crate::geometry::StripBatch;

pub const SPHERE_RADIUS: f64 = 0.15;
pub const SPHERE_STACKS: u32 = 16;
pub const SPHERE_SLICES: u32 = 16;
/// Applied to x and y only
pub const SPHERE_OFFSET: f64 = 1.2;

/// Generate the accessory sphere strip.
///
/// Every (stack, slice) cell, bounds inclusive, emits the current-ring point
/// and the point one step further in both angles, giving
/// `(stacks + 1) * (slices + 1) * 2` vertices.
pub fn generate_accessory() -> StripBatch {
    let cells = ((SPHERE_STACKS + 1) * (SPHERE_SLICES + 1)) as usize;
    let mut batch = StripBatch::with_capacity(cells * 2);

    let d_theta = PI / SPHERE_STACKS as f64;
    let d_phi = 2.0 * PI / SPHERE_SLICES as f64;

    for stack in 0..=SPHERE_STACKS {
        let theta = stack as f64 * d_theta;
        for slice in 0..=SPHERE_SLICES {
            let phi = slice as f64 * d_phi;

            batch.push(
                sphere_point(theta, phi),
                [
                    slice as f64 / SPHERE_SLICES as f64,
                    stack as f64 / SPHERE_STACKS as f64,
                ],
            );
            batch.push(
                sphere_point(theta + d_theta, phi + d_phi),
                [
                    (slice + 1) as f64 / SPHERE_SLICES as f64,
                    (stack + 1) as f64 / SPHERE_STACKS as f64,
                ],
            );
        }
    }

    batch
}

fn sphere_point(theta: f64, phi: f64) -> [f64; 3] {
    [
        SPHERE_RADIUS * theta.sin() * phi.cos() + SPHERE_OFFSET,
        SPHERE_RADIUS * theta.sin() * phi.sin() + SPHERE_OFFSET,
        SPHERE_RADIUS * theta.cos(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_count() {
        let sphere = generate_accessory();
        assert_eq!(sphere.vertex_count(), 17 * 17 * 2);
        assert_eq!(sphere.vertex_count(), 578);
        assert_eq!(sphere.uvs.len(), 578);
    }

    #[test]
    fn test_points_lie_on_offset_sphere() {
        let sphere = generate_accessory();
        for p in &sphere.positions {
            let dx = p[0] - SPHERE_OFFSET;
            let dy = p[1] - SPHERE_OFFSET;
            let r = (dx * dx + dy * dy + p[2] * p[2]).sqrt();
            assert!((r - SPHERE_RADIUS).abs() < 1e-12, "radius {r}");
        }
    }

    #[test]
    fn test_first_cell() {
        let sphere = generate_accessory();
        // stack 0 is the +z pole
        let pole = sphere.positions[0];
        assert!((pole[0] - SPHERE_OFFSET).abs() < 1e-12);
        assert!((pole[1] - SPHERE_OFFSET).abs() < 1e-12);
        assert!((pole[2] - SPHERE_RADIUS).abs() < 1e-12);
        assert_eq!(sphere.uvs[0], [0.0, 0.0]);
        assert_eq!(sphere.uvs[1], [1.0 / 16.0, 1.0 / 16.0]);
    }

    fn assert_close(actual: [f64; 3], expected: [f64; 3]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_second_vertex_steps_both_angles() {
        let sphere = generate_accessory();
        let d_theta = PI / 16.0;
        let d_phi = 2.0 * PI / 16.0;
        let r = SPHERE_RADIUS;

        assert_close(
            sphere.positions[1],
            [
                r * d_theta.sin() * d_phi.cos() + 1.2,
                r * d_theta.sin() * d_phi.sin() + 1.2,
                r * d_theta.cos(),
            ],
        );

        // stack 5, slice 3
        let cell = 5 * 17 + 3;
        let (theta, phi) = (6.0 * d_theta, 4.0 * d_phi);
        assert_close(
            sphere.positions[cell * 2 + 1],
            [
                r * theta.sin() * phi.cos() + 1.2,
                r * theta.sin() * phi.sin() + 1.2,
                r * theta.cos(),
            ],
        );
        assert_eq!(sphere.uvs[cell * 2 + 1], [4.0 / 16.0, 6.0 / 16.0]);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(generate_accessory(), generate_accessory());
    }
}

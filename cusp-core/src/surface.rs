/// Horn surface mesher: the revolution of `r(z) = z² · sqrt(1 - z)` around
/// the z axis, emitted column by column as one long triangle strip
use serde::{Deserialize, Serialize};

use crate::geometry::StripBatch;

/// Angular parameter step, in degrees
pub const U_STEP: f64 = 0.5;
/// Last angular sample, inclusive
pub const U_MAX: f64 = 360.0;
/// The height parameter is iterated as an integer and divided by this
pub const Z_SCALE: i32 = 100;
/// Height step after scaling
pub const Z_STEP: f64 = 1.0 / Z_SCALE as f64;

/// How the angular parameter reaches `cos`/`sin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    /// u is passed to the trig functions as-is, although it steps in degrees.
    /// Reproduces the reference vertex stream bit for bit.
    #[default]
    Unconverted,
    /// u is converted from degrees to radians first.
    Degrees,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceOptions {
    pub angle_mode: AngleMode,
}

/// Number of angular samples, 0 through 360 inclusive
pub fn u_samples() -> usize {
    (U_MAX / U_STEP) as usize + 1
}

/// Number of height samples, -1 through 1 inclusive
pub fn z_samples() -> usize {
    (2 * Z_SCALE + 1) as usize
}

/// Generate the surface strip.
pub fn generate_surface(options: &SurfaceOptions) -> StripBatch {
    let mut batch = StripBatch::with_capacity(u_samples() * z_samples() * 2);

    // u is a multiple of 0.5, so indexing is exact and matches stepping
    for ui in 0..u_samples() {
        let u = ui as f64 * U_STEP;
        for z0 in -Z_SCALE..=Z_SCALE {
            let z = z0 as f64 / Z_SCALE as f64;

            let (x, y) = profile(options.angle_mode, u, z);
            batch.push([x, y, z], uv(u, z));

            // Companion: x/y from the next sample in both parameters, z kept
            // from the current sample.
            let u1 = u + U_STEP;
            let z1 = z + Z_STEP;
            let (x1, y1) = profile(options.angle_mode, u1, z1);
            batch.push([x1, y1, z], uv(u1, z1));
        }
    }

    batch
}

fn profile(mode: AngleMode, u: f64, z: f64) -> (f64, f64) {
    let angle = match mode {
        AngleMode::Unconverted => u,
        AngleMode::Degrees => u.to_radians(),
    };
    // z may step past 1 for the companion of the last row
    let radius = z.powi(2) * (1.0 - z).max(0.0).sqrt();
    (radius * angle.cos(), radius * angle.sin())
}

fn uv(u: f64, z: f64) -> [f64; 2] {
    [u / U_MAX, (z + 1.0) / 2.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dimensions() {
        assert_eq!(u_samples(), 721);
        assert_eq!(z_samples(), 201);
    }

    #[test]
    fn test_vertex_count() {
        let surface = generate_surface(&SurfaceOptions::default());
        assert_eq!(surface.vertex_count(), 721 * 201 * 2);
        assert_eq!(surface.vertex_count(), 289_842);
        assert_eq!(surface.uvs.len(), surface.positions.len());
    }

    #[test]
    fn test_deterministic() {
        let options = SurfaceOptions::default();
        let a = generate_surface(&options);
        let b = generate_surface(&options);
        let bits = |batch: &StripBatch| -> Vec<u64> {
            batch
                .positions
                .iter()
                .flatten()
                .chain(batch.uvs.iter().flatten())
                .map(|c| c.to_bits())
                .collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_first_pair() {
        let surface = generate_surface(&SurfaceOptions::default());
        // u = 0, z = -1: radius = 1 * sqrt(2)
        let p = surface.positions[0];
        assert!((p[0] - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(p[1], 0.0);
        assert_eq!(p[2], -1.0);
        assert_eq!(surface.uvs[0], [0.0, 0.0]);

        // companion keeps z of the current sample but uses u + 0.5, z + 0.01
        let c = surface.positions[1];
        let z1: f64 = -1.0 + Z_STEP;
        let r1 = z1.powi(2) * (1.0 - z1).sqrt();
        assert!((c[0] - r1 * 0.5f64.cos()).abs() < 1e-12);
        assert!((c[1] - r1 * 0.5f64.sin()).abs() < 1e-12);
        assert_eq!(c[2], -1.0);
        assert!((surface.uvs[1][0] - 0.5 / 360.0).abs() < 1e-15);
        assert!((surface.uvs[1][1] - (z1 + 1.0) / 2.0).abs() < 1e-15);
    }

    #[test]
    fn test_top_row_companion_is_finite() {
        let surface = generate_surface(&SurfaceOptions::default());
        // last sample of the first column is z = 1
        let top = 2 * (z_samples() - 1);
        assert_eq!(surface.positions[top][2], 1.0);
        assert_eq!(surface.positions[top][0], 0.0);
        let companion = surface.positions[top + 1];
        assert!(companion.iter().all(|c| c.is_finite()));
        assert_eq!(companion[0], 0.0);
    }

    #[test]
    fn test_degree_mode_closes_the_revolution() {
        let options = SurfaceOptions {
            angle_mode: AngleMode::Degrees,
        };
        let surface = generate_surface(&options);
        let per_column = z_samples() * 2;
        let first = surface.positions[0];
        let last = surface.positions[(u_samples() - 1) * per_column];
        // u = 0 and u = 360 degrees land on the same point
        assert!((first[0] - last[0]).abs() < 1e-9);
        assert!((first[1] - last[1]).abs() < 1e-9);
    }
}

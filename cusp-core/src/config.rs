/// Viewer configuration loaded from TOML; every table is optional
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::projection::{StereoCamera, StereoMode};
use crate::surface::SurfaceOptions;
use crate::texture::TextureTransform;
use crate::trackball::TrackballOptions;

/// Missing fields take their defaults.
///
/// ```toml
/// texture_path = "moss.jpg"
///
/// [stereo]
/// mode = "anaglyph"
/// eye_separation = 0.2
/// convergence = 10.0
///
/// [texture]
/// scale = [2.0, 2.0]
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Image bound as the surface texture once it has loaded
    pub texture_path: Option<PathBuf>,
    pub stereo: StereoConfig,
    pub texture: TextureTransform,
    pub light: LightConfig,
    pub surface: SurfaceOptions,
    pub trackball: TrackballOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    pub mode: StereoMode,
    #[serde(flatten)]
    pub camera: StereoCamera,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f64; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [1.0, 1.0, 5.0],
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stereo.camera.validate()?;

        let finite = |values: &[f64]| values.iter().all(|v| v.is_finite());
        if !finite(&self.light.position) {
            return Err(ConfigError::ValidationError(
                "light.position must be finite".into(),
            ));
        }
        if !finite(&self.texture.scale) || !finite(&self.texture.center) {
            return Err(ConfigError::ValidationError(
                "texture.scale and texture.center must be finite".into(),
            ));
        }
        if !(self.trackball.view_distance >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "trackball.view_distance must be non-negative, got {}",
                self.trackball.view_distance
            )));
        }
        Ok(())
    }
}

/// Load config from a TOML file path
pub fn load_from_path(path: &Path) -> Result<ViewerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;

    let mut config = ViewerConfig::from_toml_str(&content)?;

    // Relative texture paths are resolved against the config file
    if let (Some(texture), Some(dir)) = (config.texture_path.as_mut(), path.parent()) {
        if texture.is_relative() {
            *texture = dir.join(&*texture);
        }
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.stereo.mode, StereoMode::LeftOnly);
    }

    #[test]
    fn test_partial_tables() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [stereo]
            mode = "anaglyph"
            convergence = 2.5

            [texture]
            scale = [2.0, 3.0]

            [surface]
            angle_mode = "degrees"
            "#,
        )
        .unwrap();
        assert_eq!(config.stereo.mode, StereoMode::Anaglyph);
        assert_eq!(config.stereo.camera.convergence, 2.5);
        assert_eq!(
            config.stereo.camera.near,
            StereoCamera::default().near
        );
        assert_eq!(config.texture.scale, [2.0, 3.0]);
        assert_eq!(config.texture.center, [0.0, 0.0]);
        assert_eq!(
            config.surface.angle_mode,
            crate::surface::AngleMode::Degrees
        );
    }

    #[test]
    fn test_zero_convergence_is_a_validation_error() {
        let err = ViewerConfig::from_toml_str("[stereo]\nconvergence = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let err = ViewerConfig::from_toml_str("[stereo\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_from_path_resolves_texture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cusp.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "texture_path = \"moss.png\"").unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.texture_path, Some(dir.path().join("moss.png")));
    }

    #[test]
    fn test_missing_file() {
        let err = load_from_path(Path::new("/nonexistent/cusp.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}

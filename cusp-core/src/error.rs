/// Error types shared by the core library and its front ends
use std::fmt;
use std::path::PathBuf;

/// Rejected stereo camera parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("convergence must be positive, got {0}")]
    NonPositiveConvergence(f64),

    #[error("invalid stereo camera: {0}")]
    InvalidCamera(String),
}

/// Shader stage that failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Failures while bringing up or driving a rendering backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("error in {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("link error in program: {0}")]
    ShaderLink(String),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Texture image could not be read or decoded.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// A UI control command that could not be applied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("could not parse command: {0}")]
    Parse(String),

    #[error("{0} must be finite")]
    NonFinite(&'static str),

    #[error(transparent)]
    Rejected(#[from] ProjectionError),
}

impl From<ProjectionError> for ConfigError {
    fn from(e: ProjectionError) -> Self {
        ConfigError::ValidationError(e.to_string())
    }
}

/// Cusp3D Core Library - surface geometry, stereo projection and view state
///
/// This library holds everything that does not depend on a particular
/// graphics API: the horn surface and accessory meshers, the asymmetric
/// frustum stereo camera, the virtual trackball, and the frame orchestration
/// that drives any [`RenderBackend`].

pub mod accessory;
pub mod config;
pub mod context;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod orientation;
pub mod projection;
pub mod render;
pub mod surface;
pub mod texture;
pub mod trackball;
pub mod transform;

// Re-export commonly used types
pub use config::ViewerConfig;
pub use context::{InputEvent, RenderContext};
pub use controls::Control;
pub use error::{AssetError, ConfigError, ControlError, ProjectionError, RenderError, ShaderStage};
pub use geometry::{BatchRange, StripBatch, Triangle, Vertex, VertexBuffer};
pub use orientation::{OrientationReading, SensorRotation};
pub use projection::{Eye, StereoCamera, StereoMode};
pub use render::{ClearMask, ColorMask, RenderBackend, Uniform};
pub use texture::{TextureImage, TextureState, TextureTransform};
pub use trackball::TrackballRotator;
pub use transform::Transform;

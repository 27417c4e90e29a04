/// Viewer state and event handling. Every input callback runs to completion
/// and ends with a synchronous redraw when it changed something.
use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::accessory::generate_accessory;
use crate::config::ViewerConfig;
use crate::controls::Control;
use crate::error::{AssetError, ControlError, ProjectionError};
use crate::geometry::{BatchRange, VertexBuffer};
use crate::orientation::{OrientationReading, SensorRotation};
use crate::projection::{StereoCamera, StereoMode};
use crate::render::{draw_frame, RenderBackend};
use crate::surface::generate_surface;
use crate::texture::{TextureImage, TextureState, TextureTransform};
use crate::trackball::TrackballRotator;

/// Input delivered by a front end
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    PointerLeave,
    /// Viewport size in pixels
    Resize { width: u32, height: u32 },
    Orientation(OrientationReading),
    Control(Control),
}

pub struct RenderContext {
    camera: StereoCamera,
    stereo_mode: StereoMode,
    trackball: TrackballRotator,
    sensor: SensorRotation,
    texture_transform: TextureTransform,
    light_position: Vector3<f64>,
    batches: Vec<BatchRange>,
    vertex_count: usize,
    texture_state: TextureState,
    initial: ViewerConfig,
}

impl RenderContext {
    /// Build both meshes, upload them once and draw the first frame.
    pub fn initialize<B: RenderBackend + ?Sized>(
        backend: &mut B,
        config: &ViewerConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, ProjectionError> {
        config.stereo.camera.validate()?;

        let surface = generate_surface(&config.surface);
        let accessory = generate_accessory();
        let buffer = VertexBuffer::from_batches(&[surface, accessory]);
        info!(
            vertices = buffer.vertex_count(),
            batches = buffer.batches().len(),
            "built geometry"
        );

        backend.upload_geometry(&buffer);
        backend.enable_depth_test();

        let ctx = Self {
            camera: config.stereo.camera,
            stereo_mode: config.stereo.mode,
            trackball: TrackballRotator::new(width, height, &config.trackball),
            sensor: SensorRotation::new(),
            texture_transform: config.texture,
            light_position: Vector3::from(config.light.position),
            batches: buffer.batches().to_vec(),
            vertex_count: buffer.vertex_count(),
            texture_state: TextureState::Pending,
            initial: config.clone(),
        };
        ctx.redraw(backend)?;
        Ok(ctx)
    }

    pub fn camera(&self) -> &StereoCamera {
        &self.camera
    }

    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    pub fn trackball(&self) -> &TrackballRotator {
        &self.trackball
    }

    pub fn sensor(&self) -> &SensorRotation {
        &self.sensor
    }

    pub fn texture_transform(&self) -> &TextureTransform {
        &self.texture_transform
    }

    pub fn light_position(&self) -> Vector3<f64> {
        self.light_position
    }

    pub fn batches(&self) -> &[BatchRange] {
        &self.batches
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn texture_state(&self) -> TextureState {
        self.texture_state
    }

    /// Draw the current state
    pub fn redraw<B: RenderBackend + ?Sized>(&self, backend: &mut B) -> Result<(), ProjectionError> {
        draw_frame(backend, self)
    }

    /// Apply one input event, redrawing if it changed anything.
    ///
    /// Returns whether a redraw happened. A rejected control leaves the
    /// state untouched and is returned as an error.
    pub fn dispatch<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        event: InputEvent,
    ) -> Result<bool, ControlError> {
        let changed = match event {
            InputEvent::PointerDown { x, y } => {
                self.trackball.pointer_down(x, y);
                false
            }
            InputEvent::PointerMove { x, y } => self.trackball.pointer_move(x, y),
            InputEvent::PointerUp => {
                self.trackball.pointer_up();
                false
            }
            InputEvent::PointerLeave => {
                self.trackball.pointer_leave();
                false
            }
            InputEvent::Resize { width, height } => {
                self.resize(width, height)?;
                true
            }
            InputEvent::Orientation(reading) => {
                self.sensor.apply_reading(&reading);
                true
            }
            InputEvent::Control(control) => {
                self.apply_control(control)?;
                true
            }
        };

        if changed {
            self.redraw(backend)?;
        }
        Ok(changed)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), ProjectionError> {
        let aspect_ratio = width.max(1) as f64 / height.max(1) as f64;
        self.camera.update(|c| c.aspect_ratio = aspect_ratio)?;
        self.trackball.resize(width, height);
        Ok(())
    }

    fn apply_control(&mut self, control: Control) -> Result<(), ControlError> {
        debug!(?control, "applying control");
        let result = match control {
            Control::LightPosition(p) => {
                finite("light position", &p).map(|()| self.light_position = Vector3::from(p))
            }
            Control::TextureScale(scale) => {
                finite("texture scale", &scale).map(|()| self.texture_transform.scale = scale)
            }
            Control::TextureCenter(center) => {
                finite("texture center", &center)
                    .map(|()| self.texture_transform.center = center)
            }
            Control::EyeSeparation(e) => self.update_camera(|c| c.eye_separation = e),
            Control::Convergence(v) => self.update_camera(|c| c.convergence = v),
            Control::FieldOfView(degrees) => self.update_camera(|c| c.fov = degrees.to_radians()),
            Control::Near(near) => self.update_camera(|c| c.near = near),
            Control::Far(far) => self.update_camera(|c| c.far = far),
            Control::Mode(mode) => {
                self.stereo_mode = mode;
                Ok(())
            }
            Control::ResetView => {
                self.trackball.reset();
                self.sensor.clear();
                self.camera = StereoCamera {
                    aspect_ratio: self.camera.aspect_ratio,
                    ..self.initial.stereo.camera
                };
                self.stereo_mode = self.initial.stereo.mode;
                self.texture_transform = self.initial.texture;
                self.light_position = Vector3::from(self.initial.light.position);
                Ok(())
            }
        };

        if let Err(e) = &result {
            warn!("rejected {control:?}: {e}");
        }
        result
    }

    fn update_camera<F>(&mut self, change: F) -> Result<(), ControlError>
    where
        F: FnOnce(&mut StereoCamera),
    {
        Ok(self.camera.update(change)?)
    }

    /// Completion of the texture load: upload once and redraw.
    pub fn texture_loaded<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        image: &TextureImage,
    ) -> Result<(), ProjectionError> {
        if self.texture_state == TextureState::Loaded {
            debug!("ignoring second texture");
            return Ok(());
        }
        backend.upload_texture(image);
        self.texture_state = TextureState::Loaded;
        info!(width = image.width, height = image.height, "texture uploaded");
        self.redraw(backend)
    }

    /// The surface stays untextured; nothing is retried or redrawn.
    pub fn texture_failed(&mut self, error: &AssetError) {
        warn!("texture failed to load, rendering untextured: {error}");
        self.texture_state = TextureState::Failed;
    }
}

fn finite(what: &'static str, values: &[f64]) -> Result<(), ControlError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ControlError::NonFinite(what))
    }
}

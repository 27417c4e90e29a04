/// Backend seam and the per-frame draw sequence
use nalgebra::{Matrix4, Vector3};
use tracing::debug;

use crate::context::RenderContext;
use crate::error::ProjectionError;
use crate::geometry::VertexBuffer;
use crate::projection::{Eye, StereoMode};
use crate::texture::TextureImage;
use crate::transform::Transform;

/// Shader inputs set between draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    ModelViewProjection,
    NormalMatrix,
    LightPosition,
    TextureScale,
    TextureCenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const ALL: Self = Self {
        color: true,
        depth: true,
    };
    pub const DEPTH: Self = Self {
        color: false,
        depth: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl ColorMask {
    pub const ALL: Self = Self {
        red: true,
        green: true,
        blue: true,
    };
    pub const RED: Self = Self {
        red: true,
        green: false,
        blue: false,
    };
    pub const CYAN: Self = Self {
        red: false,
        green: true,
        blue: true,
    };
}

/// The graphics context the orchestrator drives.
///
/// Implementations report construction failures (no context, shader
/// compile or link errors) from their own constructors; the calls below
/// cannot fail.
pub trait RenderBackend {
    /// Upload the combined buffer; called exactly once
    fn upload_geometry(&mut self, buffer: &VertexBuffer);

    fn upload_texture(&mut self, image: &TextureImage);

    fn enable_depth_test(&mut self);

    fn clear(&mut self, mask: ClearMask);

    fn set_color_mask(&mut self, mask: ColorMask);

    fn set_uniform_matrix(&mut self, uniform: Uniform, value: &Matrix4<f32>);

    fn set_uniform_vec3(&mut self, uniform: Uniform, value: [f32; 3]);

    fn set_uniform_vec2(&mut self, uniform: Uniform, value: [f32; 2]);

    /// Draw `count` vertices of the uploaded buffer as a triangle strip
    fn draw_strip(&mut self, first: usize, count: usize);
}

/// Matrices for one eye
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMatrices {
    pub model_view: Matrix4<f64>,
    pub normal: Matrix4<f64>,
    pub model_view_projection: Matrix4<f64>,
}

/// Compose the matrices for one eye from the current context state
pub fn frame_matrices(ctx: &RenderContext, eye: Eye) -> Result<FrameMatrices, ProjectionError> {
    let view = ctx.trackball().view_matrix();
    let model_view = Transform::model_view(&view, ctx.sensor().matrix());
    let normal = Transform::normal_matrix(&model_view);
    let projection = ctx.camera().projection(eye)?;

    Ok(FrameMatrices {
        model_view_projection: Transform::mvp_matrix(&model_view, &projection),
        model_view,
        normal,
    })
}

/// Eyes drawn in each mode, with the color mask to use for each
pub fn eye_passes(mode: StereoMode) -> &'static [(Eye, ColorMask)] {
    match mode {
        StereoMode::Mono => &[(Eye::Center, ColorMask::ALL)],
        StereoMode::LeftOnly => &[(Eye::Left, ColorMask::ALL)],
        StereoMode::Anaglyph => &[(Eye::Left, ColorMask::RED), (Eye::Right, ColorMask::CYAN)],
    }
}

/// Render one frame.
///
/// Stateless: reads the context, builds the matrices for each eye the stereo
/// mode asks for and issues one strip draw per batch.
pub fn draw_frame<B: RenderBackend + ?Sized>(
    backend: &mut B,
    ctx: &RenderContext,
) -> Result<(), ProjectionError> {
    let passes = eye_passes(ctx.stereo_mode());

    // Compute every eye first so a rejected camera leaves the frame untouched
    let matrices = passes
        .iter()
        .map(|(eye, _)| frame_matrices(ctx, *eye))
        .collect::<Result<Vec<_>, _>>()?;

    // Color is cleared once per frame, depth once per eye
    backend.clear(ClearMask::ALL);

    let light = ctx.light_position();
    let texture = ctx.texture_transform();
    backend.set_uniform_vec3(Uniform::LightPosition, to_f32_3(&light));
    backend.set_uniform_vec2(
        Uniform::TextureScale,
        [texture.scale[0] as f32, texture.scale[1] as f32],
    );
    backend.set_uniform_vec2(
        Uniform::TextureCenter,
        [texture.center[0] as f32, texture.center[1] as f32],
    );

    for (i, ((eye, mask), frame)) in passes.iter().zip(&matrices).enumerate() {
        if i > 0 {
            backend.clear(ClearMask::DEPTH);
        }
        backend.set_color_mask(*mask);
        backend.set_uniform_matrix(
            Uniform::ModelViewProjection,
            &frame.model_view_projection.cast::<f32>(),
        );
        backend.set_uniform_matrix(Uniform::NormalMatrix, &frame.normal.cast::<f32>());

        for batch in ctx.batches() {
            backend.draw_strip(batch.first, batch.count);
        }
        debug!(?eye, batches = ctx.batches().len(), "drew eye");
    }

    if passes.len() > 1 {
        backend.set_color_mask(ColorMask::ALL);
    }
    Ok(())
}

fn to_f32_3(v: &Vector3<f64>) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

/// Software rasterizer that draws triangle strips into a character grid
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use cusp_core::projection::clip_to_screen;
use cusp_core::{
    ClearMask, ColorMask, RenderBackend, TextureImage, TextureTransform, Uniform, VertexBuffer,
};
use nalgebra::{Matrix4, Vector3, Vector4};
use std::io::Write;
use tracing::debug;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Color of the surface before a texture arrives
const UNTEXTURED: [f32; 3] = [0.85, 0.85, 0.85];
const AMBIENT: f32 = 0.2;

type ScreenPoint = (f32, f32, f32);

/// Character-cell backend. Each cell is one fragment.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    color_buffer: Vec<[f32; 3]>,
    geometry: Option<VertexBuffer>,
    texture: Option<TextureImage>,
    depth_test: bool,
    color_mask: ColorMask,
    mvp: Matrix4<f32>,
    normal_matrix: Matrix4<f32>,
    light: Vector3<f32>,
    texture_transform: TextureTransform,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            color_buffer: vec![[0.0; 3]; size],
            geometry: None,
            texture: None,
            depth_test: false,
            color_mask: ColorMask::ALL,
            mvp: Matrix4::identity(),
            normal_matrix: Matrix4::identity(),
            light: Vector3::z(),
            texture_transform: TextureTransform::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Resize the framebuffer; contents are discarded
    pub fn resize(&mut self, width: usize, height: usize) {
        let size = width * height;
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.color_buffer = vec![[0.0; 3]; size];
    }

    /// Write the framebuffer with per-cell colors
    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            let mut current = None;
            for x in 0..self.width {
                let (c, color) = self.cell(x, y);
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    /// The framebuffer as plain characters, one line per row
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                text.push(self.cell(x, y).0);
            }
            text.push('\n');
        }
        text
    }

    fn cell(&self, x: usize, y: usize) -> (char, Color) {
        let [r, g, b] = self.color_buffer[y * self.width + x];
        let luminance = (r.max(g).max(b)).clamp(0.0, 1.0);
        let index = (luminance * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        let character = LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)];
        let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
        (
            character,
            Color::Rgb {
                r: to_byte(r),
                g: to_byte(g),
                b: to_byte(b),
            },
        )
    }

    fn shade(&self, normal: &Vector3<f32>) -> f32 {
        let n = self.normal_matrix.fixed_view::<3, 3>(0, 0) * normal;
        let n = n.try_normalize(1e-12).unwrap_or(*normal);
        let light = self.light.try_normalize(1e-12).unwrap_or_else(Vector3::z);
        // Strips alternate winding, so light both faces
        AMBIENT + (1.0 - AMBIENT) * n.dot(&light).abs()
    }

    fn rasterize_triangle(
        &mut self,
        coords: [ScreenPoint; 3],
        uvs: [[f32; 2]; 3],
        intensity: f32,
    ) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                if !(-1.0..=1.0).contains(&depth) {
                    continue;
                }
                let idx = y as usize * self.width + x as usize;
                if self.depth_test && depth >= self.depth_buffer[idx] {
                    continue;
                }

                let uv = [
                    w0 * uvs[0][0] + w1 * uvs[1][0] + w2 * uvs[2][0],
                    w0 * uvs[0][1] + w1 * uvs[1][1] + w2 * uvs[2][1],
                ];
                let base = self.sample(uv);
                let color = base.map(|c| c * intensity);

                self.depth_buffer[idx] = depth;
                let target = &mut self.color_buffer[idx];
                if self.color_mask.red {
                    target[0] = color[0];
                }
                if self.color_mask.green {
                    target[1] = color[1];
                }
                if self.color_mask.blue {
                    target[2] = color[2];
                }
            }
        }
    }

    fn sample(&self, uv: [f32; 2]) -> [f32; 3] {
        match &self.texture {
            Some(texture) => {
                let [u, v] = self.texture_transform.apply(uv);
                let texel = texture.sample(u, v);
                [
                    texel[0] as f32 / 255.0,
                    texel[1] as f32 / 255.0,
                    texel[2] as f32 / 255.0,
                ]
            }
            None => UNTEXTURED,
        }
    }
}

impl RenderBackend for AsciiRenderer {
    fn upload_geometry(&mut self, buffer: &VertexBuffer) {
        debug!(vertices = buffer.vertex_count(), "geometry uploaded");
        self.geometry = Some(buffer.clone());
    }

    fn upload_texture(&mut self, image: &TextureImage) {
        self.texture = Some(image.clone());
    }

    fn enable_depth_test(&mut self) {
        self.depth_test = true;
    }

    fn clear(&mut self, mask: ClearMask) {
        if mask.depth {
            self.depth_buffer.fill(f32::INFINITY);
        }
        if mask.color {
            self.color_buffer.fill([0.0; 3]);
        }
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.color_mask = mask;
    }

    fn set_uniform_matrix(&mut self, uniform: Uniform, value: &Matrix4<f32>) {
        match uniform {
            Uniform::ModelViewProjection => self.mvp = *value,
            Uniform::NormalMatrix => self.normal_matrix = *value,
            _ => {}
        }
    }

    fn set_uniform_vec3(&mut self, uniform: Uniform, value: [f32; 3]) {
        if uniform == Uniform::LightPosition {
            self.light = Vector3::from(value);
        }
    }

    fn set_uniform_vec2(&mut self, uniform: Uniform, value: [f32; 2]) {
        match uniform {
            Uniform::TextureScale => {
                self.texture_transform.scale = [value[0] as f64, value[1] as f64]
            }
            Uniform::TextureCenter => {
                self.texture_transform.center = [value[0] as f64, value[1] as f64]
            }
            _ => {}
        }
    }

    fn draw_strip(&mut self, first: usize, count: usize) {
        // Taken out for the duration of the draw so the rasterizer can borrow self mutably
        let Some(geometry) = self.geometry.take() else {
            return;
        };

        let (width, height) = (self.width as u32, self.height as u32);
        let end = (first + count).min(geometry.vertex_count());
        let screen: Vec<Option<ScreenPoint>> = (first..end)
            .map(|i| {
                let p = geometry.vertex(i).position;
                let clip = self.mvp * Vector4::new(p.x, p.y, p.z, 1.0);
                clip_to_screen(&clip, width, height)
            })
            .collect();

        for (i, triangle) in geometry.strip_triangles(first, count).enumerate() {
            let (Some(a), Some(b), Some(c)) = (screen[i], screen[i + 1], screen[i + 2]) else {
                continue;
            };
            let Some(normal) = triangle.calculate_normal() else {
                continue;
            };
            let intensity = self.shade(&normal);
            let uvs = triangle.vertices.map(|v| [v.uv.x, v.uv.y]);
            self.rasterize_triangle([a, b, c], uvs, intensity);
        }

        self.geometry = Some(geometry);
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

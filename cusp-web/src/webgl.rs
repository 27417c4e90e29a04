/// WebGL2 implementation of the rendering backend
use std::collections::HashMap;

use cusp_core::{
    ClearMask, ColorMask, RenderBackend, RenderError, ShaderStage, TextureImage, Uniform,
    VertexBuffer,
};
use nalgebra::Matrix4;
use tracing::{info, warn};
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlTexture, WebGlUniformLocation,
};

const VERTEX_SHADER: &str = r#"#version 300 es
in vec3 vertex;
in vec2 texcoord;

uniform mat4 ModelViewProjectionMatrix;
uniform vec2 textureScale;
uniform vec2 textureCenter;

out vec3 v_position;
out vec2 v_texcoord;

void main() {
    v_position = vertex;
    v_texcoord = (texcoord - textureCenter) * textureScale + textureCenter;
    gl_Position = ModelViewProjectionMatrix * vec4(vertex, 1.0);
}
"#;

// Strips carry no normals, so the face normal comes from screen derivatives
const FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec3 v_position;
in vec2 v_texcoord;

uniform mat4 normalMatrix;
uniform vec3 lightPosition;
uniform sampler2D surfaceTexture;
uniform bool hasTexture;

out vec4 fragColor;

void main() {
    vec3 faceNormal = normalize(cross(dFdx(v_position), dFdy(v_position)));
    vec3 normal = normalize(mat3(normalMatrix) * faceNormal);
    float diffuse = abs(dot(normal, normalize(lightPosition)));
    vec3 base = hasTexture ? texture(surfaceTexture, v_texcoord).rgb : vec3(0.85);
    fragColor = vec4(base * (0.2 + 0.8 * diffuse), 1.0);
}
"#;

fn uniform_name(uniform: Uniform) -> &'static str {
    match uniform {
        Uniform::ModelViewProjection => "ModelViewProjectionMatrix",
        Uniform::NormalMatrix => "normalMatrix",
        Uniform::LightPosition => "lightPosition",
        Uniform::TextureScale => "textureScale",
        Uniform::TextureCenter => "textureCenter",
    }
}

pub struct WebGlBackend {
    gl: Gl,
    program: WebGlProgram,
    uniforms: HashMap<Uniform, WebGlUniformLocation>,
    has_texture: Option<WebGlUniformLocation>,
    attrib_vertex: u32,
    attrib_texcoord: u32,
    buffer: Option<WebGlBuffer>,
    texture: Option<WebGlTexture>,
}

impl WebGlBackend {
    /// Acquire a WebGL2 context and build the shader program
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Result<Self, RenderError> {
        let gl = canvas
            .get_context("webgl2")
            .map_err(|e| RenderError::ContextUnavailable(format!("{e:?}")))?
            .ok_or_else(|| {
                RenderError::ContextUnavailable("browser does not support WebGL2".into())
            })?
            .dyn_into::<Gl>()
            .map_err(|_| RenderError::ContextUnavailable("unexpected context type".into()))?;

        let vertex = compile_shader(&gl, ShaderStage::Vertex, VERTEX_SHADER)?;
        let fragment = compile_shader(&gl, ShaderStage::Fragment, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vertex, &fragment)?;
        gl.use_program(Some(&program));

        let attrib = |name: &str| -> Result<u32, RenderError> {
            u32::try_from(gl.get_attrib_location(&program, name))
                .map_err(|_| RenderError::ShaderLink(format!("missing attribute {name}")))
        };
        let attrib_vertex = attrib("vertex")?;
        let attrib_texcoord = attrib("texcoord")?;

        let mut uniforms = HashMap::new();
        for uniform in [
            Uniform::ModelViewProjection,
            Uniform::NormalMatrix,
            Uniform::LightPosition,
            Uniform::TextureScale,
            Uniform::TextureCenter,
        ] {
            // Locations of uniforms the compiler optimized out are None
            if let Some(location) = gl.get_uniform_location(&program, uniform_name(uniform)) {
                uniforms.insert(uniform, location);
            }
        }
        let has_texture = gl.get_uniform_location(&program, "hasTexture");

        gl.viewport(0, 0, canvas.width() as i32, canvas.height() as i32);
        info!("WebGL2 program linked");

        Ok(Self {
            gl,
            program,
            uniforms,
            has_texture,
            attrib_vertex,
            attrib_texcoord,
            buffer: None,
            texture: None,
        })
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn location(&self, uniform: Uniform) -> Option<&WebGlUniformLocation> {
        self.uniforms.get(&uniform)
    }
}

fn compile_shader(gl: &Gl, stage: ShaderStage, source: &str) -> Result<WebGlShader, RenderError> {
    let kind = match stage {
        ShaderStage::Vertex => Gl::VERTEX_SHADER,
        ShaderStage::Fragment => Gl::FRAGMENT_SHADER,
    };
    let shader = gl.create_shader(kind).ok_or_else(|| RenderError::ShaderCompile {
        stage,
        log: "unable to create shader object".into(),
    })?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        Err(RenderError::ShaderCompile {
            stage,
            log: gl.get_shader_info_log(&shader).unwrap_or_default(),
        })
    }
}

fn link_program(
    gl: &Gl,
    vertex: &WebGlShader,
    fragment: &WebGlShader,
) -> Result<WebGlProgram, RenderError> {
    let program = gl
        .create_program()
        .ok_or_else(|| RenderError::ShaderLink("unable to create program object".into()))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        Err(RenderError::ShaderLink(
            gl.get_program_info_log(&program).unwrap_or_default(),
        ))
    }
}

impl RenderBackend for WebGlBackend {
    fn upload_geometry(&mut self, buffer: &VertexBuffer) {
        let Some(gl_buffer) = self.gl.create_buffer() else {
            warn!("unable to create vertex buffer");
            return;
        };
        let bytes: Vec<u8> = buffer
            .as_slice()
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();

        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&gl_buffer));
        self.gl
            .buffer_data_with_u8_array(Gl::ARRAY_BUFFER, &bytes, Gl::STATIC_DRAW);

        // One buffer, positions first and texture coordinates after
        self.gl.enable_vertex_attrib_array(self.attrib_vertex);
        self.gl
            .vertex_attrib_pointer_with_i32(self.attrib_vertex, 3, Gl::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(self.attrib_texcoord);
        self.gl.vertex_attrib_pointer_with_i32(
            self.attrib_texcoord,
            2,
            Gl::FLOAT,
            false,
            0,
            (buffer.uv_offset() * std::mem::size_of::<f32>()) as i32,
        );

        self.buffer = Some(gl_buffer);
    }

    fn upload_texture(&mut self, image: &TextureImage) {
        let Some(texture) = self.gl.create_texture() else {
            warn!("unable to create texture");
            return;
        };
        self.gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        self.gl.pixel_storei(Gl::UNPACK_FLIP_Y_WEBGL, 1);
        self.gl
            .tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
        self.gl
            .tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MAG_FILTER, Gl::LINEAR as i32);

        let uploaded = self
            .gl
            .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                Gl::TEXTURE_2D,
                0,
                Gl::RGBA as i32,
                image.width as i32,
                image.height as i32,
                0,
                Gl::RGBA,
                Gl::UNSIGNED_BYTE,
                Some(image.pixels.as_slice()),
            );
        if let Err(e) = uploaded {
            warn!("texture upload failed: {e:?}");
            return;
        }

        self.gl.use_program(Some(&self.program));
        self.gl.uniform1i(self.has_texture.as_ref(), 1);
        if let Some(previous) = self.texture.replace(texture) {
            self.gl.delete_texture(Some(&previous));
        }
    }

    fn enable_depth_test(&mut self) {
        self.gl.enable(Gl::DEPTH_TEST);
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.color {
            self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
            bits |= Gl::COLOR_BUFFER_BIT;
        }
        if mask.depth {
            bits |= Gl::DEPTH_BUFFER_BIT;
        }
        self.gl.clear(bits);
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.gl.color_mask(mask.red, mask.green, mask.blue, true);
    }

    fn set_uniform_matrix(&mut self, uniform: Uniform, value: &Matrix4<f32>) {
        self.gl
            .uniform_matrix4fv_with_f32_array(self.location(uniform), false, value.as_slice());
    }

    fn set_uniform_vec3(&mut self, uniform: Uniform, value: [f32; 3]) {
        self.gl.uniform3fv_with_f32_array(self.location(uniform), &value);
    }

    fn set_uniform_vec2(&mut self, uniform: Uniform, value: [f32; 2]) {
        self.gl.uniform2fv_with_f32_array(self.location(uniform), &value);
    }

    fn draw_strip(&mut self, first: usize, count: usize) {
        if self.buffer.is_none() {
            return;
        }
        self.gl
            .draw_arrays(Gl::TRIANGLE_STRIP, first as i32, count as i32);
    }
}

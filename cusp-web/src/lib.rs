/// Cusp3D Web - WebGL2 front end
///
/// The page owns the canvas and the DOM inputs; every listener forwards to a
/// `WebViewer` method, which updates state and redraws before returning.
use cusp_core::controls::parse_control;
use cusp_core::{
    AssetError, Control, InputEvent, OrientationReading, RenderContext, RenderError, StereoMode,
    TextureImage, ViewerConfig,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

pub mod webgl;

pub use webgl::WebGlBackend;

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn find_canvas(canvas_id: &str) -> Result<HtmlCanvasElement, RenderError> {
    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(canvas_id))
        .ok_or_else(|| RenderError::ContextUnavailable(format!("no element #{canvas_id}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| RenderError::ContextUnavailable(format!("#{canvas_id} is not a canvas")))
}

#[wasm_bindgen]
pub struct WebViewer {
    backend: WebGlBackend,
    ctx: RenderContext,
}

#[wasm_bindgen]
impl WebViewer {
    /// Attach to a canvas. Fails when WebGL2 is unavailable or the shaders
    /// do not build; the page should show the message instead.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebViewer, JsValue> {
        let canvas = find_canvas(canvas_id).map_err(to_js)?;
        let mut backend = WebGlBackend::from_canvas(&canvas).map_err(to_js)?;

        let (width, height) = (canvas.width().max(1), canvas.height().max(1));
        let mut config = ViewerConfig::default();
        config.stereo.camera.aspect_ratio = width as f64 / height as f64;

        let ctx = RenderContext::initialize(&mut backend, &config, width, height)
            .map_err(to_js)?;
        Ok(WebViewer { backend, ctx })
    }

    fn dispatch(&mut self, event: InputEvent) -> Result<(), JsValue> {
        self.ctx
            .dispatch(&mut self.backend, event)
            .map(|_| ())
            .map_err(to_js)
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::PointerDown { x, y })
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::PointerMove { x, y })
    }

    pub fn pointer_up(&mut self) -> Result<(), JsValue> {
        self.dispatch(InputEvent::PointerUp)
    }

    pub fn pointer_leave(&mut self) -> Result<(), JsValue> {
        self.dispatch(InputEvent::PointerLeave)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.backend.set_viewport(width, height);
        self.dispatch(InputEvent::Resize { width, height })
    }

    /// `deviceorientation` angles in degrees
    pub fn orientation(&mut self, alpha: f64, beta: f64, gamma: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::Orientation(OrientationReading::new(
            alpha, beta, gamma,
        )))
    }

    /// Apply a text command such as `convergence 2`
    pub fn command(&mut self, line: &str) -> Result<(), JsValue> {
        let control = parse_control(line).map_err(to_js)?;
        self.dispatch(InputEvent::Control(control))
    }

    pub fn set_light(&mut self, x: f64, y: f64, z: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::Control(Control::LightPosition([x, y, z])))
    }

    pub fn set_texture_scale(&mut self, u: f64, v: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::Control(Control::TextureScale([u, v])))
    }

    pub fn set_texture_center(&mut self, u: f64, v: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::Control(Control::TextureCenter([u, v])))
    }

    pub fn set_eye_separation(&mut self, value: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::Control(Control::EyeSeparation(value)))
    }

    pub fn set_convergence(&mut self, value: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::Control(Control::Convergence(value)))
    }

    /// Field of view in degrees
    pub fn set_fov(&mut self, degrees: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::Control(Control::FieldOfView(degrees)))
    }

    pub fn set_near(&mut self, value: f64) -> Result<(), JsValue> {
        self.dispatch(InputEvent::Control(Control::Near(value)))
    }

    pub fn set_stereo_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = match mode {
            "mono" => StereoMode::Mono,
            "left" => StereoMode::LeftOnly,
            "anaglyph" => StereoMode::Anaglyph,
            other => return Err(JsValue::from_str(&format!("unknown stereo mode {other}"))),
        };
        self.dispatch(InputEvent::Control(Control::Mode(mode)))
    }

    /// Completion of the page's image load, as RGBA pixels
    pub fn texture_loaded(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> Result<(), JsValue> {
        let image = TextureImage::from_rgba(width, height, pixels).map_err(to_js)?;
        self.ctx
            .texture_loaded(&mut self.backend, &image)
            .map_err(to_js)
    }

    pub fn texture_failed(&mut self, reason: String) {
        self.ctx.texture_failed(&AssetError::Decode(reason));
    }

    pub fn draw(&mut self) -> Result<(), JsValue> {
        self.ctx.redraw(&mut self.backend).map_err(to_js)
    }
}

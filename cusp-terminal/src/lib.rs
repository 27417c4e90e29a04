/// Interactive terminal viewer for the horn surface
use crossterm::{
    cursor,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use cusp_core::controls::parse_control;
use cusp_core::texture::load_texture;
use cusp_core::{
    AssetError, Control, InputEvent, OrientationReading, RenderContext, StereoMode, TextureImage,
    ViewerConfig,
};
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

pub mod renderer;
pub mod sensor;

pub use renderer::AsciiRenderer;

/// Terminal cells are about twice as tall as they are wide
const CELL_ASPECT: u32 = 2;
/// Pixels an arrow key drags the trackball by
const KEY_DRAG: f64 = 4.0;

type TextureResult = Result<TextureImage, AssetError>;

/// Pixel size of the viewport covered by a `cols` x `rows` grid
pub fn viewport_pixels(cols: u16, rows: u16) -> (u32, u32) {
    (cols.max(1) as u32, rows.max(1) as u32 * CELL_ASPECT)
}

/// Translate mouse and focus events into trackball input.
///
/// Positions are cell centers in viewport pixels; losing focus ends a drag
/// the same way the pointer leaving a canvas does.
pub fn pointer_input(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Mouse(mouse) => {
            let x = mouse.column as f64 + 0.5;
            let y = (mouse.row as f64 + 0.5) * CELL_ASPECT as f64;
            match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown { x, y }),
                MouseEventKind::Drag(MouseButton::Left) => Some(InputEvent::PointerMove { x, y }),
                MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::PointerUp),
                _ => None,
            }
        }
        Event::FocusLost => Some(InputEvent::PointerLeave),
        _ => None,
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    ctx: RenderContext,
    renderer: AsciiRenderer,
    texture_rx: Option<Receiver<TextureResult>>,
    sensor_rx: Option<Receiver<OrientationReading>>,
    command: Option<String>,
    status: String,
    running: bool,
    needs_present: bool,
}

impl TerminalApp {
    pub fn new(config: &ViewerConfig, orientation_feed: Option<PathBuf>) -> anyhow::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let (width, height) = viewport_pixels(cols, rows);

        let mut config = config.clone();
        config.stereo.camera.aspect_ratio = width as f64 / height as f64;

        let mut renderer = AsciiRenderer::new(cols as usize, rows as usize);
        let ctx = RenderContext::initialize(&mut renderer, &config, width, height)?;

        // Fire and forget: the completion is picked up by the event loop
        let texture_rx = config.texture_path.clone().map(|path| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let _ = tx.send(load_texture(&path));
            });
            rx
        });

        Ok(Self {
            ctx,
            renderer,
            texture_rx,
            sensor_rx: orientation_feed.map(sensor::spawn_feed),
            command: None,
            status: String::new(),
            running: true,
            needs_present: true,
        })
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            DisableFocusChange,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> anyhow::Result<()> {
        // Waiting for input, not a frame clock: nothing is drawn unless
        // something changed.
        let idle_wait = Duration::from_millis(30);

        while self.running {
            if event::poll(idle_wait)? {
                let event = event::read()?;
                self.handle_event(event);
            }
            self.poll_texture();
            self.poll_sensor();

            if self.needs_present {
                self.present()?;
                self.needs_present = false;
            }
        }

        Ok(())
    }

    fn dispatch(&mut self, event: InputEvent) {
        match self.ctx.dispatch(&mut self.renderer, event) {
            Ok(redrawn) => self.needs_present |= redrawn,
            Err(e) => {
                self.status = e.to_string();
                self.needs_present = true;
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(cols, rows) => {
                self.renderer.resize(cols as usize, rows as usize);
                let (width, height) = viewport_pixels(cols, rows);
                self.dispatch(InputEvent::Resize { width, height });
            }
            other => {
                if let Some(input) = pointer_input(&other) {
                    self.dispatch(input);
                }
            }
        }
    }

    fn handle_key(&mut self, KeyEvent { code, .. }: KeyEvent) {
        if let Some(command) = self.command.as_mut() {
            match code {
                KeyCode::Enter => {
                    let line = std::mem::take(command);
                    self.command = None;
                    self.run_command(&line);
                }
                KeyCode::Esc => self.command = None,
                KeyCode::Backspace => {
                    command.pop();
                }
                KeyCode::Char(c) => command.push(c),
                _ => {}
            }
            self.needs_present = true;
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char(':') => {
                self.command = Some(String::new());
                self.status.clear();
                self.needs_present = true;
            }
            KeyCode::Char('m') => {
                let next = match self.ctx.stereo_mode() {
                    StereoMode::Mono => StereoMode::LeftOnly,
                    StereoMode::LeftOnly => StereoMode::Anaglyph,
                    StereoMode::Anaglyph => StereoMode::Mono,
                };
                self.dispatch(InputEvent::Control(Control::Mode(next)));
            }
            KeyCode::Char('r') => self.dispatch(InputEvent::Control(Control::ResetView)),
            KeyCode::Char('w') | KeyCode::Up => self.key_drag(0.0, -KEY_DRAG),
            KeyCode::Char('s') | KeyCode::Down => self.key_drag(0.0, KEY_DRAG),
            KeyCode::Char('a') | KeyCode::Left => self.key_drag(-KEY_DRAG, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.key_drag(KEY_DRAG, 0.0),
            _ => {}
        }
    }

    /// A short drag from the viewport center
    fn key_drag(&mut self, dx: f64, dy: f64) {
        let (cols, rows) = (self.renderer.width() as u16, self.renderer.height() as u16);
        let (width, height) = viewport_pixels(cols, rows);
        let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);

        self.dispatch(InputEvent::PointerDown { x: cx, y: cy });
        self.dispatch(InputEvent::PointerMove {
            x: cx + dx,
            y: cy + dy,
        });
        self.dispatch(InputEvent::PointerUp);
    }

    fn run_command(&mut self, line: &str) {
        match parse_control(line) {
            Ok(control) => {
                self.status.clear();
                self.dispatch(InputEvent::Control(control));
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn poll_texture(&mut self) {
        let Some(rx) = &self.texture_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.texture_rx = None;
                return;
            }
        };
        self.texture_rx = None;

        match result {
            Ok(image) => match self.ctx.texture_loaded(&mut self.renderer, &image) {
                Ok(()) => self.needs_present = true,
                Err(e) => self.status = e.to_string(),
            },
            Err(e) => self.ctx.texture_failed(&e),
        }
    }

    fn poll_sensor(&mut self) {
        let Some(rx) = &self.sensor_rx else {
            return;
        };
        // Each reading overwrites the last, so only the newest matters
        let mut latest = None;
        loop {
            match rx.try_recv() {
                Ok(reading) => latest = Some(reading),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("orientation feed closed");
                    self.sensor_rx = None;
                    break;
                }
            }
        }
        if let Some(reading) = latest {
            self.dispatch(InputEvent::Orientation(reading));
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let camera = self.ctx.camera();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Cusp3D | {:?} | eye {:.3} conv {:.2} fov {:.1}° near {} | drag/WASD rotate, m mode, : command, q quit",
                self.ctx.stereo_mode(),
                camera.eye_separation,
                camera.convergence,
                camera.fov.to_degrees(),
                camera.near,
            )),
            ResetColor
        )?;

        let bottom = self.renderer.height().saturating_sub(1) as u16;
        if let Some(command) = &self.command {
            queue!(
                stdout,
                cursor::MoveTo(0, bottom),
                terminal::Clear(ClearType::CurrentLine),
                Print(format!(":{command}"))
            )?;
        } else if !self.status.is_empty() {
            queue!(
                stdout,
                cursor::MoveTo(0, bottom),
                terminal::Clear(ClearType::CurrentLine),
                SetForegroundColor(Color::Red),
                Print(&self.status),
                ResetColor
            )?;
        }

        stdout.flush()?;
        debug!("presented frame");
        Ok(())
    }
}

/// Render one frame off-screen and return it as text.
///
/// The texture, if configured, is loaded before drawing; a failed load
/// leaves the surface untextured.
pub fn render_snapshot(config: &ViewerConfig, cols: u16, rows: u16) -> anyhow::Result<String> {
    let (width, height) = viewport_pixels(cols, rows);
    let mut config = config.clone();
    config.stereo.camera.aspect_ratio = width as f64 / height as f64;

    let mut renderer = AsciiRenderer::new(cols as usize, rows as usize);
    let mut ctx = RenderContext::initialize(&mut renderer, &config, width, height)?;

    if let Some(path) = &config.texture_path {
        match load_texture(path) {
            Ok(image) => ctx.texture_loaded(&mut renderer, &image)?,
            Err(e) => ctx.texture_failed(&e),
        }
    }

    Ok(renderer.to_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_pixels() {
        assert_eq!(viewport_pixels(80, 24), (80, 48));
        assert_eq!(viewport_pixels(0, 0), (1, 2));
    }

    #[test]
    fn test_pointer_input() {
        use crossterm::event::{KeyModifiers, MouseEvent};

        let drag = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Drag(MouseButton::Left),
            column: 10,
            row: 4,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(
            pointer_input(&drag),
            Some(InputEvent::PointerMove { x: 10.5, y: 9.0 })
        );

        let right = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(pointer_input(&right), None);

        assert_eq!(
            pointer_input(&Event::FocusLost),
            Some(InputEvent::PointerLeave)
        );
        assert_eq!(pointer_input(&Event::FocusGained), None);
    }

    #[test]
    fn test_snapshot_draws_the_surface() {
        let text = render_snapshot(&ViewerConfig::default(), 60, 30).unwrap();
        assert_eq!(text.lines().count(), 30);
        assert!(text.lines().all(|line| line.chars().count() == 60));
        assert!(text.chars().any(|c| c != ' ' && c != '\n'));
    }

    #[test]
    fn test_snapshot_survives_missing_texture() {
        let config = ViewerConfig {
            texture_path: Some(PathBuf::from("/nonexistent/moss.jpg")),
            ..ViewerConfig::default()
        };
        assert!(render_snapshot(&config, 20, 10).is_ok());
    }
}

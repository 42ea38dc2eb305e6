use crate::capture;
use crate::gamepad::Gamepads;
use log::{error, info, warn};
use nesplay_core::host::{
    FrameBuffer, GamepadState, Host, HostEvent, Key, KeyAction, Modifiers, Rect, Rgba,
    SCREEN_HEIGHT, SCREEN_WIDTH,
};
use pixels::{Pixels, SurfaceTexture};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

/// Upper bound on event-loop pumps while waiting for the window to appear.
const STARTUP_PUMPS: usize = 64;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create pixel surface: {0}")]
    Pixels(#[from] pixels::Error),
    #[error("the platform never created the window")]
    NoWindow,
}

/// Window plus a CPU-side RGBA target the size of its client area.
struct Surface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    size: PhysicalSize<u32>,
}

impl Surface {
    fn new(window: Arc<Window>) -> Result<Self, pixels::Error> {
        let inner = window.inner_size();
        let size = PhysicalSize::new(inner.width.max(1), inner.height.max(1));
        let texture = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(size.width, size.height, texture)?;
        Ok(Self {
            window,
            pixels,
            size,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Err(e) = self.pixels.resize_surface(size.width, size.height) {
            warn!("Failed to resize surface: {e}");
            return;
        }
        if let Err(e) = self.pixels.resize_buffer(size.width, size.height) {
            warn!("Failed to resize frame buffer: {e}");
            return;
        }
        self.size = size;
    }
}

/// State touched by winit callbacks during a pump.
struct WindowState {
    title: String,
    inner_size: LogicalSize<u32>,
    surface: Option<Surface>,
    error: Option<HostError>,
    close_requested: bool,
    focused: bool,
    keys_down: HashSet<Key>,
    modifiers: Modifiers,
    events: Vec<HostEvent>,
}

impl WindowState {
    fn new(title: &str, inner_size: LogicalSize<u32>) -> Self {
        Self {
            title: title.to_string(),
            inner_size,
            surface: None,
            error: None,
            close_requested: false,
            focused: false,
            keys_down: HashSet::new(),
            modifiers: Modifiers::NONE,
            events: Vec::new(),
        }
    }

    fn on_key(&mut self, event: KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = map_key(code) else {
            return;
        };

        let action = match (event.state, event.repeat) {
            (ElementState::Released, _) => KeyAction::Release,
            (ElementState::Pressed, true) => KeyAction::Repeat,
            (ElementState::Pressed, false) => KeyAction::Press,
        };
        if action == KeyAction::Release {
            self.keys_down.remove(&key);
        } else {
            self.keys_down.insert(key);
        }

        self.events.push(HostEvent::Key {
            key,
            action,
            modifiers: self.modifiers,
        });
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.inner_size);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        self.focused = window.has_focus();
        match Surface::new(window) {
            Ok(surface) => self.surface = Some(surface),
            Err(e) => {
                self.error = Some(e.into());
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Resized(size) => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.resize(size);
                }
            }
            WindowEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    self.keys_down.clear();
                }
                self.events.push(HostEvent::Focus(focused));
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = map_modifiers(modifiers.state());
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event),
            _ => {}
        }
    }
}

/// Desktop [`Host`]: a winit window pumped once per frame, drawn through
/// `pixels`, with gamepads read from gilrs.
pub struct WindowHost {
    event_loop: EventLoop<()>,
    state: WindowState,
    gamepads: Gamepads,
    start: Instant,
    clear_color: Rgba,
    capture_dir: PathBuf,
    exited: bool,
}

impl WindowHost {
    pub fn new(title: &str, scale: u32, capture_dir: PathBuf) -> Result<Self, HostError> {
        let mut event_loop = EventLoop::new()?;
        let scale = scale.max(1);
        let mut state = WindowState::new(
            title,
            LogicalSize::new(SCREEN_WIDTH * scale, SCREEN_HEIGHT * scale),
        );

        // The window is created from `resumed`, delivered by the first pumps.
        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut state);
            if state.surface.is_some() || state.error.is_some() {
                break;
            }
            if let PumpStatus::Exit(_) = status {
                break;
            }
        }
        if let Some(e) = state.error.take() {
            return Err(e);
        }
        if state.surface.is_none() {
            return Err(HostError::NoWindow);
        }

        Ok(Self {
            event_loop,
            state,
            gamepads: Gamepads::new(),
            start: Instant::now(),
            clear_color: Rgba::BLACK,
            capture_dir,
            exited: false,
        })
    }
}

impl Host for WindowHost {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn set_title(&mut self, title: &str) {
        if let Some(surface) = &self.state.surface {
            surface.window.set_title(title);
        }
    }

    fn set_clear_color(&mut self, color: Rgba) {
        self.clear_color = color;
    }

    fn clear(&mut self) {
        let Some(surface) = self.state.surface.as_mut() else {
            return;
        };
        for px in surface.pixels.frame_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&self.clear_color.0);
        }
    }

    fn swap_buffers(&mut self) {
        let Some(surface) = self.state.surface.as_ref() else {
            return;
        };
        if let Err(e) = surface.pixels.render() {
            error!("Render error: {e}");
            self.state.close_requested = true;
        }
    }

    fn poll_events(&mut self) -> Vec<HostEvent> {
        if !self.exited
            && let PumpStatus::Exit(code) = self
                .event_loop
                .pump_app_events(Some(Duration::ZERO), &mut self.state)
        {
            info!("Event loop exited with status {code}");
            self.exited = true;
            self.state.close_requested = true;
        }
        self.gamepads.poll();
        std::mem::take(&mut self.state.events)
    }

    fn is_focused(&self) -> bool {
        self.state.focused
    }

    fn key_down(&self, key: Key) -> bool {
        self.state.keys_down.contains(&key)
    }

    fn gamepad(&self, index: usize) -> Option<GamepadState> {
        self.gamepads.state(index)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.state
            .surface
            .as_ref()
            .map_or((0, 0), |s| (s.size.width, s.size.height))
    }

    fn draw_frame(&mut self, frame: &FrameBuffer, quad: Rect) {
        let Some(surface) = self.state.surface.as_mut() else {
            return;
        };
        let (width, height) = (surface.size.width, surface.size.height);
        let area = PixelRect::from_ndc(quad, width, height);
        if area.is_empty() || frame.width == 0 || frame.height == 0 {
            return;
        }

        let span_w = area.x1 - area.x0;
        let span_h = area.y1 - area.y0;
        let target = surface.pixels.frame_mut();
        for y in area.y0.max(0)..area.y1.min(i64::from(height)) {
            let sy = ((y - area.y0) * i64::from(frame.height) / span_h) as u32;
            for x in area.x0.max(0)..area.x1.min(i64::from(width)) {
                let sx = ((x - area.x0) * i64::from(frame.width) / span_w) as u32;
                let px = frame.pixel(sx, sy);
                let o = ((y * i64::from(width) + x) * 4) as usize;
                target[o] = ((px >> 16) & 0xFF) as u8;
                target[o + 1] = ((px >> 8) & 0xFF) as u8;
                target[o + 2] = (px & 0xFF) as u8;
                target[o + 3] = 0xFF;
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(surface) = self.state.surface.as_mut() else {
            return;
        };
        let (width, height) = (surface.size.width, surface.size.height);
        let area = PixelRect::from_ndc(rect, width, height);
        let target = surface.pixels.frame_mut();
        for y in area.y0.max(0)..area.y1.min(i64::from(height)) {
            for x in area.x0.max(0)..area.x1.min(i64::from(width)) {
                let o = ((y * i64::from(width) + x) * 4) as usize;
                blend(&mut target[o..o + 4], color);
            }
        }
    }

    fn screenshot(&mut self, frame: &FrameBuffer) {
        match capture::save_screenshot(&self.capture_dir, frame) {
            Ok(path) => info!("Screenshot saved to {}", path.display()),
            Err(e) => warn!("Screenshot failed: {e}"),
        }
    }

    fn export_animation(&mut self, frames: Vec<FrameBuffer>) {
        if frames.is_empty() {
            return;
        }
        match capture::save_animation(&self.capture_dir, &frames) {
            Ok(path) => info!("Recording of {} frames saved to {}", frames.len(), path.display()),
            Err(e) => warn!("Failed to save recording: {e}"),
        }
    }
}

/// Half-open pixel span of an NDC rectangle; rows count down from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRect {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl PixelRect {
    fn from_ndc(rect: Rect, width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        let to_x = |ndc: f32| ((ndc + 1.0) * 0.5 * w).round() as i64;
        let to_y = |ndc: f32| ((1.0 - ndc) * 0.5 * h).round() as i64;
        Self {
            x0: to_x(rect.x),
            y0: to_y(rect.y + rect.h),
            x1: to_x(rect.x + rect.w),
            y1: to_y(rect.y),
        }
    }

    fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

fn blend(dst: &mut [u8], color: Rgba) {
    let [r, g, b, a] = color.0;
    let a = u16::from(a);
    for (d, s) in dst.iter_mut().zip([r, g, b]) {
        *d = ((u16::from(s) * a + u16::from(*d) * (255 - a)) / 255) as u8;
    }
    dst[3] = 0xFF;
}

fn map_modifiers(state: ModifiersState) -> Modifiers {
    Modifiers {
        shift: state.shift_key(),
        control: state.control_key(),
        alt: state.alt_key(),
        logo: state.super_key(),
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::ShiftRight => Key::RightShift,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyZ => Key::Z,
        KeyCode::Digit0 => Key::Digit(0),
        KeyCode::Digit1 => Key::Digit(1),
        KeyCode::Digit2 => Key::Digit(2),
        KeyCode::Digit3 => Key::Digit(3),
        KeyCode::Digit4 => Key::Digit(4),
        KeyCode::Digit5 => Key::Digit(5),
        KeyCode::Digit6 => Key::Digit(6),
        KeyCode::Digit7 => Key::Digit(7),
        KeyCode::Digit8 => Key::Digit(8),
        KeyCode::Digit9 => Key::Digit(9),
        _ => return None,
    };
    Some(key)
}

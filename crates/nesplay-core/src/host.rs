/// Width of the emulated picture in pixels.
pub const SCREEN_WIDTH: u32 = 256;
/// Height of the emulated picture in pixels.
pub const SCREEN_HEIGHT: u32 = 240;

/// One emulated video frame, pixels stored as 0x00RRGGBB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }
}

/// Axis-aligned rectangle in normalized device coordinates: x and y span
/// [-1, 1], y grows upward, `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const FULL: Rect = Rect::new(-1.0, -1.0, 2.0, 2.0);

    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Largest centered quad with the source aspect ratio inside the target.
pub fn letterbox(target_w: u32, target_h: u32, source_w: u32, source_h: u32) -> Rect {
    if target_w == 0 || target_h == 0 || source_w == 0 || source_h == 0 {
        return Rect::FULL;
    }
    let s1 = target_w as f32 / source_w as f32;
    let s2 = target_h as f32 / source_h as f32;
    let (x, y) = if s1 >= s2 { (s2 / s1, 1.0) } else { (1.0, s1 / s2) };
    Rect::new(-x, -y, 2.0 * x, 2.0 * y)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    RightShift,
    A,
    P,
    R,
    S,
    X,
    Z,
    /// Top-row digit 0-9.
    Digit(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub logo: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
        logo: false,
    };

    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }

    pub fn is_alt_only(self) -> bool {
        self == Self::ALT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Repeat,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Key {
        key: Key,
        action: KeyAction,
        modifiers: Modifiers,
    },
    Focus(bool),
}

/// Snapshot of one gamepad. Stick axes are in [-1, 1], y grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GamepadState {
    pub south: bool,
    pub east: bool,
    pub west: bool,
    pub north: bool,
    pub select: bool,
    pub start: bool,
    pub left_shoulder: bool,
    pub right_shoulder: bool,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub left_stick_x: f32,
    pub left_stick_y: f32,
}

/// Window, renderer and raw input provided by the platform.
///
/// All methods are called from the presentation thread.
pub trait Host {
    /// Seconds since an arbitrary fixed origin.
    fn now(&self) -> f64;

    fn should_close(&self) -> bool;

    fn set_title(&mut self, title: &str);

    fn set_clear_color(&mut self, color: Rgba);

    /// Clear the frame target with the current clear color.
    fn clear(&mut self);

    /// Present the frame target.
    fn swap_buffers(&mut self);

    /// Pump platform events and return those addressed to the active view.
    fn poll_events(&mut self) -> Vec<HostEvent>;

    fn is_focused(&self) -> bool;

    fn key_down(&self, key: Key) -> bool;

    fn gamepad(&self, index: usize) -> Option<GamepadState>;

    /// Size of the frame target in pixels.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Draw `frame` as a textured quad covering `quad`.
    fn draw_frame(&mut self, frame: &FrameBuffer, quad: Rect);

    /// Alpha-blend a solid rectangle over the frame target.
    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    fn screenshot(&mut self, _frame: &FrameBuffer) {}

    /// Receives the frames captured between two recording toggles.
    fn export_animation(&mut self, _frames: Vec<FrameBuffer>) {}
}

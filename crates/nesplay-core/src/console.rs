use crate::audio::SampleSender;
use crate::cartridge::Cartridge;
use crate::host::FrameBuffer;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid program image: {0}")]
    InvalidImage(String),
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

/// Standard controller state as a bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons(pub u8);

impl Buttons {
    pub const A: u8 = 0x01;
    pub const B: u8 = 0x02;
    pub const SELECT: u8 = 0x04;
    pub const START: u8 = 0x08;
    pub const UP: u8 = 0x10;
    pub const DOWN: u8 = 0x20;
    pub const LEFT: u8 = 0x40;
    pub const RIGHT: u8 = 0x80;

    pub const NONE: Buttons = Buttons(0);

    #[inline]
    pub fn set(&mut self, mask: u8, pressed: bool) {
        if pressed {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    #[inline]
    pub fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    #[inline]
    pub fn union(self, other: Buttons) -> Buttons {
        Buttons(self.0 | other.0)
    }
}

/// Emulation core as seen by the front-end.
///
/// Implementations own CPU/PPU/APU stepping and cartridge mapping. While an
/// audio sink is attached, `step_seconds` is expected to push one mono sample
/// per output sample period of emulated time.
pub trait Console {
    fn step_seconds(&mut self, seconds: f64);

    /// Attach or detach (`None`) the audio sample sink.
    fn set_audio_sink(&mut self, sink: Option<SampleSender>);

    fn frame_buffer(&self) -> &FrameBuffer;

    /// Number of frames completed since the last reset.
    fn frame_count(&self) -> u64;

    fn set_buttons(&mut self, player: Player, buttons: Buttons);

    fn reset(&mut self);

    fn save_snapshot(&self, path: &Path) -> Result<(), ConsoleError>;

    fn load_snapshot(&mut self, path: &Path) -> Result<(), ConsoleError>;

    fn cartridge(&self) -> &Cartridge;

    fn cartridge_mut(&mut self) -> &mut Cartridge;
}

/// Builds a [`Console`] for a program image.
pub trait ConsoleLoader {
    fn load(&mut self, path: &Path, image: &[u8]) -> Result<Box<dyn Console>, ConsoleError>;
}

//! Placeholder emulation core.
//!
//! Parses the cartridge header and keeps SRAM, frame count and snapshots
//! working so the whole front-end can run without a CPU/PPU/APU behind it.
//! The picture is a slowly scrolling test pattern and the audio is silence
//! produced at the device rate.

use log::debug;
use nesplay_core::audio::SampleSender;
use nesplay_core::cartridge::Cartridge;
use nesplay_core::console::{Buttons, Console, ConsoleError, ConsoleLoader, Player};
use nesplay_core::host::{FrameBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::Path;

const FRAME_RATE: f64 = 60.0988;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    frames: u64,
    frame_time: f64,
    sram: Vec<u8>,
}

pub struct BlankConsole {
    cartridge: Cartridge,
    frame: FrameBuffer,
    frames: u64,
    frame_time: f64,
    sample_debt: f64,
    sink: Option<SampleSender>,
    buttons: [Buttons; 2],
}

impl BlankConsole {
    pub fn new(cartridge: Cartridge) -> Self {
        let mut console = Self {
            cartridge,
            frame: FrameBuffer::blank(SCREEN_WIDTH, SCREEN_HEIGHT),
            frames: 0,
            frame_time: 0.0,
            sample_debt: 0.0,
            sink: None,
            buttons: [Buttons::NONE; 2],
        };
        console.render();
        console
    }

    fn render(&mut self) {
        let offset = (self.frames / 2) as u32;
        let tint = u32::from(self.buttons[0].0);
        for y in 0..self.frame.height {
            for x in 0..self.frame.width {
                let checker = ((x + offset) / 16 + y / 16) % 2 == 0;
                let level = if checker { 0x30 } else { 0x18 };
                self.frame.pixels[(y * self.frame.width + x) as usize] =
                    (level << 16) | (level << 8) | (level + tint / 4);
            }
        }
    }

    fn push_silence(&mut self, seconds: f64) {
        let Some(sink) = &self.sink else {
            return;
        };
        self.sample_debt += seconds * f64::from(sink.sample_rate());
        while self.sample_debt >= 1.0 {
            sink.push(0.0);
            self.sample_debt -= 1.0;
        }
    }
}

impl Console for BlankConsole {
    fn step_seconds(&mut self, seconds: f64) {
        self.push_silence(seconds);
        self.frame_time += seconds * FRAME_RATE;
        let mut advanced = false;
        while self.frame_time >= 1.0 {
            self.frame_time -= 1.0;
            self.frames += 1;
            advanced = true;
        }
        if advanced {
            self.render();
        }
    }

    fn set_audio_sink(&mut self, sink: Option<SampleSender>) {
        self.sink = sink;
        self.sample_debt = 0.0;
    }

    fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame
    }

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn set_buttons(&mut self, player: Player, buttons: Buttons) {
        let index = match player {
            Player::One => 0,
            Player::Two => 1,
        };
        self.buttons[index] = buttons;
    }

    fn reset(&mut self) {
        self.frames = 0;
        self.frame_time = 0.0;
        self.render();
    }

    fn save_snapshot(&self, path: &Path) -> Result<(), ConsoleError> {
        let snapshot = Snapshot {
            frames: self.frames,
            frame_time: self.frame_time,
            sram: self.cartridge.sram.clone(),
        };
        let bytes =
            bincode::serialize(&snapshot).map_err(|e| ConsoleError::Snapshot(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load_snapshot(&mut self, path: &Path) -> Result<(), ConsoleError> {
        let bytes = std::fs::read(path)?;
        let snapshot: Snapshot =
            bincode::deserialize(&bytes).map_err(|e| ConsoleError::Snapshot(e.to_string()))?;
        self.frames = snapshot.frames;
        self.frame_time = snapshot.frame_time;
        self.cartridge.load_sram(&snapshot.sram);
        self.render();
        debug!("Snapshot restored at frame {}", self.frames);
        Ok(())
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }
}

pub struct BlankLoader;

impl ConsoleLoader for BlankLoader {
    fn load(&mut self, path: &Path, image: &[u8]) -> Result<Box<dyn Console>, ConsoleError> {
        let cartridge = Cartridge::from_image(image)?;
        debug!(
            "{}: mapper {}, {} KiB PRG, {} KiB CHR, battery {}",
            path.display(),
            cartridge.mapper,
            cartridge.prg_rom_len / 1024,
            cartridge.chr_rom_len / 1024,
            cartridge.has_battery()
        );
        Ok(Box::new(BlankConsole::new(cartridge)))
    }
}

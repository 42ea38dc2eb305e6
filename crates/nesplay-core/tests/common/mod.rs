#![allow(dead_code)]

use nesplay_core::audio::{AudioSink, OutputFormat, SampleSender};
use nesplay_core::cartridge::Cartridge;
use nesplay_core::console::{Buttons, Console, ConsoleError, ConsoleLoader, Player};
use nesplay_core::director::Director;
use nesplay_core::host::{
    FrameBuffer, GamepadState, Host, HostEvent, Key, Rect, Rgba, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use nesplay_core::storage::SaveStore;
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Observable state of every console the fake loader creates.
#[derive(Default)]
pub struct Probe {
    pub log: Vec<String>,
    pub loads: usize,
    pub elapsed: f64,
    pub buttons: [Buttons; 2],
    pub samples_pushed: usize,
}

pub type SharedProbe = Rc<RefCell<Probe>>;

pub struct FakeConsole {
    probe: SharedProbe,
    cartridge: Cartridge,
    frame: FrameBuffer,
    frames: u64,
    sink: Option<SampleSender>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Console for FakeConsole {
    fn step_seconds(&mut self, seconds: f64) {
        let mut probe = self.probe.borrow_mut();
        probe.elapsed += seconds;
        self.frames += 1;
        if let Some(sink) = &self.sink
            && sink.push(0.5)
        {
            probe.samples_pushed += 1;
        }
    }

    fn set_audio_sink(&mut self, sink: Option<SampleSender>) {
        let entry = if sink.is_some() {
            "audio attached"
        } else {
            "audio detached"
        };
        self.probe.borrow_mut().log.push(entry.to_string());
        self.sink = sink;
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
        self.probe.borrow_mut().buttons[index] = buttons;
    }

    fn reset(&mut self) {
        let mut probe = self.probe.borrow_mut();
        probe.elapsed = 0.0;
        probe.log.push("reset".to_string());
        self.frames = 0;
    }

    fn save_snapshot(&self, path: &Path) -> Result<(), ConsoleError> {
        let mut probe = self.probe.borrow_mut();
        probe.log.push(format!("save {}", file_name(path)));
        fs::write(path, probe.elapsed.to_string())?;
        Ok(())
    }

    fn load_snapshot(&mut self, path: &Path) -> Result<(), ConsoleError> {
        let mut probe = self.probe.borrow_mut();
        probe.log.push(format!("load {}", file_name(path)));
        let text = fs::read_to_string(path)?;
        probe.elapsed = text
            .trim()
            .parse()
            .map_err(|_| ConsoleError::Snapshot(text.clone()))?;
        Ok(())
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }
}

pub struct FakeLoader {
    pub probe: SharedProbe,
}

impl ConsoleLoader for FakeLoader {
    fn load(&mut self, _path: &Path, image: &[u8]) -> Result<Box<dyn Console>, ConsoleError> {
        let cartridge = Cartridge::from_image(image)?;
        self.probe.borrow_mut().loads += 1;
        Ok(Box::new(FakeConsole {
            probe: Rc::clone(&self.probe),
            cartridge,
            frame: FrameBuffer::blank(SCREEN_WIDTH, SCREEN_HEIGHT),
            frames: 0,
            sink: None,
        }))
    }
}

/// Scripted host. Time only moves when a test (or `swap_buffers`) says so.
pub struct FakeHost {
    pub time: f64,
    pub frame_time: f64,
    pub close_after: Option<usize>,
    pub presented: usize,
    pub titles: Vec<String>,
    pub clear_colors: Vec<Rgba>,
    pub keys_down: HashSet<Key>,
    pub pads: [Option<GamepadState>; 2],
    pub focused: bool,
    pub events: VecDeque<Vec<HostEvent>>,
    pub rects: Vec<(Rect, Rgba)>,
    pub frames_drawn: usize,
    pub clears: usize,
    pub animations: Vec<usize>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            time: 0.0,
            frame_time: 1.0 / 60.0,
            close_after: None,
            presented: 0,
            titles: Vec::new(),
            clear_colors: Vec::new(),
            keys_down: HashSet::new(),
            pads: [None, None],
            focused: true,
            events: VecDeque::new(),
            rects: Vec::new(),
            frames_drawn: 0,
            clears: 0,
            animations: Vec::new(),
        }
    }
}

impl Host for FakeHost {
    fn now(&self) -> f64 {
        self.time
    }

    fn should_close(&self) -> bool {
        self.close_after.is_some_and(|n| self.presented >= n)
    }

    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn set_clear_color(&mut self, color: Rgba) {
        self.clear_colors.push(color);
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.rects.clear();
    }

    fn swap_buffers(&mut self) {
        self.presented += 1;
        self.time += self.frame_time;
    }

    fn poll_events(&mut self) -> Vec<HostEvent> {
        self.events.pop_front().unwrap_or_default()
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    fn gamepad(&self, index: usize) -> Option<GamepadState> {
        self.pads.get(index).copied().flatten()
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (SCREEN_WIDTH * 2, SCREEN_HEIGHT * 2)
    }

    fn draw_frame(&mut self, _frame: &FrameBuffer, _quad: Rect) {
        self.frames_drawn += 1;
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.rects.push((rect, color));
    }

    fn export_animation(&mut self, frames: Vec<FrameBuffer>) {
        self.animations.push(frames.len());
    }
}

/// Minimal iNES image; `tag` makes the content hash unique per test.
pub fn rom_image(battery: bool, tag: u8) -> Vec<u8> {
    let mut data = vec![0u8; 16 + 0x4000 + 0x2000];
    data[..4].copy_from_slice(b"NES\x1A");
    data[4] = 1;
    data[5] = 1;
    data[6] = if battery { 0x02 } else { 0x00 };
    data[16] = tag;
    data
}

pub struct Fixture {
    pub dir: TempDir,
    pub probe: SharedProbe,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            probe: SharedProbe::default(),
        }
    }

    pub fn save_dir(&self) -> PathBuf {
        self.dir.path().join("saves")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.path().join("config").join("settings.toml")
    }

    pub fn write_rom(&self, name: &str, battery: bool, tag: u8) -> (PathBuf, Vec<u8>) {
        let path = self.dir.path().join(name);
        let image = rom_image(battery, tag);
        fs::write(&path, &image).unwrap();
        (path, image)
    }

    pub fn log(&self) -> Vec<String> {
        self.probe.borrow().log.clone()
    }

    pub fn director(&self) -> Director<FakeHost> {
        self.director_with(FakeHost::default())
    }

    pub fn director_with(&self, host: FakeHost) -> Director<FakeHost> {
        let mut audio = AudioSink::with_capacity(1024);
        // The device side is not exercised here; negotiation only has to
        // succeed so consoles receive a sender.
        let _callback = audio.attach_output(OutputFormat {
            sample_rate: 44_100,
            channels: 2,
        });
        Director::new(
            host,
            audio,
            Box::new(FakeLoader {
                probe: Rc::clone(&self.probe),
            }),
            SaveStore::new(self.save_dir()),
            self.settings_path(),
        )
    }
}

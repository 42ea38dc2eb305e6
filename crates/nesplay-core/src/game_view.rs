use crate::audio::AudioVolume;
use crate::console::{Console, Player};
use crate::host::{
    FrameBuffer, HostEvent, Key, KeyAction, Modifiers, Rect, Rgba, SCREEN_HEIGHT, SCREEN_WIDTH,
    letterbox,
};
use crate::input;
use crate::settings::Settings;
use crate::storage::{ContentHash, SaveSlot, SaveStore};
use crate::view::{Transition, View, ViewContext};
use crate::volume::VolumeController;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Frame deltas above this are treated as a stall (window drag, resume from
/// sleep) and the console is not advanced for that frame.
pub const MAX_FRAME_DELTA: f64 = 1.0;

/// Ten seconds of frames; a recording stops by itself once it holds this many.
pub const MAX_RECORDED_FRAMES: usize = 600;

const VOLUME_INDICATOR: Rect = Rect::new(0.65, -0.95, 0.3, 0.05);

/// One gameplay session for a loaded program image.
pub struct GameView {
    console: Box<dyn Console>,
    hash: ContentHash,
    title: String,
    store: SaveStore,
    settings: Settings,
    volume: VolumeController,
    recording: bool,
    frames: Vec<FrameBuffer>,
    focused: bool,
}

impl GameView {
    pub fn new(
        console: Box<dyn Console>,
        hash: ContentHash,
        title: &str,
        store: SaveStore,
        settings_path: PathBuf,
        output: Arc<AudioVolume>,
    ) -> Self {
        let mut settings = Settings::new(settings_path);
        let volume = VolumeController::new(output, &mut settings);
        Self {
            console,
            hash,
            title: format!("{title}  /  Save Alt+[0-9]  /  Load [0-9]"),
            store,
            settings,
            volume,
            recording: false,
            frames: Vec::new(),
            focused: false,
        }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn console(&self) -> &dyn Console {
        self.console.as_ref()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn recorded_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn volume(&self) -> &VolumeController {
        &self.volume
    }

    fn restore(&mut self) {
        let snapshot = self.store.snapshot_path(&self.hash);
        match self.console.load_snapshot(&snapshot) {
            Ok(()) => {
                info!("Resumed from {}", snapshot.display());
                return;
            }
            Err(e) => debug!("No snapshot at {}: {e}", snapshot.display()),
        }

        self.console.reset();

        if self.console.cartridge().has_battery() {
            match self.store.read_sram(&self.hash) {
                Ok(sram) => {
                    self.console.cartridge_mut().load_sram(&sram);
                    info!("Loaded SRAM for {}", self.hash);
                }
                Err(e) => debug!("No SRAM for {}: {e}", self.hash),
            }
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.ensure_dir() {
            warn!(
                "Failed to create save directory {}: {e}",
                self.store.base().display()
            );
        }

        if self.console.cartridge().has_battery()
            && let Err(e) = self
                .store
                .write_sram(&self.hash, &self.console.cartridge().sram)
        {
            warn!("Failed to write SRAM for {}: {e}", self.hash);
        }

        let snapshot = self.store.snapshot_path(&self.hash);
        if let Err(e) = self.console.save_snapshot(&snapshot) {
            warn!("Failed to write snapshot {}: {e}", snapshot.display());
        }

        if let Err(e) = self.settings.save() {
            warn!("{e}");
        }
    }

    fn save_slot(&mut self, slot: SaveSlot) {
        if let Err(e) = self.store.ensure_dir() {
            warn!(
                "Failed to create save directory {}: {e}",
                self.store.base().display()
            );
            return;
        }
        let path = self.store.slot_path(&self.hash, slot);
        match self.console.save_snapshot(&path) {
            Ok(()) => info!("Saved slot {}", slot.index()),
            Err(e) => warn!("Failed to save slot {}: {e}", slot.index()),
        }
    }

    fn load_slot(&mut self, slot: SaveSlot) {
        let path = self.store.slot_path(&self.hash, slot);
        if !path.is_file() {
            debug!("Slot {} is empty", slot.index());
            return;
        }
        match self.console.load_snapshot(&path) {
            Ok(()) => info!("Loaded slot {}", slot.index()),
            Err(e) => warn!("Failed to load slot {}: {e}", slot.index()),
        }
    }

    fn toggle_recording(&mut self, ctx: &mut ViewContext<'_>) {
        if self.recording {
            self.finish_recording(ctx);
        } else {
            self.recording = true;
            info!("Recording started");
        }
    }

    fn finish_recording(&mut self, ctx: &mut ViewContext<'_>) {
        if !self.recording {
            return;
        }
        self.recording = false;
        let frames = std::mem::take(&mut self.frames);
        info!("Recording stopped after {} frames", frames.len());
        ctx.host.export_animation(frames);
    }

    fn update_controllers(&mut self, ctx: &ViewContext<'_>) {
        let turbo = input::turbo_phase(self.console.frame_count());
        let keys = input::keyboard_buttons(&*ctx.host, turbo);
        let pad1 = input::gamepad_buttons(ctx.host.gamepad(0), turbo);
        let pad2 = input::gamepad_buttons(ctx.host.gamepad(1), turbo);
        self.console.set_buttons(Player::One, keys.union(pad1));
        self.console.set_buttons(Player::Two, pad2);
    }

    fn on_key_press(&mut self, ctx: &mut ViewContext<'_>, key: Key, modifiers: Modifiers) {
        match key {
            Key::P => ctx.host.screenshot(self.console.frame_buffer()),
            Key::R => self.console.reset(),
            Key::Tab => self.toggle_recording(ctx),
            Key::PageUp => self.volume.up(),
            Key::PageDown => self.volume.down(),
            Key::Digit(n) => {
                let Some(slot) = SaveSlot::new(n) else {
                    return;
                };
                if modifiers.is_alt_only() {
                    self.save_slot(slot);
                } else if modifiers.is_empty() {
                    self.load_slot(slot);
                }
            }
            _ => {}
        }
    }
}

impl View for GameView {
    fn enter(&mut self, ctx: &mut ViewContext<'_>) {
        ctx.host.set_clear_color(Rgba::BLACK);
        ctx.host.set_title(&self.title);
        self.console.set_audio_sink(ctx.audio.sender());
        self.focused = ctx.host.is_focused();

        self.settings.load();
        self.restore();
    }

    fn exit(&mut self, ctx: &mut ViewContext<'_>) {
        self.focused = false;
        self.finish_recording(ctx);
        self.console.set_audio_sink(None);
        self.persist();
    }

    fn update(&mut self, ctx: &mut ViewContext<'_>, _t: f64, dt: f64) {
        let dt = if dt > MAX_FRAME_DELTA { 0.0 } else { dt };

        if self.focused {
            if input::menu_requested(&*ctx.host) {
                ctx.request(Transition::ShowMenu);
            } else {
                self.update_controllers(ctx);
                self.console.step_seconds(dt);
            }
        }

        let (width, height) = ctx.host.framebuffer_size();
        let quad = letterbox(width, height, SCREEN_WIDTH, SCREEN_HEIGHT);
        ctx.host.draw_frame(self.console.frame_buffer(), quad);
        if self.recording {
            self.frames.push(self.console.frame_buffer().clone());
            if self.frames.len() >= MAX_RECORDED_FRAMES {
                info!("Recording reached {MAX_RECORDED_FRAMES} frames");
                self.finish_recording(ctx);
            }
        }

        self.volume.update(dt);
        self.volume.draw(&mut *ctx.host, VOLUME_INDICATOR);
    }

    fn handle_event(&mut self, ctx: &mut ViewContext<'_>, event: &HostEvent) {
        match *event {
            HostEvent::Focus(focused) => self.focused = focused,
            HostEvent::Key {
                key,
                action: KeyAction::Press,
                modifiers,
            } => self.on_key_press(ctx, key, modifiers),
            HostEvent::Key {
                key: Key::PageUp,
                action: KeyAction::Repeat,
                ..
            } => self.volume.up(),
            HostEvent::Key {
                key: Key::PageDown,
                action: KeyAction::Repeat,
                ..
            } => self.volume.down(),
            HostEvent::Key { .. } => {}
        }
    }
}

impl Drop for GameView {
    fn drop(&mut self) {
        self.volume.unregister(&mut self.settings);
    }
}

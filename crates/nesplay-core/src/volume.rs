use crate::audio::AudioVolume;
use crate::host::{Host, Rect, Rgba};
use crate::settings::{ParticipantId, Settings};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// Minimal and maximal volume level.
pub const MIN_VOLUME_LEVEL: u8 = 0;
pub const MAX_VOLUME_LEVEL: u8 = 100;
pub const VOLUME_STEP: u8 = 10;

// The indicator timer counts down from HIDE_TIME: (B, HIDE_TIME] fades in,
// [A, B] is fully visible, (0, A) fades out.
const HIDE_TIME: f64 = 1.0;
const HIDE_A: f64 = 0.1;
const HIDE_B: f64 = 0.9;

const INDICATOR_ALPHA: f64 = 150.0;
const LEVEL_COLOR: [u8; 3] = [17, 245, 34];
const REMAINDER_COLOR: [u8; 3] = [219, 29, 20];

/// Audio scalar for a level: `(level / max)^2`.
pub fn level_to_scalar(level: u8) -> f32 {
    let normed = f32::from(level) / f32::from(MAX_VOLUME_LEVEL);
    normed * normed
}

/// Clamp into range and snap down to a step boundary.
pub fn sanitize_level(level: u8) -> u8 {
    let clamped = level.clamp(MIN_VOLUME_LEVEL, MAX_VOLUME_LEVEL);
    clamped - clamped % VOLUME_STEP
}

fn alpha_curve(t: f64) -> f64 {
    if t < HIDE_A {
        return t / HIDE_A;
    }
    if t > HIDE_B {
        return (HIDE_TIME - t) / (HIDE_TIME - HIDE_B);
    }
    1.0
}

/// Discrete volume level with a transient on-screen indicator.
pub struct VolumeController {
    level: Rc<Cell<u8>>,
    output: Arc<AudioVolume>,
    hide_timer: f64,
}

impl VolumeController {
    pub const SETTING_ID: ParticipantId = "volume";

    /// Create a controller at full volume and register it with `settings`.
    pub fn new(output: Arc<AudioVolume>, settings: &mut Settings) -> Self {
        let level = Rc::new(Cell::new(MAX_VOLUME_LEVEL));

        let load_level = Rc::clone(&level);
        let load_output = Arc::clone(&output);
        let save_level = Rc::clone(&level);
        settings.register(
            Self::SETTING_ID,
            move |record| {
                let level = sanitize_level(record.volume_level);
                load_level.set(level);
                load_output.set(level_to_scalar(level));
            },
            move |record| record.volume_level = save_level.get(),
        );

        Self {
            level,
            output,
            hide_timer: 0.0,
        }
    }

    pub fn unregister(&self, settings: &mut Settings) {
        settings.unregister(Self::SETTING_ID);
    }

    pub fn level(&self) -> u8 {
        self.level.get()
    }

    pub fn hide_timer(&self) -> f64 {
        self.hide_timer
    }

    pub fn is_visible(&self) -> bool {
        self.hide_timer > 0.0
    }

    /// Raise the level by one step, if possible.
    pub fn up(&mut self) {
        let level = self.level.get();
        if level < MAX_VOLUME_LEVEL {
            self.level.set(level + VOLUME_STEP);
            self.apply();
        }
        self.run_hide_timer();
    }

    /// Lower the level by one step, if possible.
    pub fn down(&mut self) {
        let level = self.level.get();
        if level > MIN_VOLUME_LEVEL {
            self.level.set(level - VOLUME_STEP);
            self.apply();
        }
        self.run_hide_timer();
    }

    /// Push the current level to the audio output.
    pub fn apply(&self) {
        self.output.set(level_to_scalar(self.level.get()));
    }

    fn run_hide_timer(&mut self) {
        // (-inf, 0]
        if self.hide_timer <= 0.0 {
            self.hide_timer = HIDE_TIME;
            return;
        }

        // (0, A): fading out, jump to the same brightness on the fade-in side.
        if self.hide_timer < HIDE_A {
            self.hide_timer = HIDE_TIME - self.hide_timer;
            return;
        }

        // [A, B]
        if self.hide_timer <= HIDE_B {
            self.hide_timer = HIDE_B;
        }

        // (B, HIDE_TIME]: still fading in.
    }

    pub fn update(&mut self, dt: f64) {
        if self.hide_timer > 0.0 {
            self.hide_timer = (self.hide_timer - dt).max(0.0);
        }
    }

    /// Draw the level bar inside `area`; nothing once the indicator is hidden.
    pub fn draw(&self, host: &mut dyn Host, area: Rect) {
        if self.hide_timer <= 0.0 {
            return;
        }

        let normed = f32::from(self.level.get()) / f32::from(MAX_VOLUME_LEVEL);
        let alpha = (INDICATOR_ALPHA * alpha_curve(self.hide_timer)).round() as u8;

        let [r, g, b] = LEVEL_COLOR;
        host.fill_rect(
            Rect::new(area.x, area.y, area.w * normed, area.h),
            Rgba::new(r, g, b, alpha),
        );

        let [r, g, b] = REMAINDER_COLOR;
        host.fill_rect(
            Rect::new(area.x + area.w * normed, area.y, area.w * (1.0 - normed), area.h),
            Rgba::new(r, g, b, alpha),
        );
    }
}

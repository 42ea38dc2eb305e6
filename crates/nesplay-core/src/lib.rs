//! Runtime shell for an NES emulator front-end.
//!
//! This crate holds the platform-agnostic parts of the front-end: the real-time
//! audio pipeline, the view scheduler and the persistence of save states, SRAM
//! and settings. The emulation core and the window/renderer are collaborators
//! reached through the [`console::Console`] and [`host::Host`] traits; the
//! desktop frontend lives in a separate crate.

/// Mono sample sink shared between the emulation thread and the audio device.
pub mod audio;

/// Lock-free single-producer / single-consumer sample ring.
pub mod audio_queue;

/// iNES header metadata and battery-backed SRAM.
pub mod cartridge;

/// Emulation core collaborator interface.
pub mod console;

/// Frame clock and view switching.
pub mod director;

/// Gameplay view: session lifecycle, input routing and quick-save slots.
pub mod game_view;

/// Window, renderer and input collaborator interface.
pub mod host;

/// Keyboard and gamepad to controller mapping.
pub mod input;

/// Content selection view.
pub mod menu_view;

/// Persistent application settings.
pub mod settings;

/// Save-state and SRAM file layout keyed by content hash.
pub mod storage;

/// View lifecycle trait and transition requests.
pub mod view;

/// Volume level control and on-screen indicator.
pub mod volume;

use crate::audio::AudioSink;
use crate::console::{ConsoleError, ConsoleLoader};
use crate::game_view::GameView;
use crate::host::Host;
use crate::menu_view::MenuView;
use crate::storage::{ContentHash, SaveStore};
use crate::view::{Transition, View, ViewContext};
use log::{error, info};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to load {}: {source}", .path.display())]
    Console { path: PathBuf, source: ConsoleError },
}

/// The view the director is currently driving.
pub enum ActiveView {
    /// The director's long-lived menu.
    Menu,
    Game(Box<GameView>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Menu,
    Game,
}

/// Owns the frame clock and switches between the menu and game views.
pub struct Director<H: Host> {
    host: H,
    audio: AudioSink,
    loader: Box<dyn ConsoleLoader>,
    store: SaveStore,
    settings_path: PathBuf,
    menu: MenuView,
    active: Option<ActiveView>,
    transition: Option<Transition>,
    timestamp: f64,
}

impl<H: Host> Director<H> {
    pub fn new(
        host: H,
        audio: AudioSink,
        loader: Box<dyn ConsoleLoader>,
        store: SaveStore,
        settings_path: PathBuf,
    ) -> Self {
        let timestamp = host.now();
        Self {
            host,
            audio,
            loader,
            store,
            settings_path,
            menu: MenuView::new(Vec::new()),
            active: None,
            transition: None,
            timestamp,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn audio(&self) -> &AudioSink {
        &self.audio
    }

    pub fn menu(&self) -> &MenuView {
        &self.menu
    }

    pub fn active_view(&self) -> Option<ViewKind> {
        self.active.as_ref().map(|view| match view {
            ActiveView::Menu => ViewKind::Menu,
            ActiveView::Game(_) => ViewKind::Game,
        })
    }

    pub fn game(&self) -> Option<&GameView> {
        match &self.active {
            Some(ActiveView::Game(game)) => Some(game),
            _ => None,
        }
    }

    /// Exit the current view, then enter `view`.
    ///
    /// Switching to the view that is already active still runs both hooks.
    /// The frame clock restarts at the switch point.
    pub fn set_view(&mut self, view: Option<ActiveView>) {
        self.with_active(|view, ctx| view.exit(ctx));
        self.active = view;
        self.with_active(|view, ctx| view.enter(ctx));
        self.timestamp = self.host.now();
    }

    pub fn show_menu(&mut self) {
        self.set_view(Some(ActiveView::Menu));
    }

    /// Load the image at `path` and switch to a new game session for it.
    pub fn play_game(&mut self, path: &Path) -> Result<(), LaunchError> {
        let image = std::fs::read(path).map_err(|source| LaunchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let hash = ContentHash::of(&image);
        let console = self
            .loader
            .load(path, &image)
            .map_err(|source| LaunchError::Console {
                path: path.to_path_buf(),
                source,
            })?;

        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("Starting {title} ({hash})");

        let game = GameView::new(
            console,
            hash,
            &title,
            self.store.clone(),
            self.settings_path.clone(),
            self.audio.volume_handle(),
        );
        self.set_view(Some(ActiveView::Game(Box::new(game))));
        Ok(())
    }

    /// One-time choice of the first view: a single target starts playing
    /// right away, anything else opens the menu.
    pub fn bootstrap(&mut self, paths: Vec<PathBuf>) -> Result<(), LaunchError> {
        self.menu = MenuView::new(paths);
        if let [path] = self.menu.paths() {
            let path = path.clone();
            self.play_game(&path)
        } else {
            self.show_menu();
            Ok(())
        }
    }

    pub fn start(&mut self, paths: Vec<PathBuf>) -> Result<(), LaunchError> {
        self.bootstrap(paths)?;
        self.run();
        Ok(())
    }

    /// Advance the active view by the wall-clock time since the last step.
    pub fn step(&mut self) {
        self.host.clear();
        let now = self.host.now();
        let dt = now - self.timestamp;
        self.timestamp = now;
        self.with_active(|view, ctx| view.update(ctx, now, dt));
        self.apply_transition();
    }

    /// Main loop. Tears the active view down once the host asks to close.
    ///
    /// Events polled after a view switch in the same batch are dropped; they
    /// were aimed at the view that just exited.
    pub fn run(&mut self) {
        while !self.host.should_close() {
            self.step();
            self.host.swap_buffers();
            for event in self.host.poll_events() {
                self.with_active(|view, ctx| view.handle_event(ctx, &event));
                if self.apply_transition() {
                    break;
                }
            }
        }
        self.set_view(None);
    }

    /// Returns whether the active view changed.
    fn apply_transition(&mut self) -> bool {
        match self.transition.take() {
            Some(Transition::ShowMenu) => {
                self.show_menu();
                true
            }
            Some(Transition::PlayGame(path)) => match self.play_game(&path) {
                Ok(()) => true,
                Err(e) => {
                    error!("{e}");
                    false
                }
            },
            None => false,
        }
    }

    fn with_active<R>(
        &mut self,
        f: impl FnOnce(&mut dyn View, &mut ViewContext<'_>) -> R,
    ) -> Option<R> {
        let Self {
            host,
            audio,
            menu,
            active,
            transition,
            ..
        } = self;
        let view: &mut dyn View = match active.as_mut()? {
            ActiveView::Menu => menu,
            ActiveView::Game(game) => game.as_mut(),
        };
        let mut ctx = ViewContext::new(host, audio, transition);
        Some(f(view, &mut ctx))
    }
}

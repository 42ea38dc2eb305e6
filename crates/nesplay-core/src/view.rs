use crate::audio::AudioSink;
use crate::host::{Host, HostEvent};
use std::path::PathBuf;

/// View switch requested by the active view, applied by the director once
/// the current call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    ShowMenu,
    PlayGame(PathBuf),
}

/// What a view can reach while it is being driven.
pub struct ViewContext<'a> {
    pub host: &'a mut dyn Host,
    pub audio: &'a AudioSink,
    transition: &'a mut Option<Transition>,
}

impl<'a> ViewContext<'a> {
    pub fn new(
        host: &'a mut dyn Host,
        audio: &'a AudioSink,
        transition: &'a mut Option<Transition>,
    ) -> Self {
        Self {
            host,
            audio,
            transition,
        }
    }

    /// Ask for a view switch. The first request per call wins.
    pub fn request(&mut self, transition: Transition) {
        if self.transition.is_none() {
            *self.transition = Some(transition);
        }
    }
}

/// Lifecycle of an application view: `enter`, any number of `update` calls
/// and host events, then `exit`.
///
/// Host events reach a view only while it is active, so `enter`/`exit` are
/// where a view starts and stops observing input.
pub trait View {
    fn enter(&mut self, ctx: &mut ViewContext<'_>);

    fn exit(&mut self, ctx: &mut ViewContext<'_>);

    fn update(&mut self, ctx: &mut ViewContext<'_>, t: f64, dt: f64);

    fn handle_event(&mut self, _ctx: &mut ViewContext<'_>, _event: &HostEvent) {}
}

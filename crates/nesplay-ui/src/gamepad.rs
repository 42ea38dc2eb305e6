use gilrs::{Axis, Button, EventType, Gamepad, GamepadId, Gilrs};
use log::{info, warn};
use nesplay_core::host::GamepadState;

const PLAYER_SLOTS: usize = 2;

/// Gamepads assigned to the two controller ports in connection order.
pub struct Gamepads {
    gilrs: Option<Gilrs>,
    slots: [Option<GamepadId>; PLAYER_SLOTS],
    states: [Option<GamepadState>; PLAYER_SLOTS],
}

impl Gamepads {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                warn!("Failed to initialize gamepad support: {e}");
                None
            }
        };

        let mut pads = Self {
            gilrs,
            slots: [None; PLAYER_SLOTS],
            states: [None; PLAYER_SLOTS],
        };
        let present: Vec<GamepadId> = pads
            .gilrs
            .iter()
            .flat_map(|g| g.gamepads().map(|(id, _)| id))
            .collect();
        for id in present {
            pads.assign(id);
        }
        pads.refresh();
        pads
    }

    /// Drain pending gamepad events and sample every assigned pad.
    pub fn poll(&mut self) {
        let mut events = Vec::new();
        if let Some(gilrs) = self.gilrs.as_mut() {
            while let Some(event) = gilrs.next_event() {
                events.push((event.id, event.event));
            }
        }

        for (id, event) in events {
            match event {
                EventType::Connected => self.assign(id),
                EventType::Disconnected => {
                    for (slot, assigned) in self.slots.iter_mut().enumerate() {
                        if *assigned == Some(id) {
                            info!("Gamepad {id} (player {}) disconnected", slot + 1);
                            *assigned = None;
                        }
                    }
                }
                _ => {}
            }
        }
        self.refresh();
    }

    pub fn state(&self, index: usize) -> Option<GamepadState> {
        self.states.get(index).copied().flatten()
    }

    fn assign(&mut self, id: GamepadId) {
        if self.slots.contains(&Some(id)) {
            return;
        }
        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = Some(id);
                info!("Gamepad {id} connected as player {}", slot + 1);
            }
            None => warn!("Gamepad {id} connected but both ports are taken"),
        }
    }

    fn refresh(&mut self) {
        let Some(gilrs) = self.gilrs.as_ref() else {
            return;
        };
        for (state, slot) in self.states.iter_mut().zip(self.slots) {
            *state = slot
                .and_then(|id| gilrs.connected_gamepad(id))
                .map(|pad| read_state(&pad));
        }
    }
}

fn read_state(pad: &Gamepad<'_>) -> GamepadState {
    let btn = |button: Button| pad.is_pressed(button);
    GamepadState {
        south: btn(Button::South),
        east: btn(Button::East),
        west: btn(Button::West),
        north: btn(Button::North),
        select: btn(Button::Select),
        start: btn(Button::Start),
        left_shoulder: btn(Button::LeftTrigger),
        right_shoulder: btn(Button::RightTrigger),
        dpad_up: btn(Button::DPadUp),
        dpad_down: btn(Button::DPadDown),
        dpad_left: btn(Button::DPadLeft),
        dpad_right: btn(Button::DPadRight),
        left_stick_x: pad.value(Axis::LeftStickX),
        left_stick_y: pad.value(Axis::LeftStickY),
    }
}

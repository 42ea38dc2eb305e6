use crate::console::Buttons;
use crate::host::{GamepadState, Host, Key};

const STICK_THRESHOLD: f32 = 0.5;

/// Turbo buttons are held for the first half of every six-frame window.
#[inline]
pub fn turbo_phase(frame: u64) -> bool {
    frame % 6 < 3
}

pub fn keyboard_buttons(host: &dyn Host, turbo: bool) -> Buttons {
    let mut buttons = Buttons::NONE;
    buttons.set(
        Buttons::A,
        host.key_down(Key::Z) || (turbo && host.key_down(Key::A)),
    );
    buttons.set(
        Buttons::B,
        host.key_down(Key::X) || (turbo && host.key_down(Key::S)),
    );
    buttons.set(Buttons::SELECT, host.key_down(Key::RightShift));
    buttons.set(Buttons::START, host.key_down(Key::Enter));
    buttons.set(Buttons::UP, host.key_down(Key::Up));
    buttons.set(Buttons::DOWN, host.key_down(Key::Down));
    buttons.set(Buttons::LEFT, host.key_down(Key::Left));
    buttons.set(Buttons::RIGHT, host.key_down(Key::Right));
    buttons
}

pub fn gamepad_buttons(pad: Option<GamepadState>, turbo: bool) -> Buttons {
    let Some(pad) = pad else {
        return Buttons::NONE;
    };

    let mut buttons = Buttons::NONE;
    buttons.set(Buttons::A, pad.south || (turbo && pad.west));
    buttons.set(Buttons::B, pad.east || (turbo && pad.north));
    buttons.set(Buttons::SELECT, pad.select);
    buttons.set(Buttons::START, pad.start);
    buttons.set(
        Buttons::UP,
        pad.dpad_up || pad.left_stick_y > STICK_THRESHOLD,
    );
    buttons.set(
        Buttons::DOWN,
        pad.dpad_down || pad.left_stick_y < -STICK_THRESHOLD,
    );
    buttons.set(
        Buttons::LEFT,
        pad.dpad_left || pad.left_stick_x < -STICK_THRESHOLD,
    );
    buttons.set(
        Buttons::RIGHT,
        pad.dpad_right || pad.left_stick_x > STICK_THRESHOLD,
    );
    buttons
}

/// Both shoulder buttons held together.
pub fn reset_gesture(pad: Option<GamepadState>) -> bool {
    pad.is_some_and(|p| p.left_shoulder && p.right_shoulder)
}

/// Escape or the reset gesture on either of the first two gamepads.
pub fn menu_requested(host: &dyn Host) -> bool {
    reset_gesture(host.gamepad(0)) || reset_gesture(host.gamepad(1)) || host.key_down(Key::Escape)
}

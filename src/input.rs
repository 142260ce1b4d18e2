use bevy::prelude::*;

use crate::game::InputSnapshot;

/// The polled snapshot the state machine consumes this frame. Rebuilt from
/// the keyboard every `PreUpdate`; the UI layer may fill `clicked_choice`
/// before the game tick runs.
#[derive(Resource, Default)]
pub struct PendingInput(pub InputSnapshot);

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PendingInput::default()).add_systems(
            PreUpdate,
            keyboard_to_snapshot.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

const DIGIT_KEYS: [(KeyCode, u8); 10] = [
    (KeyCode::Digit0, 0),
    (KeyCode::Digit1, 1),
    (KeyCode::Digit2, 2),
    (KeyCode::Digit3, 3),
    (KeyCode::Digit4, 4),
    (KeyCode::Digit5, 5),
    (KeyCode::Digit6, 6),
    (KeyCode::Digit7, 7),
    (KeyCode::Digit8, 8),
    (KeyCode::Digit9, 9),
];

fn keyboard_to_snapshot(keyboard: Res<ButtonInput<KeyCode>>, mut pending: ResMut<PendingInput>) {
    let mut snap = InputSnapshot {
        left: keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft),
        right: keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight),
        down: keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown),
        jump: keyboard.pressed(KeyCode::Space)
            || keyboard.pressed(KeyCode::KeyW)
            || keyboard.pressed(KeyCode::ArrowUp),
        confirm: keyboard.pressed(KeyCode::Enter),
        backspace: keyboard.pressed(KeyCode::Backspace),
        escape: keyboard.pressed(KeyCode::Escape),
        digit: None,
        reset: keyboard.just_pressed(KeyCode::KeyR),
        level_select: None,
        clicked_choice: None,
    };

    for (key, value) in DIGIT_KEYS {
        if keyboard.just_pressed(key) {
            snap.digit = Some(value);
            if (1..=5).contains(&value) {
                snap.level_select = Some(value as usize - 1);
            }
        }
    }

    pending.0 = snap;
}

use bevy::{
    input::touch::{TouchInput, TouchPhase},
    prelude::*,
    window::{CursorMoved, PrimaryWindow},
};

use crate::picking::PickingSettings;

pub struct PointerInputPlugin;

impl Plugin for PointerInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PickingSettings>()
            .add_message::<PointerAction>()
            .configure_sets(
                Update,
                crate::DropzoneSet::Input.before(crate::DropzoneSet::Dispatch),
            )
            .add_systems(
                Update,
                (read_mouse_input, read_touch_input).in_set(crate::DropzoneSet::Input),
            );
    }
}

// ---------------------------------------------------------------------------
// Pointer data
// ---------------------------------------------------------------------------

/// Device-independent pointer input, already in normalized device coordinates.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum PointerAction {
    Press(Vec2),
    Move(Vec2),
    Release,
}

/// Latest known pointer position in NDC. Read once per frame while dragging.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub ndc: Vec2,
}

/// Convert a window-space position (origin top-left, Y down) into normalized
/// device coordinates (`[-1, 1]` on both axes, Y up).
pub fn screen_to_ndc(position: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        (position.x / viewport.x) * 2.0 - 1.0,
        -(position.y / viewport.y) * 2.0 + 1.0,
    )
}

fn window_ndc(window: &Window, position: Vec2) -> Option<Vec2> {
    let size = window.size();
    // Minimized windows report a zero-sized viewport.
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    Some(screen_to_ndc(position, size))
}

// ---------------------------------------------------------------------------
// Device readers
// ---------------------------------------------------------------------------

/// Mouse press picks up or drops; the button release is not an action.
pub fn read_mouse_input(
    settings: Res<PickingSettings>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut cursor_moved: MessageReader<CursorMoved>,
    windows: Query<&Window>,
    primary_window: Query<&Window, With<PrimaryWindow>>,
    mut actions: MessageWriter<PointerAction>,
) {
    if !settings.mouse {
        cursor_moved.read().count();
        return;
    }

    for moved in cursor_moved.read() {
        let Ok(window) = windows.get(moved.window) else {
            continue;
        };
        if let Some(ndc) = window_ndc(window, moved.position) {
            actions.write(PointerAction::Move(ndc));
        }
    }

    if !mouse.just_pressed(settings.button) {
        return;
    }
    let Ok(window) = primary_window.single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    if let Some(ndc) = window_ndc(window, cursor_pos) {
        actions.write(PointerAction::Press(ndc));
    }
}

/// Only the first finger down is tracked; other touches are ignored until it lifts.
pub fn read_touch_input(
    settings: Res<PickingSettings>,
    mut touches: MessageReader<TouchInput>,
    windows: Query<&Window>,
    mut primary_touch: Local<Option<u64>>,
    mut actions: MessageWriter<PointerAction>,
) {
    if !settings.touch {
        touches.read().count();
        return;
    }

    for touch in touches.read() {
        let ndc = windows
            .get(touch.window)
            .ok()
            .and_then(|window| window_ndc(window, touch.position));

        match touch.phase {
            TouchPhase::Started => {
                if primary_touch.is_some() {
                    continue;
                }
                let Some(ndc) = ndc else {
                    continue;
                };
                *primary_touch = Some(touch.id);
                actions.write(PointerAction::Press(ndc));
            }
            TouchPhase::Moved => {
                if *primary_touch != Some(touch.id) {
                    continue;
                }
                if let Some(ndc) = ndc {
                    actions.write(PointerAction::Move(ndc));
                }
            }
            TouchPhase::Ended | TouchPhase::Canceled => {
                if *primary_touch != Some(touch.id) {
                    continue;
                }
                *primary_touch = None;
                actions.write(PointerAction::Release);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    #[test]
    fn corners_and_centre() {
        assert_eq!(screen_to_ndc(Vec2::ZERO, VIEWPORT), Vec2::new(-1.0, 1.0));
        assert_eq!(screen_to_ndc(VIEWPORT, VIEWPORT), Vec2::new(1.0, -1.0));
        assert_eq!(screen_to_ndc(VIEWPORT / 2.0, VIEWPORT), Vec2::ZERO);
    }

    #[test]
    fn y_is_inverted() {
        let upper = screen_to_ndc(Vec2::new(640.0, 100.0), VIEWPORT);
        let lower = screen_to_ndc(Vec2::new(640.0, 600.0), VIEWPORT);
        assert!(upper.y > lower.y);
    }

    #[test]
    fn normalization_is_deterministic() {
        let position = Vec2::new(317.25, 91.5);
        assert_eq!(screen_to_ndc(position, VIEWPORT), screen_to_ndc(position, VIEWPORT));
    }
}

use bevy::prelude::*;
use dropzone_camera::OrbitCameraSettings;

use crate::{
    Draggable,
    picking::{PickingSettings, ScenePicker},
    pointer::{PointerAction, PointerSample},
    surface::project_dragged_entity,
};

/// Drag state machine, camera toggling and per-frame ground projection.
/// Consumes [`PointerAction`] messages; pair with
/// [`PointerInputPlugin`](crate::pointer::PointerInputPlugin) to feed it from devices.
pub struct DragPlugin;

impl Plugin for DragPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PickingSettings>()
            .init_resource::<PointerSample>()
            .init_resource::<DragState>()
            .add_message::<PointerAction>()
            .add_message::<DragTransition>()
            .configure_sets(
                Update,
                (crate::DropzoneSet::Dispatch, crate::DropzoneSet::Project).chain(),
            )
            .add_systems(
                Update,
                (
                    (
                        dispatch_pointer_actions,
                        sync_camera_control,
                    )
                        .chain()
                        .in_set(crate::DropzoneSet::Dispatch),
                    project_dragged_entity.in_set(crate::DropzoneSet::Project),
                ),
            )
            .add_observer(on_draggable_removed);
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// At most one entity is dragged at a time.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { entity: Entity },
}

/// Published whenever a drag session starts or ends.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragTransition {
    PickedUp(Entity),
    Dropped(Entity),
}

/// Moves another entity in lockstep with this one while it is dragged.
/// The companion's X/Z is set to the ground point plus `offset`.
#[derive(Component, Clone, Copy, Debug)]
pub struct Companion {
    pub entity: Entity,
    pub offset: Vec2,
}

impl Companion {
    pub fn new(entity: Entity, offset: Vec2) -> Self {
        Self { entity, offset }
    }
}

impl DragState {
    pub fn entity(&self) -> Option<Entity> {
        match *self {
            DragState::Idle => None,
            DragState::Dragging { entity } => Some(entity),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    /// Press toggles: while dragging it drops, otherwise it picks up whatever
    /// `target` resolves to. `target` is only evaluated when idle.
    pub fn press(&mut self, target: impl FnOnce() -> Option<Entity>) -> Option<DragTransition> {
        match *self {
            DragState::Dragging { entity } => {
                *self = DragState::Idle;
                Some(DragTransition::Dropped(entity))
            }
            DragState::Idle => {
                let entity = target()?;
                *self = DragState::Dragging { entity };
                Some(DragTransition::PickedUp(entity))
            }
        }
    }

    /// Ends the session wherever the pointer is.
    pub fn release(&mut self) -> Option<DragTransition> {
        let entity = self.entity()?;
        *self = DragState::Idle;
        Some(DragTransition::Dropped(entity))
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn dispatch_pointer_actions(
    mut actions: MessageReader<PointerAction>,
    mut drag: ResMut<DragState>,
    mut pointer: ResMut<PointerSample>,
    mut picker: ScenePicker,
    draggables: Query<(), With<Draggable>>,
    names: Query<&Name>,
    mut transitions: MessageWriter<DragTransition>,
) {
    for action in actions.read() {
        let transition = match *action {
            PointerAction::Move(ndc) => {
                pointer.ndc = ndc;
                None
            }
            PointerAction::Press(ndc) => {
                pointer.ndc = ndc;
                drag.press(|| {
                    // Only the nearest hit counts; anything behind it is ignored.
                    let nearest = picker.pick(ndc).first()?.entity;
                    draggables.contains(nearest).then_some(nearest)
                })
            }
            PointerAction::Release => drag.release(),
        };

        let Some(transition) = transition else {
            continue;
        };
        match transition {
            DragTransition::PickedUp(entity) => {
                info!("found draggable {}", display_name(entity, &names));
            }
            DragTransition::Dropped(entity) => {
                info!("dropping draggable {}", display_name(entity, &names));
            }
        }
        transitions.write(transition);
    }
}

/// Camera navigation is suspended for the whole drag session. Runs every
/// frame so cameras spawned or re-enabled mid-drag are caught too.
pub fn sync_camera_control(drag: Res<DragState>, mut cameras: Query<&mut OrbitCameraSettings>) {
    let enabled = !drag.is_dragging();
    for mut settings in &mut cameras {
        if settings.enabled != enabled {
            settings.enabled = enabled;
        }
    }
}

/// A held entity that stops being draggable (or is despawned) is dropped.
fn on_draggable_removed(
    trigger: On<Remove, Draggable>,
    mut drag: ResMut<DragState>,
    names: Query<&Name>,
    mut transitions: MessageWriter<DragTransition>,
) {
    let entity = trigger.event_target();
    if drag.entity() == Some(entity) {
        *drag = DragState::Idle;
        info!("dropping draggable {}", display_name(entity, &names));
        transitions.write(DragTransition::Dropped(entity));
    }
}

fn display_name(entity: Entity, names: &Query<&Name>) -> String {
    names
        .get(entity)
        .map(|name| name.as_str().to_string())
        .unwrap_or_else(|_| format!("{entity:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> Entity {
        World::new().spawn_empty().id()
    }

    #[test]
    fn press_on_nothing_stays_idle() {
        let mut drag = DragState::Idle;
        assert_eq!(drag.press(|| None), None);
        assert_eq!(drag, DragState::Idle);
    }

    #[test]
    fn press_on_target_starts_dragging() {
        let target = entity();
        let mut drag = DragState::Idle;
        assert_eq!(drag.press(|| Some(target)), Some(DragTransition::PickedUp(target)));
        assert_eq!(drag.entity(), Some(target));
        assert!(drag.is_dragging());
    }

    #[test]
    fn second_press_drops_without_picking() {
        let target = entity();
        let mut drag = DragState::Dragging { entity: target };
        let transition = drag.press(|| panic!("no pick while dragging"));
        assert_eq!(transition, Some(DragTransition::Dropped(target)));
        assert_eq!(drag, DragState::Idle);
    }

    #[test]
    fn release_only_ends_an_active_session() {
        let target = entity();
        let mut drag = DragState::Idle;
        assert_eq!(drag.release(), None);

        drag = DragState::Dragging { entity: target };
        assert_eq!(drag.release(), Some(DragTransition::Dropped(target)));
        assert_eq!(drag, DragState::Idle);
    }
}

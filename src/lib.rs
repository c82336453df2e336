pub mod drag;
pub mod picking;
pub mod pointer;
pub mod surface;

use bevy::prelude::*;
use dropzone_camera::OrbitCameraSet;

pub use drag::{Companion, DragPlugin, DragState, DragTransition};
pub use picking::{Intersection, PickRoot, PickingCamera, PickingSettings, ScenePicker};
pub use pointer::{PointerAction, PointerInputPlugin, PointerSample, screen_to_ndc};

/// Entities that can be picked up and carried across the ground.
#[derive(Component, Default)]
pub struct Draggable;

/// Surfaces a dragged entity may be dropped onto.
#[derive(Component, Default)]
pub struct Ground;

/// Per-frame ordering inside `Update`. Rendering follows after the main
/// schedule, so every frame sees input, then drag transitions, then the
/// ground projection, then a redraw.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropzoneSet {
    /// Device input translated into [`PointerAction`]s.
    Input,
    /// Press/release handling and camera toggling.
    Dispatch,
    /// Dragged entity follows the pointer across the ground.
    Project,
}

pub struct DropzonePlugin;

impl Plugin for DropzonePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((PointerInputPlugin, DragPlugin))
            .configure_sets(Update, DropzoneSet::Project.before(OrbitCameraSet));
    }
}

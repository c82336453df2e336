use bevy::prelude::*;

use crate::{
    Ground,
    drag::{Companion, DragState},
    picking::{Intersection, ScenePicker},
    pointer::PointerSample,
};

/// First hit on a ground surface. Closer non-ground hits (including the
/// dragged entity itself) are skipped.
pub fn first_ground_hit(hits: &[Intersection], is_ground: impl Fn(Entity) -> bool) -> Option<Vec3> {
    hits.iter().find(|hit| is_ground(hit.entity)).map(|hit| hit.point)
}

/// Move `translation` to `target` on the X/Z plane, plus `offset`. Height is kept.
pub fn snap_planar(translation: &mut Vec3, target: Vec3, offset: Vec2) {
    translation.x = target.x + offset.x;
    translation.z = target.z + offset.y;
}

/// Runs every frame. While dragging, follows the pointer across ground
/// surfaces; without a ground hit the entity stays where it is.
pub fn project_dragged_entity(
    drag: Res<DragState>,
    pointer: Res<PointerSample>,
    mut picker: ScenePicker,
    grounds: Query<(), With<Ground>>,
    companions: Query<&Companion>,
    mut transforms: Query<&mut Transform>,
) {
    let Some(entity) = drag.entity() else {
        return;
    };

    let hits = picker.pick(pointer.ndc);
    let Some(target) = first_ground_hit(&hits, |e| grounds.contains(e)) else {
        return;
    };

    if let Ok(mut transform) = transforms.get_mut(entity) {
        snap_planar(&mut transform.translation, target, Vec2::ZERO);
        trace!("{entity:?} snapped to ({:.2}, {:.2})", target.x, target.z);
    }

    let Ok(companion) = companions.get(entity).copied() else {
        return;
    };
    if companion.entity == entity {
        return;
    }
    if let Ok(mut transform) = transforms.get_mut(companion.entity) {
        snap_planar(&mut transform.translation, target, companion.offset);
    }
}

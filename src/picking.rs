//! Ray picking against the scene graph.
//!
//! A ray is built from a pointer position in normalized device coordinates and
//! cast against the rendered meshes with [`MeshRayCast`]. When a [`PickRoot`]
//! exists only its subtree takes part. Results come back nearest-first.

use std::collections::HashMap;

use bevy::{
    ecs::system::SystemParam,
    picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility},
    prelude::*,
};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Resource)]
pub struct PickingSettings {
    /// Translate mouse input into pointer actions.
    pub mouse: bool,
    /// Translate the primary touch into pointer actions.
    pub touch: bool,
    /// Mouse button that picks up and drops.
    pub button: MouseButton,
    /// Hits further along the ray than this are ignored.
    pub max_distance: f32,
}

impl Default for PickingSettings {
    fn default() -> Self {
        Self {
            mouse: true,
            touch: true,
            button: MouseButton::Left,
            max_distance: f32::INFINITY,
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Marks the camera rays are cast from.
#[derive(Component, Default)]
pub struct PickingCamera;

/// Marks the root of the pickable scene graph. When present, only meshes in
/// its subtree (itself included) are tested.
#[derive(Component, Default)]
pub struct PickRoot;

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// One hit along a pick ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    pub entity: Entity,
    /// World-space hit point.
    pub point: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Build a world-space ray through `ndc` for the given camera.
///
/// The direction comes from unprojecting the near and far planes, as
/// `Camera::viewport_to_world` does. Perspective rays start at the camera
/// position; other projections start on the near plane.
pub fn ray_from_ndc(
    ndc: Vec2,
    camera: &Camera,
    projection: &Projection,
    camera_transform: &GlobalTransform,
) -> Option<Ray3d> {
    if camera.clip_from_view().determinant() == 0.0 {
        return None;
    }
    let near = camera.ndc_to_world(camera_transform, ndc.extend(1.0))?;
    // Z = 0 unprojects to NaN with a reversed infinite projection.
    let far = camera.ndc_to_world(camera_transform, ndc.extend(f32::EPSILON))?;
    let direction = Dir3::new(far - near).ok()?;
    let origin = match projection {
        Projection::Perspective(_) => camera_transform.translation(),
        _ => near,
    };
    Some(Ray3d::new(origin, direction))
}

/// Depth-first order of every `PickRoot` subtree, children in order. A root
/// nested inside another root is only visited once.
pub fn traversal_order(
    roots: impl IntoIterator<Item = Entity>,
    children: &Query<&Children>,
) -> HashMap<Entity, usize> {
    let mut order = HashMap::new();
    let mut stack: Vec<Entity> = roots.into_iter().collect();
    stack.reverse();
    while let Some(entity) = stack.pop() {
        if order.contains_key(&entity) {
            continue;
        }
        order.insert(entity, order.len());
        if let Ok(entity_children) = children.get(entity) {
            stack.extend(entity_children.iter().rev());
        }
    }
    order
}

/// Sort hits nearest-first. Equal distances fall back to traversal order,
/// then to entity order, so identical scenes give identical results.
pub fn sort_hits(hits: &mut [Intersection], order: Option<&HashMap<Entity, usize>>) {
    let rank = |entity: &Entity| order.and_then(|order| order.get(entity).copied());
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| rank(&a.entity).cmp(&rank(&b.entity)))
            .then_with(|| a.entity.cmp(&b.entity))
    });
}

/// System param that answers pick queries against the current scene.
#[derive(SystemParam)]
pub struct ScenePicker<'w, 's> {
    cameras: Query<
        'w,
        's,
        (&'static Camera, &'static Projection, &'static GlobalTransform),
        With<PickingCamera>,
    >,
    ray_cast: MeshRayCast<'w, 's>,
    children: Query<'w, 's, &'static Children>,
    roots: Query<'w, 's, Entity, With<PickRoot>>,
    settings: Res<'w, PickingSettings>,
}

impl ScenePicker<'_, '_> {
    /// Ray through `ndc` from the picking camera. None without exactly one
    /// active picking camera.
    pub fn ray(&self, ndc: Vec2) -> Option<Ray3d> {
        let Ok((camera, projection, camera_transform)) = self.cameras.single() else {
            return None;
        };
        if !camera.is_active {
            return None;
        }
        ray_from_ndc(ndc, camera, projection, camera_transform)
    }

    /// All intersections under `ndc`, nearest-first. Empty when nothing is hit.
    pub fn pick(&mut self, ndc: Vec2) -> Vec<Intersection> {
        let Some(ray) = self.ray(ndc) else {
            return Vec::new();
        };

        let order = (!self.roots.is_empty())
            .then(|| traversal_order(self.roots.iter(), &self.children));
        let in_scene = |entity: Entity| {
            order
                .as_ref()
                .is_none_or(|order| order.contains_key(&entity))
        };
        let settings = MeshRayCastSettings::default()
            .with_visibility(RayCastVisibility::Any)
            .with_filter(&in_scene)
            .never_early_exit();

        let max_distance = self.settings.max_distance;
        let mut hits: Vec<Intersection> = self
            .ray_cast
            .cast_ray(ray, &settings)
            .iter()
            .filter(|(_, hit)| hit.distance <= max_distance)
            .map(|(entity, hit)| Intersection {
                entity: *entity,
                point: hit.point,
                distance: hit.distance,
            })
            .collect();
        sort_hits(&mut hits, order.as_ref());
        hits
    }
}

#[cfg(test)]
mod tests {
    use bevy::{camera::CameraProjection, ecs::system::SystemState};

    use super::*;

    fn entities<const N: usize>() -> [Entity; N] {
        let mut world = World::new();
        std::array::from_fn(|_| world.spawn_empty().id())
    }

    fn hit(entity: Entity, distance: f32) -> Intersection {
        Intersection { entity, point: Vec3::ZERO, distance }
    }

    fn top_down_camera() -> (Camera, Projection, GlobalTransform) {
        let perspective = PerspectiveProjection {
            fov: std::f32::consts::FRAC_PI_2,
            aspect_ratio: 1.0,
            ..default()
        };
        let mut camera = Camera::default();
        camera.computed.clip_from_view = perspective.get_clip_from_view();
        let transform = GlobalTransform::from(
            Transform::from_xyz(0.0, 50.0, 0.0).looking_at(Vec3::ZERO, Vec3::NEG_Z),
        );
        (camera, Projection::Perspective(perspective), transform)
    }

    #[test]
    fn perspective_ray_starts_at_camera() {
        let (camera, projection, transform) = top_down_camera();

        let centre = ray_from_ndc(Vec2::ZERO, &camera, &projection, &transform).unwrap();
        assert!((centre.origin - Vec3::new(0.0, 50.0, 0.0)).length() < 1e-4);
        assert!((centre.direction.as_vec3() - Vec3::NEG_Y).length() < 1e-4);

        // Screen right maps to +X, screen up to -Z for this camera.
        let corner = ray_from_ndc(Vec2::new(0.5, 0.5), &camera, &projection, &transform).unwrap();
        let t = 50.0 / -corner.direction.y;
        let ground = corner.get_point(t);
        assert!((ground.x - 25.0).abs() < 1e-3);
        assert!((ground.z + 25.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_projection_has_no_ray() {
        let (mut camera, projection, transform) = top_down_camera();
        camera.computed.clip_from_view = Mat4::ZERO;
        assert_eq!(ray_from_ndc(Vec2::ZERO, &camera, &projection, &transform), None);
    }

    #[test]
    fn hits_sorted_nearest_first() {
        let [a, b, c] = entities();
        let mut hits = [hit(a, 50.0), hit(b, 29.0), hit(c, 39.0)];
        sort_hits(&mut hits, None);
        let order: Vec<Entity> = hits.iter().map(|hit| hit.entity).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn equal_distances_follow_traversal_order() {
        let [a, b] = entities();
        // Spawn order differs from traversal order on purpose.
        let order = HashMap::from([(b, 0), (a, 1)]);
        for _ in 0..3 {
            let mut hits = [hit(a, 10.0), hit(b, 10.0)];
            sort_hits(&mut hits, Some(&order));
            assert_eq!(hits[0].entity, b);
            assert_eq!(hits[1].entity, a);
        }
    }

    #[test]
    fn nested_roots_are_visited_once() {
        let mut world = World::new();
        let leaf = world.spawn_empty().id();
        let inner = world.spawn(PickRoot).add_child(leaf).id();
        let outer = world.spawn(PickRoot).add_child(inner).id();

        let mut state: SystemState<Query<&Children>> = SystemState::new(&mut world);
        let children = state.get(&world);
        let order = traversal_order([inner, outer], &children);

        assert_eq!(order.len(), 3);
        assert!(order[&inner] < order[&leaf]);
    }
}

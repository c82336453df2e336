use bevy::{
    input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
};

pub struct DropzoneCameraPlugin;

impl Plugin for DropzoneCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, orbit_camera_system.in_set(OrbitCameraSet));
    }
}

/// System set containing the orbit controller. Systems that toggle
/// [`OrbitCameraSettings::enabled`] should run before it.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrbitCameraSet;

/// Settings component placed on the camera entity to enable orbit controls
/// around [`focus`](Self::focus).
///
/// Controls:
/// - Orbit button + drag: rotate around the focus point (yaw/pitch)
/// - Pan button + drag: move the focus point in the view plane
/// - Scroll wheel: zoom towards/away from the focus point
#[derive(Component)]
pub struct OrbitCameraSettings {
    /// Point the camera orbits around and looks at.
    pub focus: Vec3,
    /// Orbit sensitivity (radians per pixel).
    pub sensitivity: f32,
    /// Pan distance per pixel, relative to the orbit radius.
    pub pan_speed: f32,
    /// Fractional radius change per scroll line.
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub orbit_button: MouseButton,
    pub pan_button: MouseButton,
    /// Whether camera controls are enabled. Cleared while an object is being dragged.
    pub enabled: bool,
}

impl Default for OrbitCameraSettings {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            sensitivity: 0.005,
            pan_speed: 0.0015,
            zoom_speed: 0.1,
            min_distance: 5.0,
            max_distance: 1000.0,
            orbit_button: MouseButton::Left,
            pan_button: MouseButton::Right,
            enabled: true,
        }
    }
}

// Keeps the camera from flipping over the poles.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

fn orbit_camera_system(
    mouse: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut scroll_events: MessageReader<MouseWheel>,
    mut camera_query: Query<(&mut OrbitCameraSettings, &mut Transform)>,
) {
    let motion: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll: f32 = scroll_events
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.01,
        })
        .sum();

    for (mut settings, mut transform) in &mut camera_query {
        if !settings.enabled {
            continue;
        }

        let mut offset = transform.translation - settings.focus;
        let mut moved = false;

        if motion != Vec2::ZERO {
            if mouse.pressed(settings.orbit_button) {
                offset = orbit_offset(
                    offset,
                    -motion.x * settings.sensitivity,
                    motion.y * settings.sensitivity,
                );
                moved = true;
            } else if mouse.pressed(settings.pan_button) {
                let scale = offset.length() * settings.pan_speed;
                let pan = (transform.right().as_vec3() * -motion.x + transform.up().as_vec3() * motion.y)
                    * scale;
                settings.focus += pan;
                moved = true;
            }
        }

        if scroll != 0.0 {
            let distance = (offset.length() * (1.0 - scroll * settings.zoom_speed))
                .clamp(settings.min_distance, settings.max_distance);
            offset = offset.normalize_or(Vec3::Z) * distance;
            moved = true;
        }

        if moved {
            transform.translation = settings.focus + offset;
            transform.look_at(settings.focus, Vec3::Y);
        }
    }
}

/// Rotate an orbit offset by a yaw (around world Y) and pitch delta, keeping its length.
pub fn orbit_offset(offset: Vec3, yaw_delta: f32, pitch_delta: f32) -> Vec3 {
    let radius = offset.length();
    if radius <= f32::EPSILON {
        return offset;
    }
    let yaw = offset.x.atan2(offset.z) + yaw_delta;
    let pitch = ((offset.y / radius).clamp(-1.0, 1.0).asin() + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    Vec3::new(
        radius * pitch.cos() * yaw.sin(),
        radius * pitch.sin(),
        radius * pitch.cos() * yaw.cos(),
    )
}

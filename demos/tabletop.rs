//! Tabletop demo: click (or touch) an object to pick it up, move the pointer
//! to slide it across the floor, click again (or lift the finger) to drop it.
//!
//! Only meshes under the "Scene" root are pickable. The "Pringle" cylinder
//! carries the can model along with it. Put the model at
//! `assets/models/pringles.glb`; without it the can is simply invisible.

use bevy::prelude::*;
use dropzone::{Companion, Draggable, DropzonePlugin, Ground, PickRoot, PickingCamera};
use dropzone_camera::{DropzoneCameraPlugin, OrbitCameraSettings};

fn main() -> AppExit {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "dropzone".into(),
                canvas: Some("#bevy".into()),
                fit_canvas_to_parent: true,
                // Keeps touch drags from scrolling or zooming the page.
                prevent_default_event_handling: true,
                ..default()
            }),
            ..default()
        }))
        .add_plugins((DropzoneCameraPlugin, DropzonePlugin))
        .insert_resource(ClearColor(Color::srgb(0.55, 0.62, 0.70)))
        .add_systems(Startup, (spawn_camera, spawn_scene))
        .run()
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("Camera"),
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: 30.0_f32.to_radians(),
            near: 1.0,
            far: 1500.0,
            ..default()
        }),
        Transform::from_xyz(-35.0, 70.0, 100.0).looking_at(Vec3::ZERO, Vec3::Y),
        OrbitCameraSettings::default(),
        PickingCamera,
    ));

    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 10000.0,
            ..default()
        },
        Transform::from_xyz(-30.0, 50.0, -30.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    asset_server: Res<AssetServer>,
) {
    let cube = Cuboid::default();
    let sphere = Sphere::new(4.0);
    let cylinder = Cylinder::new(4.0, 6.0);
    let pringle = Cylinder::new(1.05, 6.0);

    // Outside the pick root, so its meshes never block the pringle below.
    let can = commands
        .spawn((
            Name::new("PRINGLES"),
            SceneRoot(asset_server.load(GltfAssetLabel::Scene(0).from_asset("models/pringles.glb"))),
            Transform::from_xyz(0.5, -0.5, 0.5).with_scale(Vec3::new(9.0, 8.0, 9.0)),
        ))
        .id();

    commands
        .spawn((Name::new("Scene"), PickRoot, Transform::default(), Visibility::default()))
        .with_children(|scene| {
            scene.spawn((
                Name::new("Floor"),
                Mesh3d(meshes.add(cube)),
                MeshMaterial3d(materials.add(Color::srgb(0.45, 0.40, 0.33))),
                Transform::from_xyz(0.0, -1.0, 0.0).with_scale(Vec3::new(100.0, 2.0, 100.0)),
                Ground,
            ));

            scene.spawn((
                Name::new("BOX"),
                Mesh3d(meshes.add(cube)),
                MeshMaterial3d(materials.add(Color::srgb_u8(0xDC, 0x14, 0x3C))),
                Transform::from_xyz(15.0, 3.0, 15.0).with_scale(Vec3::splat(6.0)),
                Draggable,
            ));

            scene.spawn((
                Name::new("SPHERE"),
                Mesh3d(meshes.add(sphere)),
                MeshMaterial3d(materials.add(Color::srgb_u8(0x43, 0xA1, 0xF4))),
                Transform::from_xyz(15.0, sphere.radius, -15.0),
                Draggable,
            ));

            scene.spawn((
                Name::new("CYLINDER"),
                Mesh3d(meshes.add(cylinder)),
                MeshMaterial3d(materials.add(Color::srgb_u8(0x90, 0xEE, 0x90))),
                Transform::from_xyz(-15.0, cylinder.half_height, 15.0),
                Draggable,
            ));

            scene.spawn((
                Name::new("PRINGLE"),
                Mesh3d(meshes.add(pringle)),
                MeshMaterial3d(materials.add(Color::srgb_u8(0xE1, 0x65, 0x00))),
                Transform::from_xyz(0.0, pringle.half_height, 0.0),
                Draggable,
                Companion::new(can, Vec2::splat(0.5)),
            ));
        });
}

use bevy::input::mouse::MouseScrollUnit;
use bevy::math::EulerRot;
use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    prelude::*,
};
use constants::terrain::PLANE_SIZE;

#[derive(Resource)]
pub struct OrbitCamera {
    pub focus_point: Vec3,
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec3::ZERO,
            distance: PLANE_SIZE * 1.2,
            pitch: -0.6,
            yaw: 0.0,
        }
    }
}

impl OrbitCamera {
    fn view_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
    mut orbit: ResMut<OrbitCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    // Mouse motion with right click (orbit around the terrain)
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        orbit.yaw += -mouse_delta.x * yaw_sens;
        orbit.pitch += -mouse_delta.y * pitch_sens;
        orbit.pitch = orbit.pitch.clamp(-1.55, -0.05);
    }

    // Mouse wheel scroll accumulation (pixel and line scroll)
    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y * 1.0,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }

    if scroll_accum.abs() > f32::EPSILON {
        let dolly_speed = (orbit.distance * 0.1).clamp(0.5, 50.0);
        orbit.distance = (orbit.distance - scroll_accum * dolly_speed)
            .clamp(PLANE_SIZE * 0.1, PLANE_SIZE * 5.0);
    }

    // Keyboard orbit input, shift = faster
    let mut yaw_input = 0.0;
    if keyboard.pressed(KeyCode::KeyA) {
        yaw_input += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        yaw_input -= 1.0;
    }

    if yaw_input != 0.0 {
        let mut speed = 1.2;
        if keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
            speed *= 3.5;
        }
        orbit.yaw += yaw_input * speed * time.delta_secs();
    }

    let target_rot = orbit.view_rotation();
    let target_pos = orbit.focus_point + target_rot * (Vec3::Z * orbit.distance);

    let lerp_speed = 12.0 * time.delta_secs();
    camera_transform.translation = camera_transform
        .translation
        .lerp(target_pos, lerp_speed.min(1.0));
    camera_transform.rotation = camera_transform
        .rotation
        .slerp(target_rot, lerp_speed.min(1.0));
}

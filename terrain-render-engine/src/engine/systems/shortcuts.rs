use bevy::prelude::*;

use crate::engine::export::ExportRequested;
use crate::engine::systems::wireframe::WireframeState;
use crate::engine::terrain::bake::{BakeRequested, BakeSource};

/// Keyboard shortcuts mirroring the frontend controls:
/// G re-bakes from the default heightmap, E exports glTF, B exports GLB,
/// F toggles the wireframe overlay.
pub fn handle_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut bake_events: EventWriter<BakeRequested>,
    mut export_events: EventWriter<ExportRequested>,
    mut wireframe: ResMut<WireframeState>,
) {
    if keyboard.just_pressed(KeyCode::KeyG) {
        bake_events.write(BakeRequested {
            source: BakeSource::DefaultHeightmap,
            scale: None,
        });
    }

    if keyboard.just_pressed(KeyCode::KeyE) {
        export_events.write(ExportRequested::gltf());
    }

    if keyboard.just_pressed(KeyCode::KeyB) {
        export_events.write(ExportRequested::glb());
    }

    if keyboard.just_pressed(KeyCode::KeyF) {
        wireframe.enabled = !wireframe.enabled;
        info!(
            "Wireframe {}",
            if wireframe.enabled { "on" } else { "off" }
        );
    }
}

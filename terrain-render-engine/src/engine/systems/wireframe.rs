use bevy::pbr::wireframe::Wireframe;
use bevy::prelude::*;

use crate::engine::terrain::scene::TerrainScene;

/// Desired wireframe overlay state, toggled from the keyboard or RPC
#[derive(Resource, Default)]
pub struct WireframeState {
    pub enabled: bool,
}

/// Keep the terrain entity's wireframe component in step with the state
pub fn sync_wireframe_system(
    mut commands: Commands,
    state: Res<WireframeState>,
    scene: Option<Res<TerrainScene>>,
    wireframes: Query<(), With<Wireframe>>,
) {
    let Some(scene) = scene else {
        return;
    };

    let has_wireframe = wireframes.get(scene.entity).is_ok();
    if state.enabled && !has_wireframe {
        commands.entity(scene.entity).insert(Wireframe);
    } else if !state.enabled && has_wireframe {
        commands.entity(scene.entity).remove::<Wireframe>();
    }
}

/// Scene context owning the terrain grid and its render handles
use bevy::prelude::*;
use constants::terrain::{PLANE_SIZE, TERRAIN_RESOLUTION};
use terrain_mesh::TerrainGrid;

use super::mesh::build_terrain_mesh;

#[derive(Component)]
pub struct Terrain;

/// Single owner of the terrain state. Systems receive this resource instead
/// of closing over shared globals; the grid here is the authoritative copy
/// the exporter reads from.
#[derive(Resource)]
pub struct TerrainScene {
    pub grid: TerrainGrid,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub entity: Entity,
    pub height_scale: f32,
}

/// Spawn the terrain entity with a flat grid; the first bake displaces it.
/// The grid is built in the XY plane with height along Z, so the entity is
/// rotated to put heights up the world Y axis.
pub fn spawn_terrain(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    diffuse_texture: Handle<Image>,
    height_scale: f32,
) -> TerrainScene {
    let grid = TerrainGrid::new(TERRAIN_RESOLUTION, PLANE_SIZE);

    let mesh = meshes.add(build_terrain_mesh(&grid));
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(diffuse_texture),
        perceptual_roughness: 0.9,
        ..default()
    });

    let entity = commands
        .spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_rotation(terrain_orientation()),
            Visibility::Visible,
            Terrain,
        ))
        .id();

    TerrainScene {
        grid,
        mesh,
        material,
        entity,
        height_scale,
    }
}

/// Rotation placing the grid's height axis along world up
pub fn terrain_orientation() -> Quat {
    Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

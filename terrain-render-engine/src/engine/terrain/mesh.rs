/// Terrain grid to render-mesh conversion
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use terrain_mesh::TerrainGrid;

/// Build a renderable mesh from the grid. Usage includes the main world so
/// the attribute buffers can be rewritten after each bake.
pub fn build_terrain_mesh(grid: &TerrainGrid) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    write_grid_attributes(&mut mesh, grid);
    mesh.insert_indices(Indices::U32(grid.indices().to_vec()));
    mesh
}

/// Rewrite positions and normals after a bake; topology and UVs are fixed.
pub fn update_terrain_mesh(mesh: &mut Mesh, grid: &TerrainGrid) {
    write_grid_attributes(mesh, grid);
}

fn write_grid_attributes(mesh: &mut Mesh, grid: &TerrainGrid) {
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, grid.positions().to_vec());
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, grid.normals().to_vec());
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, grid.uvs().to_vec());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_mesh_carries_grid_buffers() {
        let grid = TerrainGrid::new(4, 50.0);
        let mesh = build_terrain_mesh(&grid);

        let positions = mesh.attribute(Mesh::ATTRIBUTE_POSITION).unwrap();
        assert_eq!(positions.len(), grid.vertex_count());

        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("expected u32 indices");
        };
        assert_eq!(indices.len(), grid.indices().len());
    }
}

/// Planar terrain grid displaced by a height field
use crate::error::TerrainError;
use crate::height_field::HeightField;
use constants::terrain::MAX_SAMPLE_VALUE;

/// Row-major vertex grid over a square plane. Vertex index `i` maps to
/// sampling-grid coordinate `(i / resolution, i % resolution)`; the bake
/// keeps that bijection in lock-step with height field reads. Heights live
/// in the third position component, the plane itself spans X and Y.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    resolution: usize,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl TerrainGrid {
    /// Build a flat resolution² grid spanning `extent` world units per side.
    pub fn new(resolution: usize, extent: f32) -> Self {
        let vertex_count = resolution * resolution;
        let mut positions = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        let span = resolution.saturating_sub(1).max(1) as f32;

        for gx in 0..resolution {
            for gy in 0..resolution {
                let u = gx as f32 / span;
                let v = gy as f32 / span;
                positions.push([(u - 0.5) * extent, (v - 0.5) * extent, 0.0]);
                uvs.push([u, v]);
            }
        }

        let mut indices = Vec::new();
        if resolution > 1 {
            indices.reserve((resolution - 1) * (resolution - 1) * 6);
            for gx in 0..resolution - 1 {
                for gy in 0..resolution - 1 {
                    let a = (gx * resolution + gy) as u32;
                    let b = ((gx + 1) * resolution + gy) as u32;
                    let c = (gx * resolution + gy + 1) as u32;
                    let d = ((gx + 1) * resolution + gy + 1) as u32;

                    indices.extend_from_slice(&[a, b, d]);
                    indices.extend_from_slice(&[a, d, c]);
                }
            }
        }

        let normals = vec![[0.0, 0.0, 1.0]; vertex_count];

        Self {
            resolution,
            positions,
            normals,
            uvs,
            indices,
        }
    }

    /// Degenerate grid with no vertices; exports of it must still be
    /// well-formed documents.
    pub fn empty() -> Self {
        Self::new(0, 0.0)
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Sample the height field over the full resolution² grid in row-major
    /// order and write `(sample / 255) * scale` into each vertex height, then
    /// recompute the vertex normals.
    ///
    /// Heights are staged into a scratch vector first; the grid is only
    /// touched once every sample has been read, so a failure part-way through
    /// never leaves a half-baked mesh. Re-running with the same field and
    /// scale reproduces the vertex buffer bit for bit.
    pub fn bake_displacement(
        &mut self,
        field: &HeightField,
        scale: f32,
    ) -> Result<(), TerrainError> {
        field.ensure_covers(self.resolution)?;

        let mut heights = Vec::with_capacity(self.vertex_count());
        for gx in 0..self.resolution {
            for gy in 0..self.resolution {
                let sample = field.sample(gx, gy) as f32;
                heights.push((sample / MAX_SAMPLE_VALUE) * scale);
            }
        }

        for (position, height) in self.positions.iter_mut().zip(heights) {
            position[2] = height;
        }

        self.recompute_normals();
        Ok(())
    }

    /// Per-vertex normals averaged over adjacent face normals.
    fn recompute_normals(&mut self) {
        self.normals.clear();
        self.normals.resize(self.positions.len(), [0.0, 0.0, 0.0]);

        for tri in self.indices.chunks_exact(3) {
            let a = self.positions[tri[0] as usize];
            let b = self.positions[tri[1] as usize];
            let c = self.positions[tri[2] as usize];

            let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let face = [
                u[1] * v[2] - u[2] * v[1],
                u[2] * v[0] - u[0] * v[2],
                u[0] * v[1] - u[1] * v[0],
            ];

            for &vertex in tri {
                let n = &mut self.normals[vertex as usize];
                n[0] += face[0];
                n[1] += face[1];
                n[2] += face[2];
            }
        }

        for normal in self.normals.iter_mut() {
            let length =
                (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
            *normal = if length > 0.0 {
                [normal[0] / length, normal[1] / length, normal[2] / length]
            } else {
                [0.0, 0.0, 1.0]
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Height field where `sample(x, y)` is the given closure over grid coords.
    fn field_from_fn(size: usize, sample: impl Fn(usize, usize) -> u8) -> HeightField {
        let mut data = Vec::with_capacity(size * size * 4);
        for y in 0..size {
            for x in 0..size {
                data.extend_from_slice(&[sample(x, y), 0, 0, 255]);
            }
        }
        HeightField::from_rgba8(size, size, &data).unwrap()
    }

    fn heights(grid: &TerrainGrid) -> Vec<f32> {
        grid.positions().iter().map(|p| p[2]).collect()
    }

    #[test]
    fn grid_layout_is_row_major() {
        let grid = TerrainGrid::new(4, 50.0);
        assert_eq!(grid.vertex_count(), 16);
        assert_eq!(grid.indices().len(), 3 * 3 * 6);
        assert!(grid.indices().iter().all(|&i| (i as usize) < 16));

        // Consecutive vertex indices walk the inner (gy) axis.
        let p0 = grid.positions()[0];
        let p1 = grid.positions()[1];
        assert_eq!(p0[0], p1[0]);
        assert_ne!(p0[1], p1[1]);
    }

    #[test]
    fn bake_follows_index_bijection() {
        let resolution = 4;
        let mut grid = TerrainGrid::new(resolution, 50.0);
        let field = field_from_fn(resolution, |x, y| (x * 16 + y) as u8);

        grid.bake_displacement(&field, 1.0).unwrap();

        for i in 0..grid.vertex_count() {
            let gx = i / resolution;
            let gy = i % resolution;
            let expected = (gx * 16 + gy) as f32 / 255.0;
            assert_eq!(grid.positions()[i][2], expected);
        }
    }

    #[test]
    fn tiled_sample_scenario_matches_formula() {
        // 2x2 pattern [[0, 128], [255, 64]] tiled across a 4x4 grid, scale 2.
        let tile = [[0u8, 128], [255, 64]];
        let resolution = 4;
        let scale = 2.0;
        let field = field_from_fn(resolution, |x, y| tile[y % 2][x % 2]);

        let mut grid = TerrainGrid::new(resolution, 50.0);
        grid.bake_displacement(&field, scale).unwrap();

        for i in 0..grid.vertex_count() {
            let gx = i / resolution;
            let gy = i % resolution;
            let sample = tile[gy % 2][gx % 2] as f32;
            assert_eq!(grid.positions()[i][2], (sample / 255.0) * scale);
        }
    }

    #[test]
    fn bake_is_deterministic_and_idempotent() {
        let field = field_from_fn(8, |x, y| ((x * 31 + y * 7) % 256) as u8);

        let mut first = TerrainGrid::new(8, 50.0);
        first.bake_displacement(&field, 3.5).unwrap();
        let first_bits: Vec<u32> = heights(&first).iter().map(|h| h.to_bits()).collect();

        let mut second = TerrainGrid::new(8, 50.0);
        second.bake_displacement(&field, 3.5).unwrap();
        let second_bits: Vec<u32> = heights(&second).iter().map(|h| h.to_bits()).collect();
        assert_eq!(first_bits, second_bits);

        // Re-baking the already-baked grid changes nothing.
        first.bake_displacement(&field, 3.5).unwrap();
        let rebaked_bits: Vec<u32> = heights(&first).iter().map(|h| h.to_bits()).collect();
        assert_eq!(first_bits, rebaked_bits);
    }

    #[test]
    fn zero_scale_flattens_regardless_of_image() {
        let field = field_from_fn(4, |x, y| ((x + y) * 40) as u8);
        let mut grid = TerrainGrid::new(4, 50.0);
        grid.bake_displacement(&field, 0.0).unwrap();
        assert!(heights(&grid).iter().all(|&h| h == 0.0));
    }

    #[test]
    fn black_is_flat_and_white_is_uniform_scale() {
        let black = field_from_fn(4, |_, _| 0);
        let mut grid = TerrainGrid::new(4, 50.0);
        grid.bake_displacement(&black, 7.0).unwrap();
        assert!(heights(&grid).iter().all(|&h| h == 0.0));
        assert!(grid.normals().iter().all(|&n| n == [0.0, 0.0, 1.0]));

        let white = field_from_fn(4, |_, _| 255);
        grid.bake_displacement(&white, 7.0).unwrap();
        assert!(heights(&grid).iter().all(|&h| h == 7.0));
    }

    #[test]
    fn failed_bake_leaves_previous_heights_intact() {
        let field = field_from_fn(4, |_, _| 200);
        let mut grid = TerrainGrid::new(4, 50.0);
        grid.bake_displacement(&field, 2.0).unwrap();
        let before = heights(&grid);

        let too_small = field_from_fn(2, |_, _| 10);
        let err = grid.bake_displacement(&too_small, 2.0).unwrap_err();
        assert!(matches!(err, TerrainError::ImageTooSmall { .. }));
        assert_eq!(heights(&grid), before);
    }

    #[test]
    fn normals_stay_unit_length_after_displacement() {
        let field = field_from_fn(8, |x, y| ((x * 37 + y * 11) % 256) as u8);
        let mut grid = TerrainGrid::new(8, 50.0);
        grid.bake_displacement(&field, 5.0).unwrap();

        for normal in grid.normals() {
            let length =
                (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }
}

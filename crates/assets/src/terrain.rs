use crate::MeshData;

/// Edge length of one terrain tile in world units.
pub const TERRAIN_SIZE: f32 = 800.0;
/// Vertices along each tile edge.
pub const TERRAIN_VERTEX_COUNT: u32 = 128;

/// Flat square grid in the XZ plane spanning `[0, size]` on both axes,
/// normals up, UVs spanning the whole tile once.
pub fn terrain_grid(size: f32, vertex_count: u32) -> MeshData {
    let n = vertex_count.max(2);
    let step = (n - 1) as f32;
    let count = (n * n) as usize;

    let mut mesh = MeshData {
        positions: Vec::with_capacity(count),
        tex_coords: Vec::with_capacity(count),
        normals: Vec::with_capacity(count),
        indices: Vec::with_capacity(6 * ((n - 1) * (n - 1)) as usize),
    };

    for i in 0..n {
        for j in 0..n {
            let u = j as f32 / step;
            let v = i as f32 / step;
            mesh.positions.push([u * size, 0.0, v * size]);
            mesh.normals.push([0.0, 1.0, 0.0]);
            mesh.tex_coords.push([u, v]);
        }
    }

    for gz in 0..n - 1 {
        for gx in 0..n - 1 {
            let top_left = gz * n + gx;
            let top_right = top_left + 1;
            let bottom_left = (gz + 1) * n + gx;
            let bottom_right = bottom_left + 1;
            mesh.indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_counts() {
        let mesh = terrain_grid(10.0, 4);
        mesh.validate().unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.index_count(), 6 * 9);
    }

    #[test]
    fn grid_spans_size() {
        let mesh = terrain_grid(TERRAIN_SIZE, 3);
        assert_eq!(mesh.positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(mesh.positions[8], [TERRAIN_SIZE, 0.0, TERRAIN_SIZE]);
        assert_eq!(mesh.tex_coords[8], [1.0, 1.0]);
    }

    #[test]
    fn triangles_face_up() {
        let mesh = terrain_grid(1.0, 2);
        let [a, b, c] = [0, 1, 2].map(|k| mesh.positions[mesh.indices[k] as usize]);
        let e1 = [b[0] - a[0], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[2] - a[2]];
        // y component of e1 x e2 in XZ
        let y = e1[1] * e2[0] - e1[0] * e2[1];
        assert!(y > 0.0);
    }

    #[test]
    fn default_tile_is_valid() {
        let mesh = terrain_grid(TERRAIN_SIZE, TERRAIN_VERTEX_COUNT);
        mesh.validate().unwrap();
        assert_eq!(mesh.vertex_count(), 128 * 128);
    }
}

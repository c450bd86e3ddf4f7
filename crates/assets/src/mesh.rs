use crate::AssetError;

/// Indexed triangle mesh in CPU memory, laid out as separate attribute
/// streams the way it is uploaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Check stream lengths and index bounds before upload.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.positions.is_empty() || self.indices.is_empty() {
            return Err(AssetError::EmptyMesh);
        }
        let n = self.positions.len();
        if self.tex_coords.len() != n || self.normals.len() != n {
            return Err(AssetError::InvalidMesh(format!(
                "{} positions, {} tex coords, {} normals",
                n,
                self.tex_coords.len(),
                self.normals.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(AssetError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(AssetError::InvalidMesh(format!(
                "index {bad} out of range for {n} vertices"
            )));
        }
        Ok(())
    }

    /// Radius of the smallest origin-centred sphere enclosing every vertex.
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
            .fold(0.0, f32::max)
    }

    fn push_face(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3]) {
        let base = self.positions.len() as u32;
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
        for (corner, uv) in corners.iter().zip(uvs) {
            self.positions.push(*corner);
            self.tex_coords.push(uv);
            self.normals.push(normal);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
}

/// Axis-aligned cube centred on the origin with per-face normals and UVs.
pub fn cube(half: f32) -> MeshData {
    let h = half;
    let mut mesh = MeshData::default();
    // +Z, -Z, +X, -X, +Y, -Y; corners counter-clockwise seen from outside
    mesh.push_face(
        [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
        [0.0, 0.0, 1.0],
    );
    mesh.push_face(
        [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
        [0.0, 0.0, -1.0],
    );
    mesh.push_face(
        [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]],
        [1.0, 0.0, 0.0],
    );
    mesh.push_face(
        [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
        [-1.0, 0.0, 0.0],
    );
    mesh.push_face(
        [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]],
        [0.0, 1.0, 0.0],
    );
    mesh.push_face(
        [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
        [0.0, -1.0, 0.0],
    );
    mesh
}

/// Upright quad in the XY plane, facing +Z, bottom edge on y = 0.
pub fn quad(width: f32, height: f32) -> MeshData {
    let w = width / 2.0;
    let mut mesh = MeshData::default();
    mesh.push_face(
        [[-w, 0.0, 0.0], [w, 0.0, 0.0], [w, height, 0.0], [-w, height, 0.0]],
        [0.0, 0.0, 1.0],
    );
    mesh
}

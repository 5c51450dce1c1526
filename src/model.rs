// ============================================================================
// MODEL — CPU-side mesh data and OBJ loading
// ============================================================================

use std::f32::consts::PI;
use std::path::Path;

use bytemuck::{Pod, Zeroable};

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Triangle mesh with texture coordinates.  UVs keep the OBJ convention
/// (V = 0 at the bottom of the image), which is also canvas row order.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[derive(Debug)]
pub enum ModelError {
    Parse(String),
    /// File parsed but contained no triangles.
    Empty,
    /// Geometry without texture coordinates cannot be painted.
    MissingUvs(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Parse(e) => write!(f, "OBJ parse error: {}", e),
            ModelError::Empty => write!(f, "model has no triangles"),
            ModelError::MissingUvs(name) => write!(f, "mesh '{}' has no texture coordinates", name),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<tobj::LoadError> for ModelError {
    fn from(e: tobj::LoadError) -> Self {
        ModelError::Parse(e.to_string())
    }
}

impl Mesh {
    /// Load every object in an OBJ file into one mesh.
    pub fn load_obj(path: &Path) -> Result<Mesh, ModelError> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        // Materials are irrelevant here: the painted texture is the material.
        let (models, _materials) = tobj::load_obj(path, &options)?;

        let mut mesh = Mesh::default();
        for model in &models {
            let m = &model.mesh;
            if m.positions.is_empty() {
                continue;
            }
            if m.texcoords.is_empty() {
                return Err(ModelError::MissingUvs(model.name.clone()));
            }
            let base = mesh.vertices.len() as u32;
            let count = m.positions.len() / 3;
            let has_normals = m.normals.len() >= count * 3;
            for i in 0..count {
                let normal = if has_normals {
                    [m.normals[i * 3], m.normals[i * 3 + 1], m.normals[i * 3 + 2]]
                } else {
                    [0.0; 3]
                };
                let uv = if m.texcoords.len() > i * 2 + 1 {
                    [m.texcoords[i * 2], m.texcoords[i * 2 + 1]]
                } else {
                    [0.0; 2]
                };
                mesh.vertices.push(Vertex {
                    position: [m.positions[i * 3], m.positions[i * 3 + 1], m.positions[i * 3 + 2]],
                    normal,
                    uv,
                });
            }
            mesh.indices.extend(m.indices.iter().map(|&i| base + i));
            if !has_normals {
                mesh.compute_normals_from(base as usize);
            }
        }

        if mesh.indices.len() < 3 {
            return Err(ModelError::Empty);
        }
        mesh.normalize_extent();
        Ok(mesh)
    }

    /// Unit sphere with an equirectangular UV layout.  Used when no model
    /// file is configured.
    pub fn uv_sphere(stacks: u32, slices: u32) -> Mesh {
        let stacks = stacks.max(2);
        let slices = slices.max(3);
        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        for i in 0..=stacks {
            let v = i as f32 / stacks as f32;
            let phi = PI * (v - 0.5); // -pi/2 (bottom) .. pi/2 (top)
            for j in 0..=slices {
                let u = j as f32 / slices as f32;
                let theta = 2.0 * PI * u;
                let p = [phi.cos() * theta.cos(), phi.sin(), -phi.cos() * theta.sin()];
                vertices.push(Vertex {
                    position: p,
                    normal: p,
                    uv: [u, v],
                });
            }
        }
        let row = slices + 1;
        let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        Mesh { vertices, indices }
    }

    /// Smooth normals for vertices from `first` on, accumulated from face
    /// normals of the triangles that reference them.
    fn compute_normals_from(&mut self, first: usize) {
        let mut acc = vec![[0.0f32; 3]; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a < first && b < first && c < first {
                continue;
            }
            let pa = self.vertices[a].position;
            let pb = self.vertices[b].position;
            let pc = self.vertices[c].position;
            let e1 = [pb[0] - pa[0], pb[1] - pa[1], pb[2] - pa[2]];
            let e2 = [pc[0] - pa[0], pc[1] - pa[1], pc[2] - pa[2]];
            let n = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            for idx in [a, b, c] {
                for k in 0..3 {
                    acc[idx][k] += n[k];
                }
            }
        }
        for (v, n) in self.vertices.iter_mut().zip(acc).skip(first) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if len > 0.0 {
                v.normal = [n[0] / len, n[1] / len, n[2] / len];
            }
        }
    }

    /// Center the mesh on the origin and scale it into the unit sphere so
    /// the default camera frames any model.
    fn normalize_extent(&mut self) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in &self.vertices {
            for k in 0..3 {
                min[k] = min[k].min(v.position[k]);
                max[k] = max[k].max(v.position[k]);
            }
        }
        let center = [
            (min[0] + max[0]) * 0.5,
            (min[1] + max[1]) * 0.5,
            (min[2] + max[2]) * 0.5,
        ];
        let radius = self
            .vertices
            .iter()
            .map(|v| {
                let d = [
                    v.position[0] - center[0],
                    v.position[1] - center[1],
                    v.position[2] - center[2],
                ];
                (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
            })
            .fold(0.0f32, f32::max);
        let scale = if radius > 0.0 { 1.0 / radius } else { 1.0 };
        for v in &mut self.vertices {
            for k in 0..3 {
                v.position[k] = (v.position[k] - center[k]) * scale;
            }
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

//! Mesh geometry
//!
//! A mesh is the unit the synchronizer mirrors into a container: one named
//! geometry buffer with interleaved vertices, a shared index buffer and the
//! sub-mesh ranges that slice it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard vertex format
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Surface normal, author supplied or imported
    pub normal: [f32; 3],
    /// Tangent with handedness in w component
    pub tangent: [f32; 4],
    /// Primary UV coordinates
    pub uv0: [f32; 2],
    /// Secondary UV coordinates (lightmaps)
    pub uv1: [f32; 2],
    /// Vertex color (RGBA)
    pub color: [f32; 4],
}

impl Vertex {
    /// Create a vertex with position, normal and uv (other fields default)
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tangent: [1.0, 0.0, 0.0, 1.0],
            uv0: uv,
            uv1: [0.0, 0.0],
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Primitive topology of a sub-mesh
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// A range of the index buffer drawn with one material slot
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubMesh {
    pub index_offset: u32,
    pub index_count: u32,
    pub topology: PrimitiveTopology,
    pub material_index: u32,
}

/// Axis-aligned bounding box
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Calculate bounds from vertices
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        if vertices.is_empty() {
            return Self::default();
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];

        for v in vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Self { min, max }
    }
}

/// Normal buffer length does not match the vertex count
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mesh '{mesh}' has {expected} vertices but {found} normals were supplied")]
pub struct NormalCountMismatch {
    pub mesh: String,
    pub expected: usize,
    pub found: usize,
}

/// A named geometry buffer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Mesh name; artifacts carry the derived artifact name
    pub name: String,
    /// Interleaved vertex data
    pub vertices: Vec<Vertex>,
    /// Shared index buffer
    pub indices: Vec<u32>,
    /// Sub-mesh ranges into `indices`
    pub submeshes: Vec<SubMesh>,
    /// Axis-aligned bounds
    pub bounds: Bounds,
}

impl Mesh {
    /// Create a single triangle-list mesh
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounds = Bounds::from_vertices(&vertices);
        let submeshes = vec![SubMesh {
            index_offset: 0,
            index_count: indices.len() as u32,
            topology: PrimitiveTopology::TriangleList,
            material_index: 0,
        }];
        Self {
            name: name.into(),
            vertices,
            indices,
            submeshes,
            bounds,
        }
    }

    /// Copy out the per-vertex normals
    pub fn normals(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.normal).collect()
    }

    /// Overwrite the per-vertex normals
    pub fn set_normals(&mut self, normals: &[[f32; 3]]) -> Result<(), NormalCountMismatch> {
        if normals.len() != self.vertices.len() {
            return Err(NormalCountMismatch {
                mesh: self.name.clone(),
                expected: self.vertices.len(),
                found: normals.len(),
            });
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = *normal;
        }
        Ok(())
    }

    /// Bitwise comparison of normals (distinguishes -0.0 and NaN payloads)
    pub fn normals_bit_identical(&self, other: &Mesh) -> bool {
        if self.vertices.len() != other.vertices.len() {
            return false;
        }
        self.vertices.iter().zip(&other.vertices).all(|(a, b)| {
            bytemuck::cast_slice::<f32, u32>(&a.normal) == bytemuck::cast_slice::<f32, u32>(&b.normal)
        })
    }

    /// Full structural copy of another mesh's contents, name included
    pub fn copy_contents_from(&mut self, source: &Mesh) {
        self.name.clone_from(&source.name);
        self.vertices.clone_from(&source.vertices);
        self.indices.clone_from(&source.indices);
        self.submeshes.clone_from(&source.submeshes);
        self.bounds = source.bounds.clone();
    }

    /// Rebuild smooth, area-weighted normals from the triangle sub-meshes
    ///
    /// Vertices that are split along UV seams get independent normals, which
    /// is exactly the seam artifact authored normals avoid.
    pub fn recalculate_normals(&mut self) {
        let mut accum = vec![[0.0f32; 3]; self.vertices.len()];

        for sub in &self.submeshes {
            if sub.topology != PrimitiveTopology::TriangleList {
                continue;
            }
            let start = sub.index_offset as usize;
            let end = (start + sub.index_count as usize).min(self.indices.len());
            if start >= end {
                continue;
            }

            for tri in self.indices[start..end].chunks_exact(3) {
                let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
                if i0 >= self.vertices.len() || i1 >= self.vertices.len() || i2 >= self.vertices.len() {
                    continue;
                }

                let p0 = self.vertices[i0].position;
                let p1 = self.vertices[i1].position;
                let p2 = self.vertices[i2].position;
                let e1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
                let e2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];
                // Unnormalized cross product weights by triangle area
                let n = [
                    e1[1] * e2[2] - e1[2] * e2[1],
                    e1[2] * e2[0] - e1[0] * e2[2],
                    e1[0] * e2[1] - e1[1] * e2[0],
                ];

                for &i in &[i0, i1, i2] {
                    accum[i][0] += n[0];
                    accum[i][1] += n[1];
                    accum[i][2] += n[2];
                }
            }
        }

        for (vertex, n) in self.vertices.iter_mut().zip(accum) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            vertex.normal = if len > f32::EPSILON {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0, 1.0, 0.0]
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilted_quad() -> Mesh {
        let n = [0.6, 0.8, 0.0];
        Mesh::new(
            "Quad",
            vec![
                Vertex::new([0.0, 0.0, 0.0], n, [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], n, [1.0, 0.0]),
                Vertex::new([1.0, 0.0, 1.0], n, [1.0, 1.0]),
                Vertex::new([0.0, 0.0, 1.0], n, [0.0, 1.0]),
            ],
            vec![0, 2, 1, 0, 3, 2],
        )
    }

    #[test]
    fn test_recalculate_normals_discards_authored_normals() {
        let mut mesh = tilted_quad();
        mesh.recalculate_normals();
        for n in mesh.normals() {
            assert!((n[1] - 1.0).abs() < 1e-6, "expected +Y, got {:?}", n);
        }
    }

    #[test]
    fn test_set_normals_length_checked() {
        let mut mesh = tilted_quad();
        let err = mesh.set_normals(&[[0.0, 1.0, 0.0]]).unwrap_err();
        assert_eq!(err.expected, 4);
        assert_eq!(err.found, 1);
    }

    #[test]
    fn test_normals_capture_restore_is_bit_exact() {
        let source = tilted_quad();
        let captured = source.normals();

        let mut copy = Mesh::default();
        copy.copy_contents_from(&source);
        copy.recalculate_normals();
        assert!(!copy.normals_bit_identical(&source));

        copy.set_normals(&captured).unwrap();
        assert!(copy.normals_bit_identical(&source));
    }

    #[test]
    fn test_bounds() {
        let mesh = tilted_quad();
        assert_eq!(mesh.bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.bounds.max, [1.0, 0.0, 1.0]);
    }
}

// Mesh model shared by the primitive generators, the importer and the renderer.
//
// Two-layer architecture:
//   PolyMesh (n-gon faces, no normals) → triangulate_smooth() → Mesh → GPU
//
// Generators with analytic normals build a Mesh directly.

use glam::Vec3;

use super::error::MeshError;

/// Normal used when accumulated face normals cancel out or every adjacent
/// face is degenerate.
pub const FALLBACK_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Largest vertex count addressable with 16-bit indices.
pub const U16_INDEX_LIMIT: usize = u16::MAX as usize;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// Interleaved vertex uploaded to the GPU.
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// MESH
// ============================================================================

/// Triangle mesh with per-vertex unit normals and a derived line list.
///
/// Immutable once constructed: every index in `triangle_indices` and
/// `wireframe_indices` is a valid offset into `positions` / `normals`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    triangle_indices: Vec<u32>,
    wireframe_indices: Vec<u32>,
}

impl Mesh {
    /// Validate the arrays and derive the wireframe edge list.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        triangle_indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if positions.len() != normals.len() {
            return Err(MeshError::LengthMismatch {
                positions: positions.len(),
                normals: normals.len(),
            });
        }
        if triangle_indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles(triangle_indices.len()));
        }
        let vertex_count = positions.len();
        if let Some(&index) = triangle_indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange { index, vertex_count });
        }

        let wireframe_indices = wireframe_from_triangles(&triangle_indices);
        Ok(Self {
            positions,
            normals,
            triangle_indices,
            wireframe_indices,
        })
    }

    /// Construct from arrays a generator builds valid by construction.
    pub(crate) fn from_generated(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        triangle_indices: Vec<u32>,
    ) -> Self {
        debug_assert_eq!(positions.len(), normals.len());
        debug_assert!(triangle_indices.iter().all(|&i| (i as usize) < positions.len()));
        let wireframe_indices = wireframe_from_triangles(&triangle_indices);
        Self {
            positions,
            normals,
            triangle_indices,
            wireframe_indices,
        }
    }

    pub fn positions(&self) -> &[[f32; 3]] { &self.positions }
    pub fn normals(&self) -> &[[f32; 3]] { &self.normals }
    pub fn triangle_indices(&self) -> &[u32] { &self.triangle_indices }
    pub fn wireframe_indices(&self) -> &[u32] { &self.wireframe_indices }

    pub fn vertex_count(&self) -> usize { self.positions.len() }
    pub fn triangle_count(&self) -> usize { self.triangle_indices.len() / 3 }

    /// Axis-aligned bounds as (min, max). `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        bounds_of(&self.positions)
    }

    /// Interleave positions and normals for a single vertex buffer.
    pub fn gpu_vertices(&self) -> Vec<GpuVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(&position, &normal)| GpuVertex { position, normal })
            .collect()
    }

    /// Narrowest index format able to address every vertex.
    pub fn index_format(&self) -> wgpu::IndexFormat {
        if self.vertex_count() <= U16_INDEX_LIMIT {
            wgpu::IndexFormat::Uint16
        } else {
            wgpu::IndexFormat::Uint32
        }
    }
}

/// For every triangle (a, b, c) emit the edges a–b, b–c, c–a.
pub fn wireframe_from_triangles(triangles: &[u32]) -> Vec<u32> {
    let mut lines = Vec::with_capacity(triangles.len() * 2);
    for tri in triangles.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        lines.extend_from_slice(&[a, b, b, c, c, a]);
    }
    lines
}

fn bounds_of(positions: &[[f32; 3]]) -> Option<(Vec3, Vec3)> {
    let mut iter = positions.iter().map(|&p| Vec3::from_array(p));
    let first = iter.next()?;
    Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
}

/// Recenter positions at their bounding-box midpoint and scale uniformly so
/// the longest bounding-box edge equals `target_size`.
///
/// A zero extent (single point) is treated as 1 so the positions only move.
pub fn fit_to_size(positions: &mut [[f32; 3]], target_size: f32) {
    let Some((min, max)) = bounds_of(positions) else {
        return;
    };
    let center = (min + max) * 0.5;
    let extent = (max - min).max_element();
    let extent = if extent > 0.0 { extent } else { 1.0 };
    let scale = target_size / extent;

    for p in positions.iter_mut() {
        *p = ((Vec3::from_array(*p) - center) * scale).to_array();
    }
}

/// Normalize, falling back to [`FALLBACK_NORMAL`] for zero or non-finite input.
pub fn safe_normal(n: Vec3) -> [f32; 3] {
    let len = n.length();
    if len > f32::EPSILON && len.is_finite() {
        (n / len).to_array()
    } else {
        FALLBACK_NORMAL
    }
}

// ============================================================================
// POLY MESH
// ============================================================================

/// Polygon mesh without normals, as read from an importer.
/// Faces hold position indices in their original winding.
/// Callers guarantee every face index is in range.
pub struct PolyMesh {
    pub positions: Vec<Vec3>,
    pub faces:     Vec<Vec<usize>>,
}

impl PolyMesh {
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            faces: Vec::new(),
        }
    }

    /// Add a face by vertex indices. Faces with fewer than 3 vertices are ignored.
    pub fn add_face(&mut self, indices: Vec<usize>) {
        if indices.len() >= 3 {
            self.faces.push(indices);
        }
    }

    pub fn vertex_count(&self) -> usize { self.positions.len() }
}

// ============================================================================
// TRIANGULATION + SMOOTH NORMALS
// ============================================================================

/// Fan-triangulate a PolyMesh and derive smooth per-position normals.
///
/// Algorithm:
///   1. Fan-triangulate each face from its first vertex.
///   2. Accumulate each triangle's unnormalized face normal (cross product of
///      two edges, so larger triangles weigh more) into its three vertices.
///   3. Normalize; zero-length sums from degenerate faces fall back to
///      [`FALLBACK_NORMAL`].
pub fn triangulate_smooth(poly: &PolyMesh) -> Result<Mesh, MeshError> {
    let n_verts = poly.vertex_count();
    let mut normal_accum: Vec<Vec3> = vec![Vec3::ZERO; n_verts];
    let mut indices: Vec<u32> = Vec::new();

    for face in &poly.faces {
        for i in 1..(face.len() - 1) {
            let (ia, ib, ic) = (face[0], face[i], face[i + 1]);
            let a = poly.positions[ia];
            let b = poly.positions[ib];
            let c = poly.positions[ic];
            let weighted_normal = (b - a).cross(c - a);
            normal_accum[ia] += weighted_normal;
            normal_accum[ib] += weighted_normal;
            normal_accum[ic] += weighted_normal;
            indices.extend_from_slice(&[ia as u32, ib as u32, ic as u32]);
        }
    }

    let positions = poly.positions.iter().map(|p| p.to_array()).collect();
    let normals = normal_accum.into_iter().map(safe_normal).collect();
    Mesh::new(positions, normals, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> PolyMesh {
        let mut poly = PolyMesh::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]);
        poly.add_face(vec![0, 1, 2, 3]);
        poly
    }

    #[test]
    fn wireframe_has_two_indices_per_triangle_index() {
        let mesh = triangulate_smooth(&quad()).unwrap();
        assert_eq!(mesh.triangle_indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.wireframe_indices(), &[0, 1, 1, 2, 2, 0, 0, 2, 2, 3, 3, 0]);
        assert_eq!(mesh.wireframe_indices().len(), 2 * mesh.triangle_indices().len());
    }

    #[test]
    fn smooth_normals_point_along_face_normal() {
        let mesh = triangulate_smooth(&quad()).unwrap();
        for n in mesh.normals() {
            assert!((Vec3::from_array(*n) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn degenerate_faces_fall_back_to_default_normal() {
        let mut poly = PolyMesh::new(vec![Vec3::ONE; 3]);
        poly.add_face(vec![0, 1, 2]);
        let mesh = triangulate_smooth(&poly).unwrap();
        assert!(mesh.normals().iter().all(|&n| n == FALLBACK_NORMAL));
    }

    #[test]
    fn unreferenced_positions_get_default_normal() {
        let mut poly = quad();
        poly.positions.push(Vec3::new(5.0, 5.0, 5.0));
        let mesh = triangulate_smooth(&poly).unwrap();
        assert_eq!(mesh.normals()[4], FALLBACK_NORMAL);
    }

    #[test]
    fn new_rejects_out_of_range_index() {
        let err = Mesh::new(vec![[0.0; 3]; 2], vec![[0.0, 1.0, 0.0]; 2], vec![0, 1, 2]).unwrap_err();
        assert_eq!(err, MeshError::IndexOutOfRange { index: 2, vertex_count: 2 });
    }

    #[test]
    fn new_rejects_partial_triangle() {
        let err = Mesh::new(vec![[0.0; 3]; 3], vec![[0.0, 1.0, 0.0]; 3], vec![0, 1]).unwrap_err();
        assert_eq!(err, MeshError::NotTriangles(2));
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let err = Mesh::new(vec![[0.0; 3]; 3], vec![[0.0, 1.0, 0.0]; 2], vec![0, 1, 2]).unwrap_err();
        assert_eq!(err, MeshError::LengthMismatch { positions: 3, normals: 2 });
    }

    #[test]
    fn fit_to_size_centers_and_scales_longest_edge() {
        let mut positions = vec![[1.0, 2.0, 3.0], [5.0, 3.0, 4.0], [3.0, 2.5, 3.5]];
        fit_to_size(&mut positions, 2.0);
        let (min, max) = bounds_of(&positions).unwrap();
        assert!(((min + max) * 0.5).length() < 1e-6);
        assert!(((max - min).max_element() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn fit_to_size_handles_single_point() {
        let mut positions = vec![[3.0, 3.0, 3.0]];
        fit_to_size(&mut positions, 1.6);
        assert_eq!(positions[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn index_format_widens_past_u16() {
        let small = triangulate_smooth(&quad()).unwrap();
        assert_eq!(small.index_format(), wgpu::IndexFormat::Uint16);

        let n = U16_INDEX_LIMIT + 1;
        let big = Mesh::new(vec![[0.0; 3]; n], vec![FALLBACK_NORMAL; n], vec![0, 1, n as u32 - 1]).unwrap();
        assert_eq!(big.index_format(), wgpu::IndexFormat::Uint32);
    }
}

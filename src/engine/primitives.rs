// Procedural primitives: UV sphere, hard-edged cube, smooth-shaded cube.
//
// All generators emit CCW winding viewed from outside, matching the
// front-face convention the hull outline pass culls against.

use std::f32::consts::PI;
use std::str::FromStr;

use glam::Vec3;

use super::mesh::Mesh;

pub const DEFAULT_SPHERE_SLICES: u32 = 48;
pub const DEFAULT_SPHERE_STACKS: u32 = 32;

/// Built-in meshes selectable from the command line and the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Sphere,
    Cube,
    SmoothCube,
}

impl Primitive {
    pub const ALL: [Primitive; 3] = [Primitive::Sphere, Primitive::Cube, Primitive::SmoothCube];

    /// Build the primitive so its longest bounding-box edge equals `size`.
    pub fn build(self, size: f32) -> Mesh {
        match self {
            Primitive::Sphere => sphere(size * 0.5, DEFAULT_SPHERE_SLICES, DEFAULT_SPHERE_STACKS),
            Primitive::Cube => cube(size),
            Primitive::SmoothCube => smooth_cube(size),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Primitive::Sphere => "sphere",
            Primitive::Cube => "cube",
            Primitive::SmoothCube => "smooth-cube",
        }
    }
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Primitive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Primitive::ALL
            .into_iter()
            .find(|p| p.label() == s)
            .ok_or_else(|| format!("unknown primitive `{s}` (expected sphere, cube or smooth-cube)"))
    }
}

// ============================================================================
// SPHERE
// ============================================================================

/// UV sphere with `(slices + 1) * (stacks + 1)` vertices and
/// `2 * slices * stacks` triangles. The seam column is duplicated so every
/// ring is a closed strip.
pub fn sphere(radius: f32, slices: u32, stacks: u32) -> Mesh {
    let slices = slices.max(3);
    let stacks = stacks.max(2);
    let ring = slices + 1;

    let mut positions = Vec::with_capacity((ring * (stacks + 1)) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());

    for i in 0..=stacks {
        let phi = i as f32 / stacks as f32 * PI;
        let (r, y) = (phi.sin(), phi.cos());
        for j in 0..=slices {
            let theta = j as f32 / slices as f32 * 2.0 * PI;
            let n = Vec3::new(r * theta.cos(), y, r * theta.sin());
            positions.push((n * radius).to_array());
            normals.push(n.normalize().to_array());
        }
    }

    let mut indices = Vec::with_capacity((slices * stacks * 6) as usize);
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * ring + j;
            let b = a + ring;
            indices.extend_from_slice(&[a, a + 1, b]);
            indices.extend_from_slice(&[b, a + 1, b + 1]);
        }
    }

    Mesh::from_generated(positions, normals, indices)
}

// ============================================================================
// CUBES
// ============================================================================

/// Corner layout (relative to center, half-extent h):
///   0: (-h, -h, +h)  front-bottom-left
///   1: (+h, -h, +h)  front-bottom-right
///   2: (+h, +h, +h)  front-top-right
///   3: (-h, +h, +h)  front-top-left
///   4: (+h, -h, -h)  back-bottom-right
///   5: (-h, -h, -h)  back-bottom-left
///   6: (-h, +h, -h)  back-top-left
///   7: (+h, +h, -h)  back-top-right
const CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0],
    [ 1.0, -1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [-1.0,  1.0, -1.0],
    [ 1.0,  1.0, -1.0],
];

/// 6 quads, CCW from outside.
const QUADS: [[usize; 4]; 6] = [
    [0, 1, 2, 3], // front  (+Z)
    [4, 5, 6, 7], // back   (-Z)
    [5, 0, 3, 6], // left   (-X)
    [1, 4, 7, 2], // right  (+X)
    [3, 2, 7, 6], // top    (+Y)
    [5, 4, 1, 0], // bottom (-Y)
];

/// Hard-edged cube: 4 vertices per face carrying the face normal
/// (24 vertices, 12 triangles).
pub fn cube(size: f32) -> Mesh {
    let h = size * 0.5;
    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for quad in QUADS {
        let corner = |k: usize| Vec3::from_array(CORNERS[quad[k]]) * h;
        let normal = (corner(1) - corner(0)).cross(corner(3) - corner(0)).normalize();
        let base = positions.len() as u32;
        for k in 0..4 {
            positions.push(corner(k).to_array());
            normals.push(normal.to_array());
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh::from_generated(positions, normals, indices)
}

/// Smooth cube: 8 shared corners whose normals point along the corner
/// direction (8 vertices, 12 triangles).
pub fn smooth_cube(size: f32) -> Mesh {
    let h = size * 0.5;
    let positions = CORNERS.iter().map(|&c| (Vec3::from_array(c) * h).to_array()).collect();
    let normals = CORNERS.iter().map(|&c| Vec3::from_array(c).normalize().to_array()).collect();
    let indices = QUADS
        .iter()
        .flat_map(|q| [q[0], q[1], q[2], q[0], q[2], q[3]])
        .map(|i| i as u32)
        .collect();

    Mesh::from_generated(positions, normals, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit_normals(mesh: &Mesh) {
        for n in mesh.normals() {
            let len = Vec3::from_array(*n).length();
            assert!((len - 1.0).abs() < 1e-5, "normal length {len}");
        }
    }

    fn assert_outward_winding(mesh: &Mesh) {
        let p = mesh.positions();
        for tri in mesh.triangle_indices().chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vec3::from_array(p[tri[k] as usize]));
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            if face_normal.length() > 1e-6 {
                assert!(face_normal.dot(centroid) > 0.0, "inward-facing triangle {tri:?}");
            }
        }
    }

    #[test]
    fn sphere_counts_match_slices_and_stacks() {
        for (s, t) in [(3, 2), (8, 4), (48, 32)] {
            let mesh = sphere(1.0, s, t);
            assert_eq!(mesh.vertex_count(), ((s + 1) * (t + 1)) as usize);
            assert_eq!(mesh.triangle_count(), (2 * s * t) as usize);
            assert_eq!(mesh.wireframe_indices().len(), 2 * mesh.triangle_indices().len());
            assert_unit_normals(&mesh);
        }
    }

    #[test]
    fn sphere_winds_outward() {
        assert_outward_winding(&sphere(1.0, 12, 8));
    }

    #[test]
    fn hard_cube_duplicates_vertices_per_face() {
        let mesh = cube(1.6);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert_unit_normals(&mesh);
        assert_outward_winding(&mesh);
        let (min, max) = mesh.bounds().unwrap();
        assert!((max - min - Vec3::splat(1.6)).length() < 1e-6);
    }

    #[test]
    fn smooth_cube_shares_corners() {
        let mesh = smooth_cube(1.6);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert_unit_normals(&mesh);
        assert_outward_winding(&mesh);
        for (p, n) in mesh.positions().iter().zip(mesh.normals()) {
            let dir = Vec3::from_array(*p).normalize();
            assert!((dir - Vec3::from_array(*n)).length() < 1e-6);
        }
    }

    #[test]
    fn primitive_parses_labels() {
        for p in Primitive::ALL {
            assert_eq!(p.label().parse::<Primitive>(), Ok(p));
        }
        assert!("torus".parse::<Primitive>().is_err());
    }

    #[test]
    fn built_primitives_span_requested_size() {
        for p in Primitive::ALL {
            let (min, max) = p.build(2.0).bounds().unwrap();
            assert!(((max - min).max_element() - 2.0).abs() < 1e-5, "{p}");
        }
    }
}

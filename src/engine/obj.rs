// Wavefront OBJ import on top of the `obj-rs` raw parser.
//
// The parser resolves 1-based and negative indices. This module adds the
// viewer's rules: consistent normal references, fan triangulation, smooth
// normals when none are given, the index-width limit and the final
// recenter/rescale.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ::obj::raw::object::Polygon;
use ::obj::raw::{parse_obj as parse_raw, RawObj};
use glam::Vec3;

use super::error::{ImportError, IndexKind};
use super::mesh::{fit_to_size, safe_normal, triangulate_smooth, Mesh, PolyMesh, U16_INDEX_LIMIT};

pub const DEFAULT_TARGET_SIZE: f32 = 1.6;

/// Index width the imported mesh has to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    /// Maximum vertex count addressable with this width.
    pub fn vertex_limit(self) -> usize {
        match self {
            IndexWidth::U16 => U16_INDEX_LIMIT,
            IndexWidth::U32 => u32::MAX as usize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    /// Longest bounding-box edge after import.
    pub target_size: f32,
    pub index_width: IndexWidth,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            index_width: IndexWidth::U16,
        }
    }
}

/// One polygon corner as 0-based indices.
#[derive(Debug, Clone, Copy)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

/// Read and import a mesh file from disk.
pub fn load_obj_file(path: &Path, options: &ImportOptions) -> Result<Mesh, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = import(BufReader::new(file), options)?;
    log::info!(
        "Imported {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Parse mesh text, fan-triangulate, derive normals if absent, then recenter
/// and rescale to `options.target_size`.
pub fn parse_obj(text: &str, options: &ImportOptions) -> Result<Mesh, ImportError> {
    import(text.as_bytes(), options)
}

fn import(input: impl BufRead, options: &ImportOptions) -> Result<Mesh, ImportError> {
    let raw = parse_raw(input)?;
    if raw.positions.is_empty() || raw.polygons.is_empty() {
        return Err(ImportError::NoGeometry);
    }

    let faces: Vec<Vec<Corner>> = raw.polygons.iter().map(corners).collect();
    check_faces(&raw, &faces)?;

    let with_normals = faces.iter().filter(|f| f[0].normal.is_some()).count();
    if with_normals == 0 {
        assemble_smooth(&raw, &faces, options)
    } else if with_normals == faces.len() {
        assemble_with_normals(&raw, &faces, options)
    } else {
        Err(ImportError::MixedNormals)
    }
}

fn corners(polygon: &Polygon) -> Vec<Corner> {
    match polygon {
        Polygon::P(ps) => ps.iter().map(|&p| Corner { position: p, normal: None }).collect(),
        Polygon::PT(ps) => ps.iter().map(|&(p, _)| Corner { position: p, normal: None }).collect(),
        Polygon::PN(ps) => ps.iter().map(|&(p, n)| Corner { position: p, normal: Some(n) }).collect(),
        Polygon::PTN(ps) => ps
            .iter()
            .map(|&(p, _, n)| Corner { position: p, normal: Some(n) })
            .collect(),
    }
}

fn check_faces(raw: &RawObj, faces: &[Vec<Corner>]) -> Result<(), ImportError> {
    for (polygon, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(ImportError::ShortFace { polygon, corners: face.len() });
        }
        for corner in face {
            check_range(corner.position, raw.positions.len(), IndexKind::Position)?;
            if let Some(n) = corner.normal {
                check_range(n, raw.normals.len(), IndexKind::Normal)?;
            }
        }
    }
    Ok(())
}

fn check_range(index: usize, count: usize, kind: IndexKind) -> Result<(), ImportError> {
    if index >= count {
        // Report in the file's 1-based numbering.
        return Err(ImportError::IndexOutOfRange { kind, index: index + 1, count });
    }
    Ok(())
}

fn check_vertex_limit(count: usize, options: &ImportOptions) -> Result<(), ImportError> {
    let limit = options.index_width.vertex_limit();
    if count > limit {
        return Err(ImportError::TooManyVertices { count, limit });
    }
    Ok(())
}

fn position(raw: &RawObj, index: usize) -> Vec3 {
    let (x, y, z, _) = raw.positions[index];
    Vec3::new(x, y, z)
}

/// No normal references: one vertex per position, normals accumulated from faces.
fn assemble_smooth(raw: &RawObj, faces: &[Vec<Corner>], options: &ImportOptions) -> Result<Mesh, ImportError> {
    check_vertex_limit(raw.positions.len(), options)?;

    let mut poly = PolyMesh::new((0..raw.positions.len()).map(|i| position(raw, i)).collect());
    for face in faces {
        poly.add_face(face.iter().map(|c| c.position).collect());
    }
    let mesh = triangulate_smooth(&poly)?;

    let mut fitted = mesh.positions().to_vec();
    fit_to_size(&mut fitted, options.target_size);
    Ok(Mesh::new(fitted, mesh.normals().to_vec(), mesh.triangle_indices().to_vec())?)
}

/// Every corner references a normal: one vertex per unique (position, normal) pair.
fn assemble_with_normals(
    raw: &RawObj,
    faces: &[Vec<Corner>],
    options: &ImportOptions,
) -> Result<Mesh, ImportError> {
    let mut lookup: HashMap<(usize, usize), u32> = HashMap::new();
    let mut out_positions: Vec<[f32; 3]> = Vec::new();
    let mut out_normals: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    let mut vertex_for = |c: &Corner| -> u32 {
        let key = (c.position, c.normal.unwrap_or_default());
        *lookup.entry(key).or_insert_with(|| {
            let (nx, ny, nz) = raw.normals[key.1];
            out_positions.push(position(raw, key.0).to_array());
            out_normals.push(safe_normal(Vec3::new(nx, ny, nz)));
            (out_positions.len() - 1) as u32
        })
    };

    for face in faces {
        let first = vertex_for(&face[0]);
        for pair in face[1..].windows(2) {
            let b = vertex_for(&pair[0]);
            let c = vertex_for(&pair[1]);
            indices.extend_from_slice(&[first, b, c]);
        }
    }

    check_vertex_limit(out_positions.len(), options)?;
    fit_to_size(&mut out_positions, options.target_size);
    Ok(Mesh::new(out_positions, out_normals, indices)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_WITH_NORMALS: &str = "\
# unit cube, one normal per face
v -1 -1  1
v  1 -1  1
v  1  1  1
v -1  1  1
v  1 -1 -1
v -1 -1 -1
v -1  1 -1
v  1  1 -1
vn 0 0 1
vn 0 0 -1
vn -1 0 0
vn 1 0 0
vn 0 1 0
vn 0 -1 0
f 1//1 2//1 3//1 4//1
f 5//2 6//2 7//2 8//2
f 6//3 1//3 4//3 7//3
f 2//4 5//4 8//4 3//4
f 4//5 3//5 8//5 7//5
f 6//6 5//6 2//6 1//6
";

    const CUBE_NO_NORMALS: &str = "\
v 0 0 2
v 4 0 2
v 4 4 2
v 0 4 2
v 4 0 -2
v 0 0 -2
v 0 4 -2
v 4 4 -2
f 1 2 3 4
f 5 6 7 8
f 6 1 4 7
f 2 5 8 3
f 4 3 8 7
f 6 5 2 1
";

    fn check_fitted(mesh: &Mesh, target: f32) {
        let (min, max) = mesh.bounds().unwrap();
        let center = (min + max) * 0.5;
        assert!(center.length() < 1e-5, "center {center:?}");
        assert!(((max - min).max_element() - target).abs() < 1e-5);
    }

    #[test]
    fn explicit_normals_yield_one_vertex_per_pair() {
        let mesh = parse_obj(CUBE_WITH_NORMALS, &ImportOptions::default()).unwrap();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.wireframe_indices().len(), 2 * mesh.triangle_indices().len());
        check_fitted(&mesh, DEFAULT_TARGET_SIZE);
    }

    #[test]
    fn shared_pairs_are_deduplicated() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\nf 1//1 3//1 4//1\n";
        let mesh = parse_obj(text, &ImportOptions::default()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_indices(), &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn missing_normals_are_computed_smoothly() {
        let mesh = parse_obj(CUBE_NO_NORMALS, &ImportOptions { target_size: 2.0, ..Default::default() }).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        check_fitted(&mesh, 2.0);
        for (p, n) in mesh.positions().iter().zip(mesh.normals()) {
            let n = Vec3::from_array(*n);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.dot(Vec3::from_array(*p)) > 0.0, "normal should point away from center");
        }
    }

    #[test]
    fn polygons_are_fan_triangulated() {
        let text = "v 0 0 0\nv 1 0 0\nv 2 1 0\nv 1 2 0\nv 0 1 0\nf 1 2 3 4 5\n";
        let mesh = parse_obj(text, &ImportOptions::default()).unwrap();
        assert_eq!(mesh.triangle_indices(), &[0, 1, 2, 0, 2, 3, 0, 3, 4]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = parse_obj(text, &ImportOptions::default()).unwrap();
        assert_eq!(mesh.triangle_indices(), &[0, 1, 2]);
    }

    #[test]
    fn texcoord_references_are_ignored() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";
        let mesh = parse_obj(text, &ImportOptions::default()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.normals()[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn degenerate_faces_do_not_fail() {
        let text = "v 0 0 0\nv 0 0 0\nv 0 0 0\nv 1 1 1\nf 1 2 3\nf 1 2 4\n";
        let mesh = parse_obj(text, &ImportOptions::default()).unwrap();
        assert!(mesh.normals().iter().all(|n| n.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn empty_sources_fail() {
        assert!(matches!(parse_obj("", &ImportOptions::default()), Err(ImportError::NoGeometry)));
        assert!(matches!(
            parse_obj("# only a comment\nv 0 0 0\nv 1 0 0\n", &ImportOptions::default()),
            Err(ImportError::NoGeometry)
        ));
        assert!(parse_obj("f 1 2 3\n", &ImportOptions::default()).is_err());
    }

    #[test]
    fn mixed_normal_references_fail() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\nf 2 4 3\n";
        let err = parse_obj(text, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::MixedNormals));
        assert!(err.to_string().contains("mixed normals"));
    }

    // The parser rejects most bad references itself; the range check
    // catches whatever it lets through.
    fn is_bad_reference(err: &ImportError) -> bool {
        matches!(err, ImportError::Obj(_) | ImportError::IndexOutOfRange { .. })
    }

    #[test]
    fn out_of_range_indices_fail() {
        let opts = ImportOptions::default();
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n", &opts).unwrap_err();
        assert!(is_bad_reference(&err), "{err:?}");

        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n", &opts).unwrap_err();
        assert!(is_bad_reference(&err), "{err:?}");

        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2//1 3//1\n", &opts).unwrap_err();
        assert!(is_bad_reference(&err), "{err:?}");
    }

    #[test]
    fn range_errors_use_file_numbering() {
        let err = check_range(3, 3, IndexKind::Normal).unwrap_err();
        assert!(matches!(err, ImportError::IndexOutOfRange { kind: IndexKind::Normal, index: 4, count: 3 }));
        assert!(check_range(2, 3, IndexKind::Position).is_ok());
    }

    #[test]
    fn malformed_numbers_fail_in_the_parser() {
        let err = parse_obj("v 0 0 0\nv 1 zero 0\n", &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::Obj(_)), "{err:?}");
    }

    #[test]
    fn vertex_limit_names_the_count() {
        let n = U16_INDEX_LIMIT + 1;
        let mut text = String::with_capacity(n * 8);
        for i in 0..n {
            text.push_str(&format!("v {i} 0 0\n"));
        }
        text.push_str("f 1 2 3\n");

        let err = parse_obj(&text, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::TooManyVertices { count, limit: 65535 } if count == n));
        assert!(err.to_string().contains(&n.to_string()));

        let wide = ImportOptions { index_width: IndexWidth::U32, ..Default::default() };
        assert_eq!(parse_obj(&text, &wide).unwrap().vertex_count(), n);
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let err = load_obj_file(Path::new("/definitely/not/here.obj"), &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}

// Error types for mesh construction, mesh import and GPU setup.

use std::path::PathBuf;

/// A mesh whose arrays violate the mesh invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has {positions} positions but {normals} normals")]
    LengthMismatch { positions: usize, normals: usize },

    #[error("triangle index count {0} is not a multiple of 3")]
    NotTriangles(usize),

    #[error("triangle index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Which kind of record an out-of-range face reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Position,
    Normal,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Normal => write!(f, "normal"),
        }
    }
}

/// Failure to turn polygon-mesh text into a [`Mesh`](super::mesh::Mesh).
///
/// An import either succeeds completely or leaves the caller's current mesh
/// untouched; nothing is partially applied.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("no vertex or face records found")]
    NoGeometry,

    #[error("malformed mesh source: {0}")]
    Obj(#[from] ::obj::ObjError),

    #[error("face {polygon} has {corners} corners, at least 3 are needed")]
    ShortFace { polygon: usize, corners: usize },

    #[error("{kind} index {index} is out of range ({count} defined)")]
    IndexOutOfRange { kind: IndexKind, index: usize, count: usize },

    #[error("mixed normals: some faces reference normals and others do not")]
    MixedNormals,

    #[error("mesh too large: {count} vertices exceeds the index limit of {limit}")]
    TooManyVertices { count: usize, limit: usize },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Fatal problems while bringing up the GPU side of the viewer.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsSetupError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,

    #[error("shader `{label}` failed to compile:\n{diagnostic}")]
    ShaderCompile { label: String, diagnostic: String },

    #[error("pipeline `{label}` failed to link:\n{diagnostic}")]
    PipelineLink { label: String, diagnostic: String },
}

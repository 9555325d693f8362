// Engine module - mesh model, camera, frame planning and the wgpu renderer.
// Everything above `renderer` / `pipelines` / `gpu` / `overlay` runs without a GPU.

pub mod camera;
pub mod edges;
pub mod error;
pub mod frame;
pub mod gbuffer;
pub mod gpu;
pub mod input;
pub mod mesh;
pub mod obj;
pub mod outline;
pub mod overlay;
pub mod pipelines;
pub mod primitives;
pub mod renderer;
pub mod scene;
pub mod shading;

// Re-export commonly used items
pub use camera::OrbitCamera;
pub use error::{GraphicsSetupError, ImportError, MeshError};
pub use frame::{FramePlan, Pass, PassKind, Viewport, ViewportPlan};
pub use mesh::Mesh;
pub use obj::{ImportOptions, IndexWidth};
pub use outline::OutlineMode;
pub use primitives::Primitive;
pub use renderer::Renderer;
pub use scene::ViewerState;
pub use shading::ShadingMode;

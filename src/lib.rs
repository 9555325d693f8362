// Non-photorealistic mesh viewer.
// Multi-pass wgpu renderer (Lambert / Gooch / toon / hatch) with hull and
// screen-space outlines, an orbit camera and side-by-side compare mode.

pub mod engine;

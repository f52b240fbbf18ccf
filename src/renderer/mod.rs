//! WebGPU rendering module
//!
//! Uses SDF (Signed Distance Fields) for all rendering in the fragment shader.
//! [`scene`] builds the per-frame draw data; [`sdf_pipeline`] uploads and draws it.

pub mod scene;
pub mod sdf_pipeline;

pub use scene::Scene;
pub use sdf_pipeline::SdfRenderState;

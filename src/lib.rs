//! atlas-cube
//!
//! A small wgpu viewer that composites six images into one texture atlas and
//! maps it onto an orbit-controllable box. It runs in the browser on WebGL2
//! (wgpu's GL backend) and natively in a window or offscreen.
//!
//! High-level modules
//! - `math`: look-at and perspective matrices in GL clip conventions
//! - `atlas`: atlas slot layout, UV rectangles and the CPU compositor
//! - `camera`: orbit camera, input controller and GPU uniforms
//! - `config`: viewer configuration and stock image list
//! - `context`: GPU and window context owning the device, queue and camera
//! - `data_structures`: the cube mesh and GPU texture helpers
//! - `flow`: the winit event loop tying loading, input and drawing together
//! - `pipelines`: render pipelines for the cube and the atlas backdrop
//! - `render`: scene resources and frame encoding
//! - `resources`: asset fetching and image decoding
//! - `snapshot`: offscreen single-frame rendering (native only)
//!

pub mod atlas;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod math;
pub mod pipelines;
pub mod render;
pub mod resources;
#[cfg(not(target_arch = "wasm32"))]
pub mod snapshot;

// Re-exports commonly used types for convenience in downstream code.
pub use atlas::{Atlas, AtlasLayout};
pub use camera::OrbitCamera;
pub use config::ViewerConfig;
pub use flow::run;

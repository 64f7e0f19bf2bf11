//! orbit-shapes
//!
//! Procedurally generated boxes, spheres, cylinders and grids drawn with an
//! orbiting camera. The interesting part is the frame pacing between CPU and
//! GPU: a fence marks every submission and a small ring of frame resources
//! lets the CPU prepare the next frame while the GPU still draws earlier ones.
//!
//! High-level modules
//! - `app`: window, event loop and the per-frame update/draw sequence
//! - `camera`: orbit camera, projection and per-pass constants
//! - `config`: command line options
//! - `context`: instance, adapter, device and queue
//! - `data_structures`: vertices, generated meshes, waves and render items
//! - `pipelines`: the colour pipeline and its bind group layouts
//! - `render`: the renderer owning every GPU resource of a scene
//! - `resources`: upload buffers and frame resources
//! - `scene`: the shapes and land-and-waves demo scenes
//! - `swap_chain`: presentation surface, depth and multisample targets
//! - `sync`: fence and frame resource ring
//! - `timer`: frame timing and statistics
//!

pub mod app;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod swap_chain;
pub mod sync;
pub mod timer;

pub use app::run;
pub use config::{AppConfig, DemoKind};

//! Scene data: vertices, procedural meshes, GPU geometry and render items.
//!
//! - `vertex` holds the vertex format and the named colours of the demo
//! - `geometry` generates boxes, spheres, cylinders and grids on the CPU
//! - `waves` is the water simulation of the land-and-waves scene
//! - `mesh` keeps uploaded vertex/index buffers and their submeshes
//! - `render_item` describes one draw call and its dirty-frame bookkeeping
//! - `texture` creates the depth-stencil and multisample render targets

pub mod geometry;
pub mod mesh;
pub mod render_item;
pub mod texture;
pub mod vertex;
pub mod waves;

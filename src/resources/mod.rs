//! GPU buffers the CPU writes every frame.
//!
//! - `upload` pairs mappable staging memory with GPU-local buffers
//! - `frame` bundles the buffers of one in-flight frame

pub mod frame;
pub mod upload;

pub use frame::{FrameResource, ObjectConstants, PassConstants};
pub use upload::{UploadBuffer, align_to};

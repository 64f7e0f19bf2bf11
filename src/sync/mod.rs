//! CPU/GPU synchronization: fences and the frame-resource ring.

pub mod fence;
pub mod frame_ring;

pub use fence::{Fence, GpuTimeline, QueueTimeline};
pub use frame_ring::FrameRing;

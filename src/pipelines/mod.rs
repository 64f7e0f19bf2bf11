//! Render pipelines and the bind group layouts they share with the frame resources.

pub mod color;
pub mod layouts;

pub use color::{PipelineSettings, mk_color_pipeline};
pub use layouts::ConstantLayouts;

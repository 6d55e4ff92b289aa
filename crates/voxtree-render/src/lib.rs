//! Demo renderer around the voxel core: camera, framebuffer, and a
//! row-partitioned parallel render loop.

mod camera;
mod framebuffer;
mod render;

pub use camera::Camera;
pub use framebuffer::{Framebuffer, RenderError};
pub use render::Renderer;

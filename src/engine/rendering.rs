//! ### English
//! Rendering module entry point.
//! Splits pixel-format negotiation and the lock-guarded surface state into submodules.
//!
//! ### 中文
//! 渲染模块入口。
//! 将像素格式协商与受锁保护的 surface 状态拆分到子模块。

mod pixel_format;
mod surface_state;

pub use pixel_format::{PixelFormatAttribute, PixelFormatDescriptor, candidate_formats, negotiate};
pub(crate) use surface_state::SurfaceState;

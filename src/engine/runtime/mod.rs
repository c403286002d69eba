//! ### English
//! Render surface runtime (public API): the surface owner's handle and its render-producer thread.
//!
//! ### 中文
//! 渲染 surface 运行时（对外公开 API）：surface 持有者的句柄及其渲染生产者线程。

mod command;
mod render_thread;
mod surface;

pub(crate) use command::RenderTask;
pub use surface::{
    DEFAULT_LIVE_RESIZE_POLL_INTERVAL, DEFAULT_SKIP_RENDER_GRACE, RenderSurface, SurfaceConfig,
};

//! ### English
//! Narrow interfaces to the collaborators this crate does not own: the playback session's render
//! engine, the windowing compositor, and the GPU context.
//!
//! ### 中文
//! 本 crate 不拥有的外部协作者的窄接口：播放会话的渲染引擎、窗口合成器以及 GPU 上下文。
mod compositor;
mod gpu;
mod render_engine;

pub use compositor::{Compositor, CompositorCallbacks, ContextHandle, FrameTiming};
pub use gpu::{GpuContext, GpuContextFactory};
pub use render_engine::{Framebuffer, RenderEngine};

pub(crate) use gpu::CurrentContext;
pub(crate) use render_engine::EngineLock;

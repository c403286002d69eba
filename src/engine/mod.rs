/// ### English
/// Engine internal modules (locking primitives, render coordination, runtime thread, and the
/// interfaces to external collaborators).
///
/// ### 中文
/// 引擎内部模块（锁原语、渲染协调、运行时线程，以及与外部协作者的接口）。
pub mod coordinator;
pub mod error;
pub mod external;
pub mod flags;
pub mod frame;
pub mod rendering;
pub mod runtime;
pub mod sync;

pub use coordinator::{CoordinatorState, RenderCoordinator, RenderStats};
pub use error::{GpuContextError, SurfaceError};
pub use external::{
    Compositor, CompositorCallbacks, ContextHandle, FrameTiming, Framebuffer, GpuContext,
    GpuContextFactory, RenderEngine,
};
pub use frame::FrameRequest;
pub use rendering::{PixelFormatAttribute, PixelFormatDescriptor};
pub use runtime::{RenderSurface, SurfaceConfig};

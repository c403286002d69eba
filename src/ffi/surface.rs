//! ### English
//! C ABI bindings for the surface lifecycle and producer-side calls.
//!
//! ### 中文
//! surface 生命周期及生产者侧调用的 C ABI 绑定。

use std::sync::Arc;
use std::time::Duration;

use dpi::PhysicalSize;
use parking_lot::Mutex;
use tracing::warn;

use super::vtable::{
    ForeignCompositor, ForeignContextFactory, ForeignEngine, VideoSurfaceCompositorVtable,
    VideoSurfaceContextFactoryVtable, VideoSurfaceEngineVtable,
};
use super::{VideoSurface, VideoSurfaceConfig, VideoSurfaceStats};
use crate::engine::{RenderEngine, RenderSurface, SurfaceConfig};

impl From<VideoSurfaceConfig> for SurfaceConfig {
    fn from(value: VideoSurfaceConfig) -> Self {
        let mut config = SurfaceConfig {
            initial_size: PhysicalSize::new(value.width.max(1), value.height.max(1)),
            flags: value.flags,
            ..SurfaceConfig::default()
        };
        if value.live_resize_poll_interval_us != 0 {
            config.live_resize_poll_interval =
                Duration::from_micros(u64::from(value.live_resize_poll_interval_us));
        }
        if value.skip_render_grace_us != 0 {
            config.skip_render_grace = Duration::from_micros(u64::from(value.skip_render_grace_us));
        }
        config
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Creates a render surface. The calling thread becomes the UI thread.
///
/// Ownership of the engine and compositor `user_data` moves into the surface; their `release`
/// callbacks run even when creation fails. The context factory is only borrowed.
/// Returns NULL on failure (null arguments, no compatible pixel format, thread spawn failure).
///
/// #### Parameters
/// - `config`: Surface configuration.
/// - `engine`: Render engine vtable.
/// - `compositor`: Compositor vtable.
/// - `context_factory`: GPU context factory vtable.
///
/// ### 中文
/// 创建渲染 surface。调用线程成为 UI 线程。
///
/// 引擎与合成器 `user_data` 的所有权转移给 surface；即使创建失败也会调用它们的 `release`。
/// 上下文工厂只在调用期间被借用。失败时（参数为空、无兼容像素格式、线程创建失败）返回 NULL。
///
/// #### 参数
/// - `config`：surface 配置。
/// - `engine`：渲染引擎 vtable。
/// - `compositor`：合成器 vtable。
/// - `context_factory`：GPU 上下文工厂 vtable。
pub unsafe extern "C" fn video_surface_create(
    config: *const VideoSurfaceConfig,
    engine: *const VideoSurfaceEngineVtable,
    compositor: *const VideoSurfaceCompositorVtable,
    context_factory: *const VideoSurfaceContextFactoryVtable,
) -> *mut VideoSurface {
    let engine = unsafe { engine.as_ref() }
        .map(|vtable| Arc::new(ForeignEngine::new(*vtable)) as Arc<dyn RenderEngine>);
    let compositor =
        unsafe { compositor.as_ref() }.map(|vtable| Arc::new(ForeignCompositor::new(*vtable)));
    // Adapters built above release their `user_data` when dropped on this early return.
    let (Some(config), Some(factory), Some(engine), Some(compositor)) = (
        unsafe { config.as_ref() },
        unsafe { context_factory.as_ref() },
        engine,
        compositor,
    ) else {
        warn!("video_surface_create called with a null argument");
        return std::ptr::null_mut();
    };
    let factory = ForeignContextFactory::new(*factory);

    match RenderSurface::new((*config).into(), &factory, &engine, compositor) {
        Ok(surface) => Box::into_raw(Box::new(VideoSurface {
            surface,
            engine: Mutex::new(engine),
        })),
        Err(err) => {
            warn!(%err, "video_surface_create failed");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Tears down and destroys a surface created by `video_surface_create`.
///
/// Blocks until no draw is in flight and the render thread has exited. Layers retained by the
/// compositor stay valid but every callback on them becomes a no-op.
///
/// ### 中文
/// 销毁由 `video_surface_create` 创建的 surface。
///
/// 会阻塞直到没有进行中的绘制且渲染线程已退出。合成器持有的 layer 仍然有效，但其上的所有回调都变为 no-op。
pub unsafe extern "C" fn video_surface_destroy(surface: *mut VideoSurface) {
    if surface.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(surface));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Signals that a frame is owed. Callable from any thread.
///
/// ### 中文
/// 通知欠一帧。可从任意线程调用。
pub unsafe extern "C" fn video_surface_request_redraw(surface: *const VideoSurface, force: bool) {
    let Some(surface) = (unsafe { surface.as_ref() }) else {
        return;
    };
    surface.surface.request_redraw(force);
}

#[unsafe(no_mangle)]
/// ### English
/// Enters or leaves live-resize mode (UI thread).
///
/// ### 中文
/// 进入或退出 live-resize 模式（UI 线程）。
pub unsafe extern "C" fn video_surface_set_live_resize(surface: *const VideoSurface, active: bool) {
    let Some(surface) = (unsafe { surface.as_ref() }) else {
        return;
    };
    surface.surface.set_live_resize(active);
}

#[unsafe(no_mangle)]
/// ### English
/// Resizes the drawable. Returns whether the size changed.
///
/// ### 中文
/// 调整可绘制区域尺寸。返回尺寸是否发生变化。
pub unsafe extern "C" fn video_surface_resize(
    surface: *const VideoSurface,
    width: u32,
    height: u32,
) -> bool {
    let Some(surface) = (unsafe { surface.as_ref() }) else {
        return false;
    };
    surface.surface.resize(PhysicalSize::new(width, height))
}

#[unsafe(no_mangle)]
/// ### English
/// Replaces the render engine. The previous engine is released once no draw uses it.
/// Returns `false` (and releases `engine`) if the surface is torn down.
///
/// ### 中文
/// 替换渲染引擎。旧引擎在不再被绘制使用后释放。
/// 若 surface 已销毁则返回 `false`（并释放 `engine`）。
pub unsafe extern "C" fn video_surface_attach_engine(
    surface: *const VideoSurface,
    engine: *const VideoSurfaceEngineVtable,
) -> bool {
    let Some(surface) = (unsafe { surface.as_ref() }) else {
        return false;
    };
    let Some(engine) = (unsafe { engine.as_ref() }) else {
        return false;
    };

    let engine: Arc<dyn RenderEngine> = Arc::new(ForeignEngine::new(*engine));
    let mut current = surface.engine.lock();
    if surface.surface.attach_engine(&engine).is_err() {
        return false;
    }
    *current = engine;
    true
}

#[unsafe(no_mangle)]
/// ### English
/// Begins teardown without freeing the handle. Idempotent.
///
/// ### 中文
/// 开始销毁但不释放句柄。幂等。
pub unsafe extern "C" fn video_surface_teardown(surface: *const VideoSurface) {
    let Some(surface) = (unsafe { surface.as_ref() }) else {
        return;
    };
    surface.surface.teardown();
}

#[unsafe(no_mangle)]
/// ### English
/// Copies the render counters into `out`. Returns `false` on null arguments.
///
/// ### 中文
/// 将渲染计数器复制到 `out`。参数为空时返回 `false`。
pub unsafe extern "C" fn video_surface_get_stats(
    surface: *const VideoSurface,
    out: *mut VideoSurfaceStats,
) -> bool {
    let Some(surface) = (unsafe { surface.as_ref() }) else {
        return false;
    };
    if out.is_null() {
        return false;
    }
    unsafe { out.write(surface.surface.coordinator().stats().into()) };
    true
}

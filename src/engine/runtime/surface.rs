//! ### English
//! Render surface: negotiates the GPU context, owns the coordinator and its render thread.
//!
//! ### 中文
//! 渲染 surface：协商 GPU 上下文，持有协调器及其渲染线程。

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use dpi::PhysicalSize;
use tracing::debug;

use crate::engine::coordinator::{CoordinatorInit, RenderCoordinator};
use crate::engine::error::SurfaceError;
use crate::engine::external::{Compositor, GpuContextFactory, RenderEngine};
use crate::engine::rendering::{self, PixelFormatDescriptor};

use super::render_thread::{RenderThread, RenderTiming};

/// ### English
/// Default compositor poll period during live resize (one 60 Hz frame).
///
/// ### 中文
/// live resize 期间默认的合成器轮询周期（一个 60 Hz 帧）。
pub const DEFAULT_LIVE_RESIZE_POLL_INTERVAL: Duration = Duration::from_micros(16_667);

/// ### English
/// Default time a compositor has to draw an owed frame after `display` before it is skipped.
///
/// ### 中文
/// 默认情况下，合成器在 `display` 之后绘制欠帧的时限，超时则该帧被 skip。
pub const DEFAULT_SKIP_RENDER_GRACE: Duration = Duration::from_micros(16_667);

/// ### English
/// Render surface configuration.
///
/// ### 中文
/// 渲染 surface 配置。
#[derive(Clone, Debug)]
pub struct SurfaceConfig {
    /// ### English
    /// Initial drawable size in physical pixels (zero clamps to 1).
    ///
    /// ### 中文
    /// 初始可绘制尺寸（物理像素；0 会被钳制为 1）。
    pub initial_size: PhysicalSize<u32>,
    /// ### English
    /// `VIDEO_SURFACE_FLAG_*` bitmask.
    ///
    /// ### 中文
    /// `VIDEO_SURFACE_FLAG_*` 位掩码。
    pub flags: u32,
    /// ### English
    /// Compositor poll period while live resizing.
    ///
    /// ### 中文
    /// live resize 期间的合成器轮询周期。
    pub live_resize_poll_interval: Duration,
    /// ### English
    /// How long an owed frame may stay undrawn after `display` before it goes through
    /// skip-render. Compositors that draw late need a grace longer than their latency.
    ///
    /// ### 中文
    /// 欠帧在 `display` 之后可保持未绘制的时长，超时后走 skip-render。
    /// 延迟绘制的合成器需要比其延迟更长的宽限期。
    pub skip_render_grace: Duration,
    /// ### English
    /// OS name of the render-producer thread.
    ///
    /// ### 中文
    /// 渲染生产者线程的操作系统线程名。
    pub thread_name: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            initial_size: PhysicalSize::new(1, 1),
            flags: 0,
            live_resize_poll_interval: DEFAULT_LIVE_RESIZE_POLL_INTERVAL,
            skip_render_grace: DEFAULT_SKIP_RENDER_GRACE,
            thread_name: "VideoSurfaceRender".to_string(),
        }
    }
}

/// ### English
/// Render surface owned by the UI side.
///
/// Dropping it tears the surface down and stops the render thread.
///
/// ### 中文
/// 由 UI 侧持有的渲染 surface。
///
/// drop 时会销毁 surface 并停止渲染线程。
pub struct RenderSurface {
    coordinator: Arc<RenderCoordinator>,
    pixel_format: PixelFormatDescriptor,
    render_thread: RenderThread,
}

impl RenderSurface {
    /// ### English
    /// Creates a surface. The calling thread becomes the UI thread that gets draw-lock priority.
    ///
    /// #### Parameters
    /// - `config`: Surface configuration.
    /// - `factory`: Platform GPU context factory used for pixel-format negotiation.
    /// - `engine`: Render engine of the current playback session (held weakly).
    /// - `compositor`: Compositor that displays the surface's layer.
    ///
    /// ### 中文
    /// 创建 surface。调用线程成为在绘制锁上享有优先级的 UI 线程。
    ///
    /// #### 参数
    /// - `config`：surface 配置。
    /// - `factory`：用于像素格式协商的平台 GPU 上下文工厂。
    /// - `engine`：当前播放会话的渲染引擎（弱引用持有）。
    /// - `compositor`：显示该 surface layer 的合成器。
    pub fn new(
        config: SurfaceConfig,
        factory: &dyn GpuContextFactory,
        engine: &Arc<dyn RenderEngine>,
        compositor: Arc<dyn Compositor>,
    ) -> Result<Self, SurfaceError> {
        let (pixel_format, gpu) = rendering::negotiate(factory, config.flags)?;
        let (tasks, receiver) = unbounded();

        let coordinator = RenderCoordinator::new(CoordinatorInit {
            gpu,
            engine: Arc::downgrade(engine),
            compositor,
            initial_size: config.initial_size,
            ui_thread: thread::current().id(),
            tasks: tasks.clone(),
        });

        let render_thread = RenderThread::spawn(
            config.thread_name,
            coordinator.clone(),
            tasks,
            receiver,
            RenderTiming {
                poll_interval: config.live_resize_poll_interval,
                skip_render_grace: config.skip_render_grace,
            },
        )?;

        debug!(
            width = config.initial_size.width,
            height = config.initial_size.height,
            software = pixel_format.is_software(),
            "render surface created"
        );

        Ok(Self {
            coordinator,
            pixel_format,
            render_thread,
        })
    }

    /// ### English
    /// Coordinator shared with the compositor and producers.
    ///
    /// ### 中文
    /// 与合成器及生产者共享的协调器。
    pub fn coordinator(&self) -> &Arc<RenderCoordinator> {
        &self.coordinator
    }

    pub fn pixel_format(&self) -> &PixelFormatDescriptor {
        &self.pixel_format
    }

    pub fn request_redraw(&self, force: bool) {
        self.coordinator.request_redraw(force);
    }

    pub fn set_live_resize(&self, active: bool) {
        self.coordinator.set_live_resize(active);
    }

    /// ### English
    /// Resizes the drawable and forces a redraw at the new size.
    ///
    /// ### 中文
    /// 调整可绘制区域尺寸，并以新尺寸强制重绘。
    pub fn resize(&self, size: PhysicalSize<u32>) -> bool {
        self.coordinator.resize(size)
    }

    pub fn attach_engine(&self, engine: &Arc<dyn RenderEngine>) -> Result<(), SurfaceError> {
        self.coordinator.attach_engine(Arc::downgrade(engine))
    }

    /// ### English
    /// Begins teardown. Idempotent; also run on drop.
    ///
    /// ### 中文
    /// 开始销毁。幂等；drop 时也会执行。
    pub fn teardown(&self) {
        self.coordinator.teardown();
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        self.coordinator.teardown();
        self.render_thread.shutdown();
        debug!("render surface dropped");
    }
}

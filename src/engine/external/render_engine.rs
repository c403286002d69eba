//! ### English
//! Render engine of the active playback session (pixel producer).
//!
//! ### 中文
//! 当前播放会话的渲染引擎（像素生产者）。

use dpi::PhysicalSize;

/// ### English
/// Target handed to the engine for one frame.
///
/// ### 中文
/// 单帧渲染时交给引擎的目标描述。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    /// ### English
    /// Framebuffer object of the GPU context (0 = default framebuffer).
    ///
    /// ### 中文
    /// GPU 上下文的 framebuffer 对象（0 = 默认 framebuffer）。
    pub fbo: u32,
    /// ### English
    /// Drawable size in pixels.
    ///
    /// ### 中文
    /// 可绘制区域尺寸（像素）。
    pub size: PhysicalSize<u32>,
    /// ### English
    /// Whether the engine must flip vertically (GL origin is bottom-left).
    ///
    /// ### 中文
    /// 引擎是否需要垂直翻转（GL 原点在左下角）。
    pub flip_y: bool,
}

/// ### English
/// Render engine of a playback session.
///
/// The engine owns a lock around its own rendering context. Whenever this crate needs both that
/// lock and its own locks, the engine lock is taken first. The engine may call
/// `RenderCoordinator::request_redraw` while holding its lock.
///
/// ### 中文
/// 播放会话的渲染引擎。
///
/// 引擎持有一把保护其渲染上下文的锁。当本 crate 同时需要该锁与自身的锁时，必须先获取引擎锁。
/// 引擎可能在持有其锁时调用 `RenderCoordinator::request_redraw`。
pub trait RenderEngine: Send + Sync {
    /// ### English
    /// Acquires the engine's rendering-context lock.
    ///
    /// ### 中文
    /// 获取引擎渲染上下文锁。
    fn lock(&self);

    /// ### English
    /// Releases the lock taken by `lock`.
    ///
    /// ### 中文
    /// 释放 `lock` 获取的锁。
    fn unlock(&self);

    /// ### English
    /// Whether the engine has finished initializing its render context.
    ///
    /// ### 中文
    /// 引擎是否已完成渲染上下文的初始化。
    fn has_render_context(&self) -> bool;

    /// ### English
    /// Whether a new frame is ready to be drawn.
    ///
    /// ### 中文
    /// 是否有新帧等待绘制。
    fn has_new_frame(&self) -> bool;

    /// ### English
    /// Renders the current frame into `target`. The GPU context is current on the calling thread.
    ///
    /// ### 中文
    /// 将当前帧渲染到 `target`。调用线程上 GPU 上下文已为 current。
    fn render_into(&self, target: &Framebuffer);

    /// ### English
    /// Tells the engine the pending frame was intentionally dropped.
    ///
    /// ### 中文
    /// 通知引擎待绘制的帧被有意丢弃。
    fn skip_render(&self);

    /// ### English
    /// Flip acknowledgement: the rendered frame was presented and its slot may be reused.
    ///
    /// ### 中文
    /// flip 确认：已渲染的帧已呈现，其槽位可被复用。
    fn report_flip(&self);
}

/// ### English
/// RAII hold of the engine lock.
///
/// ### 中文
/// 引擎锁的 RAII 持有者。
pub(crate) struct EngineLock<'a> {
    engine: &'a dyn RenderEngine,
}

impl<'a> EngineLock<'a> {
    pub(crate) fn acquire(engine: &'a dyn RenderEngine) -> Self {
        engine.lock();
        Self { engine }
    }
}

impl Drop for EngineLock<'_> {
    fn drop(&mut self) {
        self.engine.unlock();
    }
}

//! ### English
//! GPU rendering context owned by a render surface.
//!
//! ### 中文
//! 由渲染 surface 持有的 GPU 渲染上下文。

use crate::engine::error::GpuContextError;
use crate::engine::rendering::PixelFormatDescriptor;

use super::ContextHandle;

/// ### English
/// GPU rendering context (e.g. an OpenGL context bound to the drawable).
///
/// The coordinator only makes it current while holding its draw lock, so at most one thread has it
/// current at any time.
///
/// ### 中文
/// GPU 渲染上下文（例如绑定到可绘制区域的 OpenGL 上下文）。
///
/// 协调器只在持有绘制锁时使其成为 current，因此任意时刻至多一个线程将其设为 current。
pub trait GpuContext: Send {
    /// ### English
    /// Identity used by the compositor protocol.
    ///
    /// ### 中文
    /// 合成器协议中使用的标识。
    fn handle(&self) -> ContextHandle;

    /// ### English
    /// Makes the context current on the calling thread.
    ///
    /// ### 中文
    /// 使上下文在调用线程上成为 current。
    fn make_current(&mut self);

    /// ### English
    /// Detaches the context from the calling thread.
    ///
    /// ### 中文
    /// 将上下文从调用线程上解除 current。
    fn clear_current(&mut self);

    /// ### English
    /// Framebuffer object to render into.
    ///
    /// ### 中文
    /// 渲染目标 framebuffer 对象。
    fn framebuffer(&self) -> u32;

    /// ### English
    /// Clears the drawable to a blank frame.
    ///
    /// ### 中文
    /// 将可绘制区域清为空白帧。
    fn clear_to_blank(&mut self);

    /// ### English
    /// Flushes/presents the back buffer.
    ///
    /// ### 中文
    /// flush/呈现后缓冲。
    fn flush_buffer(&mut self);
}

/// ### English
/// Creates GPU contexts for a given pixel format.
///
/// ### 中文
/// 按给定像素格式创建 GPU 上下文。
pub trait GpuContextFactory {
    /// ### English
    /// Creates a context for `format`, or reports why the format is unsupported.
    ///
    /// ### 中文
    /// 为 `format` 创建上下文，或说明该格式不受支持的原因。
    fn create_context(
        &self,
        format: &PixelFormatDescriptor,
    ) -> Result<Box<dyn GpuContext>, GpuContextError>;
}

/// ### English
/// Scope during which a context is current; cleared on drop.
///
/// ### 中文
/// 上下文处于 current 状态的作用域；drop 时解除。
pub(crate) struct CurrentContext<'a> {
    context: &'a mut dyn GpuContext,
}

impl<'a> CurrentContext<'a> {
    pub(crate) fn enter(context: &'a mut dyn GpuContext) -> Self {
        context.make_current();
        Self { context }
    }

    pub(crate) fn framebuffer(&self) -> u32 {
        self.context.framebuffer()
    }

    pub(crate) fn clear_to_blank(&mut self) {
        self.context.clear_to_blank();
    }

    pub(crate) fn flush_buffer(&mut self) {
        self.context.flush_buffer();
    }
}

impl Drop for CurrentContext<'_> {
    fn drop(&mut self) {
        self.context.clear_current();
    }
}

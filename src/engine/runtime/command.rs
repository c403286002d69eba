//! ### English
//! Task protocol between producer threads and the render-producer thread.
//!
//! ### 中文
//! 生产者线程与渲染生产者线程之间的任务协议。

/// ### English
/// Tasks sent to the render-producer thread.
///
/// ### 中文
/// 发送到渲染生产者线程的任务。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenderTask {
    /// ### English
    /// Run the scheduled draw cycle.
    ///
    /// ### 中文
    /// 执行已调度的绘制周期。
    Draw,
    /// ### English
    /// Re-evaluate the wait mode (live resize toggled).
    ///
    /// ### 中文
    /// 重新评估等待方式（live resize 已切换）。
    Wake,
    /// ### English
    /// Stop the render-producer thread.
    ///
    /// ### 中文
    /// 停止渲染生产者线程。
    Shutdown,
}

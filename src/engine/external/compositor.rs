//! ### English
//! Compositor callback protocol.
//!
//! The compositor decides when, and on which thread, it calls back into the layer. The layer side
//! (`CompositorCallbacks`) is implemented by `RenderCoordinator`.
//!
//! ### 中文
//! 合成器回调协议。
//!
//! 由合成器决定何时、在哪个线程回调 layer。layer 一侧（`CompositorCallbacks`）由
//! `RenderCoordinator` 实现。

use std::sync::Arc;
use std::time::Duration;

/// ### English
/// Opaque identity of a GPU rendering context.
///
/// ### 中文
/// GPU 渲染上下文的不透明标识。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub u64);

/// ### English
/// Timing passed by the compositor with each callback.
///
/// ### 中文
/// 合成器随每次回调传入的时间信息。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTiming {
    /// ### English
    /// Layer-local time of the frame being composed.
    ///
    /// ### 中文
    /// 正在合成的帧在 layer 时间轴上的时间。
    pub layer_time: Duration,
}

/// ### English
/// Two-phase draw protocol called by the compositor.
///
/// `draw` is only called after `can_draw` returned `true` for the same pass, but the compositor may
/// skip the pass altogether (e.g. when the window is occluded).
///
/// ### 中文
/// 由合成器调用的两阶段绘制协议。
///
/// 只有在同一轮中 `can_draw` 返回 `true` 后才会调用 `draw`；但合成器也可能整轮跳过
/// （例如窗口被遮挡时）。
pub trait CompositorCallbacks: Send + Sync {
    /// ### English
    /// Context the compositor is expected to pass back.
    ///
    /// ### 中文
    /// 合成器应当回传的上下文。
    fn context(&self) -> ContextHandle;

    /// ### English
    /// Whether the layer wants to draw in this pass.
    ///
    /// ### 中文
    /// 本轮 layer 是否希望绘制。
    fn can_draw(&self, context: ContextHandle, timing: FrameTiming) -> bool;

    /// ### English
    /// Draws into the layer's context.
    ///
    /// ### 中文
    /// 向 layer 的上下文绘制。
    fn draw(&self, context: ContextHandle, timing: FrameTiming);
}

/// ### English
/// Windowing compositor that owns the drawable.
///
/// ### 中文
/// 拥有可绘制区域的窗口合成器。
pub trait Compositor: Send + Sync {
    /// ### English
    /// Asks the compositor to display `layer`. The compositor may call back synchronously, later,
    /// on another thread, or not at all. An owed frame stays drawable after `display` returns
    /// until the surface's skip-render grace runs out.
    ///
    /// ### 中文
    /// 请求合成器显示 `layer`。合成器可能同步回调、稍后回调、在其它线程回调，或根本不回调。
    /// `display` 返回后，欠帧在 surface 的 skip-render 宽限期结束前仍可绘制。
    fn display(&self, layer: &Arc<dyn CompositorCallbacks>);
}

//! ### English
//! State guarded by the surface's `SharedStateLock`: the torn-down flag and the drawable size
//! read alongside it.
//!
//! ### 中文
//! 由 surface 的 `SharedStateLock` 保护的状态：torn-down 标记以及与其一同读取的可绘制尺寸。

use dpi::PhysicalSize;

/// ### English
/// Surface state read as the first action of every draw path.
///
/// ### 中文
/// 每条绘制路径的第一步都会读取的 surface 状态。
#[derive(Debug)]
pub(crate) struct SurfaceState {
    /// ### English
    /// Monotonic: once `true`, never reset.
    ///
    /// ### 中文
    /// 单调：一旦为 `true` 就不会被重置。
    torn_down: bool,
    /// ### English
    /// Drawable size in pixels (never zero).
    ///
    /// ### 中文
    /// 可绘制区域尺寸（像素，永不为 0）。
    size: PhysicalSize<u32>,
}

impl SurfaceState {
    pub(crate) fn new(size: PhysicalSize<u32>) -> Self {
        Self {
            torn_down: false,
            size: clamp_size(size),
        }
    }

    #[inline]
    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// ### English
    /// Sets the torn-down flag. Returns `true` if this call set it.
    ///
    /// ### 中文
    /// 设置 torn-down 标记；若本次调用完成设置则返回 `true`。
    pub(crate) fn mark_torn_down(&mut self) -> bool {
        !std::mem::replace(&mut self.torn_down, true)
    }

    #[inline]
    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// ### English
    /// Updates the drawable size; returns whether it changed.
    ///
    /// ### 中文
    /// 更新可绘制尺寸；返回是否发生变化。
    pub(crate) fn set_size(&mut self, size: PhysicalSize<u32>) -> bool {
        let size = clamp_size(size);
        if self.size == size {
            return false;
        }
        self.size = size;
        true
    }
}

#[inline]
fn clamp_size(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width.max(1), size.height.max(1))
}

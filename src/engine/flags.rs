//! ### English
//! Bitflags controlling optional surface behaviors.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制 surface 可选行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Request a 16-bit half-float color buffer first (falls back to 8-bit if unsupported).
///
/// ### 中文
/// 优先请求 16 位半精度浮点颜色缓冲（不支持时回退到 8 位）。
pub const VIDEO_SURFACE_FLAG_DEEP_COLOR: u32 = 1 << 0;

/// ### English
/// Allow the last-resort software renderer when no hardware pixel format is available.
///
/// Without this flag, a machine with no usable GPU fails surface creation.
///
/// ### 中文
/// 当没有可用的硬件像素格式时，允许回退到软件渲染器。
///
/// 未设置该标志时，没有可用 GPU 的机器会创建 surface 失败。
pub const VIDEO_SURFACE_FLAG_ALLOW_SOFTWARE_RENDERER: u32 = 1 << 1;

#[inline]
pub(crate) fn has(flags: u32, flag: u32) -> bool {
    flags & flag != 0
}

//! ### English
//! C ABI surface for `video_surface_sync`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Collaborators (render engine, compositor, GPU context) are passed as vtables of function
//! pointers plus a `user_data` pointer that is handed back on every call.
//!
//! ### 中文
//! `video_surface_sync` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 外部协作者（渲染引擎、合成器、GPU 上下文）以“函数指针 vtable + `user_data` 指针”的形式传入，
//! 每次回调都会原样传回 `user_data`。
mod abi;
mod layer;
mod surface;
mod vtable;


use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{CompositorCallbacks, RenderEngine, RenderStats, RenderSurface};

/// ### English
/// C ABI version for `video_surface_sync`.
///
/// ### 中文
/// `video_surface_sync` 的 C ABI 版本号。
const VIDEO_SURFACE_ABI_VERSION: u32 = 1;

#[repr(C)]
/// ### English
/// Opaque surface handle.
///
/// ### 中文
/// 不透明 surface 句柄。
pub struct VideoSurface {
    /// ### English
    /// Render surface (coordinator + render thread). Dropped before `engine`.
    ///
    /// ### 中文
    /// 渲染 surface（协调器 + 渲染线程）。先于 `engine` 被 drop。
    surface: RenderSurface,
    /// ### English
    /// Strong reference keeping the foreign engine alive; the coordinator only holds it weakly.
    ///
    /// ### 中文
    /// 保持外部引擎存活的强引用；协调器只持有弱引用。
    engine: Mutex<Arc<dyn RenderEngine>>,
}

#[repr(C)]
/// ### English
/// Opaque layer handle passed to the compositor's `display` callback.
///
/// The pointer given to `display` is only valid during that call. A compositor that calls back
/// later must take its own reference with `video_surface_layer_retain`.
///
/// ### 中文
/// 传给合成器 `display` 回调的不透明 layer 句柄。
///
/// 传给 `display` 的指针只在该次调用期间有效；若合成器需要稍后回调，必须先用
/// `video_surface_layer_retain` 获取自己的引用。
pub struct VideoSurfaceLayer {
    callbacks: Arc<dyn CompositorCallbacks>,
}

#[repr(C)]
/// ### English
/// Surface configuration passed to `video_surface_create`.
///
/// ### 中文
/// 传给 `video_surface_create` 的 surface 配置。
#[derive(Clone, Copy, Debug)]
pub struct VideoSurfaceConfig {
    /// ### English
    /// Initial drawable width in pixels (0 clamps to 1).
    ///
    /// ### 中文
    /// 初始可绘制宽度（像素；0 会被钳制为 1）。
    pub width: u32,
    /// ### English
    /// Initial drawable height in pixels (0 clamps to 1).
    ///
    /// ### 中文
    /// 初始可绘制高度（像素；0 会被钳制为 1）。
    pub height: u32,
    /// ### English
    /// `VIDEO_SURFACE_FLAG_*` bitmask.
    ///
    /// ### 中文
    /// `VIDEO_SURFACE_FLAG_*` 位掩码。
    pub flags: u32,
    /// ### English
    /// Compositor poll period during live resize in microseconds (`0` = default 60 Hz).
    ///
    /// ### 中文
    /// live resize 期间合成器轮询周期（微秒；`0` = 默认 60 Hz）。
    pub live_resize_poll_interval_us: u32,
    /// ### English
    /// Time an owed frame may stay undrawn after `display` before skip-render, in microseconds
    /// (`0` = default one 60 Hz frame).
    ///
    /// ### 中文
    /// 欠帧在 `display` 之后可保持未绘制、直到执行 skip-render 的时长（微秒；`0` = 默认一个 60 Hz 帧）。
    pub skip_render_grace_us: u32,
}

#[repr(C)]
/// ### English
/// Render counters returned by `video_surface_get_stats`.
///
/// ### 中文
/// `video_surface_get_stats` 返回的渲染计数器。
#[derive(Clone, Copy, Debug, Default)]
pub struct VideoSurfaceStats {
    pub cycles: u64,
    pub frames_drawn: u64,
    pub blank_frames: u64,
    pub skipped_frames: u64,
    pub flips: u64,
    pub torn_down_noops: u64,
    pub live_resize_suppressed: u64,
}

impl From<RenderStats> for VideoSurfaceStats {
    fn from(value: RenderStats) -> Self {
        Self {
            cycles: value.cycles,
            frames_drawn: value.frames_drawn,
            blank_frames: value.blank_frames,
            skipped_frames: value.skipped_frames,
            flips: value.flips,
            torn_down_noops: value.torn_down_noops,
            live_resize_suppressed: value.live_resize_suppressed,
        }
    }
}

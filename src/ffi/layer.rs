//! ### English
//! C ABI bindings called by the compositor on a `VideoSurfaceLayer`.
//!
//! ### 中文
//! 合成器在 `VideoSurfaceLayer` 上调用的 C ABI 绑定。

use std::time::Duration;

use super::VideoSurfaceLayer;
use crate::engine::{ContextHandle, FrameTiming};

#[inline]
fn timing(layer_time_ns: u64) -> FrameTiming {
    FrameTiming {
        layer_time: Duration::from_nanos(layer_time_ns),
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Context handle the compositor must pass back to `can_draw`/`draw` (0 for NULL).
///
/// ### 中文
/// 合成器回传给 `can_draw`/`draw` 的上下文句柄（NULL 时为 0）。
pub unsafe extern "C" fn video_surface_layer_context(layer: *const VideoSurfaceLayer) -> u64 {
    let Some(layer) = (unsafe { layer.as_ref() }) else {
        return 0;
    };
    layer.callbacks.context().0
}

#[unsafe(no_mangle)]
/// ### English
/// Whether the layer wants to draw in this compositor pass.
///
/// #### Parameters
/// - `layer`: Layer passed to `display` (or retained from it).
/// - `context`: Context handle the compositor is drawing with.
/// - `layer_time_ns`: Layer-local time of the frame being composed.
///
/// ### 中文
/// 本轮合成中 layer 是否希望绘制。
///
/// #### 参数
/// - `layer`：传给 `display` 的（或从中 retain 的）layer。
/// - `context`：合成器正在使用的上下文句柄。
/// - `layer_time_ns`：正在合成的帧在 layer 时间轴上的时间。
pub unsafe extern "C" fn video_surface_can_draw(
    layer: *const VideoSurfaceLayer,
    context: u64,
    layer_time_ns: u64,
) -> bool {
    let Some(layer) = (unsafe { layer.as_ref() }) else {
        return false;
    };
    layer
        .callbacks
        .can_draw(ContextHandle(context), timing(layer_time_ns))
}

#[unsafe(no_mangle)]
/// ### English
/// Draws one frame into the layer's context. No-op after teardown.
///
/// ### 中文
/// 向 layer 的上下文绘制一帧。销毁后为 no-op。
pub unsafe extern "C" fn video_surface_draw(
    layer: *const VideoSurfaceLayer,
    context: u64,
    layer_time_ns: u64,
) {
    let Some(layer) = (unsafe { layer.as_ref() }) else {
        return;
    };
    layer
        .callbacks
        .draw(ContextHandle(context), timing(layer_time_ns));
}

#[unsafe(no_mangle)]
/// ### English
/// Takes an owned reference to `layer` for calling back after `display` returned.
/// Free it with `video_surface_layer_release`.
///
/// ### 中文
/// 获取 `layer` 的独立引用，以便在 `display` 返回后回调。
/// 需用 `video_surface_layer_release` 释放。
pub unsafe extern "C" fn video_surface_layer_retain(
    layer: *const VideoSurfaceLayer,
) -> *mut VideoSurfaceLayer {
    let Some(layer) = (unsafe { layer.as_ref() }) else {
        return std::ptr::null_mut();
    };
    Box::into_raw(Box::new(VideoSurfaceLayer {
        callbacks: layer.callbacks.clone(),
    }))
}

#[unsafe(no_mangle)]
/// ### English
/// Releases a layer returned by `video_surface_layer_retain`.
///
/// ### 中文
/// 释放由 `video_surface_layer_retain` 返回的 layer。
pub unsafe extern "C" fn video_surface_layer_release(layer: *mut VideoSurfaceLayer) {
    if layer.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(layer));
    }
}

//! ### English
//! `#[repr(C)]` vtables for foreign collaborators and their Rust trait adapters.
//!
//! Every callback is optional; a missing callback behaves as a no-op (or `false`/`0`).
//!
//! ### 中文
//! 外部协作者的 `#[repr(C)]` vtable 及其 Rust trait 适配器。
//!
//! 每个回调都是可选的；缺失的回调视为 no-op（或返回 `false`/`0`）。

use std::ffi::c_void;
use std::mem::MaybeUninit;
use std::sync::Arc;

use tracing::warn;

use crate::engine::{
    Compositor, CompositorCallbacks, ContextHandle, Framebuffer, GpuContext, GpuContextError,
    GpuContextFactory, PixelFormatDescriptor, RenderEngine,
};

use super::VideoSurfaceLayer;

/// ### English
/// Callback receiving only `user_data`.
///
/// ### 中文
/// 只接收 `user_data` 的回调。
type UserDataFn = Option<unsafe extern "C" fn(user_data: *mut c_void)>;

/// ### English
/// Predicate receiving only `user_data`.
///
/// ### 中文
/// 只接收 `user_data` 的谓词回调。
type UserDataPredicate = Option<unsafe extern "C" fn(user_data: *mut c_void) -> bool>;

#[repr(C)]
/// ### English
/// Render engine vtable.
///
/// Ownership of `user_data` moves into the surface; `release` is called once when the surface no
/// longer uses it (also when `video_surface_create` fails).
///
/// ### 中文
/// 渲染引擎 vtable。
///
/// `user_data` 的所有权转移给 surface；当 surface 不再使用它时（包括 `video_surface_create` 失败时）
/// 会调用一次 `release`。
#[derive(Clone, Copy)]
pub struct VideoSurfaceEngineVtable {
    pub user_data: *mut c_void,
    pub lock: UserDataFn,
    pub unlock: UserDataFn,
    pub has_render_context: UserDataPredicate,
    pub has_new_frame: UserDataPredicate,
    /// ### English
    /// Renders into `fbo` (`width`x`height`); the GPU context is current on the calling thread.
    ///
    /// ### 中文
    /// 渲染到 `fbo`（`width`x`height`）；调用线程上 GPU 上下文已为 current。
    pub render_into: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            fbo: u32,
            width: u32,
            height: u32,
            flip_y: bool,
        ),
    >,
    pub skip_render: UserDataFn,
    pub report_flip: UserDataFn,
    pub release: UserDataFn,
}

#[repr(C)]
/// ### English
/// Compositor vtable. `display` receives a layer pointer valid for the duration of the call.
///
/// ### 中文
/// 合成器 vtable。`display` 收到的 layer 指针只在该次调用期间有效。
#[derive(Clone, Copy)]
pub struct VideoSurfaceCompositorVtable {
    pub user_data: *mut c_void,
    pub display:
        Option<unsafe extern "C" fn(user_data: *mut c_void, layer: *const VideoSurfaceLayer)>,
    pub release: UserDataFn,
}

#[repr(C)]
/// ### English
/// GPU context vtable, filled in by the context factory.
///
/// ### 中文
/// GPU 上下文 vtable，由上下文工厂填写。
#[derive(Clone, Copy)]
pub struct VideoSurfaceContextVtable {
    pub user_data: *mut c_void,
    /// ### English
    /// Identity the compositor passes back to `video_surface_can_draw`/`video_surface_draw`.
    ///
    /// ### 中文
    /// 合成器回传给 `video_surface_can_draw`/`video_surface_draw` 的标识。
    pub handle: u64,
    pub make_current: UserDataFn,
    pub clear_current: UserDataFn,
    pub framebuffer: Option<unsafe extern "C" fn(user_data: *mut c_void) -> u32>,
    pub clear_to_blank: UserDataFn,
    pub flush_buffer: UserDataFn,
    pub release: UserDataFn,
}

#[repr(C)]
/// ### English
/// GPU context factory vtable. Borrowed for the duration of `video_surface_create` only.
///
/// `create_context` receives the candidate pixel format as `(tag, value)` pairs and returns
/// `true` after filling `out_context`, or `false` if the format is unsupported.
///
/// ### 中文
/// GPU 上下文工厂 vtable。仅在 `video_surface_create` 调用期间被借用。
///
/// `create_context` 以 `(tag, value)` 对的形式收到候选像素格式；成功时填写 `out_context`
/// 并返回 `true`，格式不受支持时返回 `false`。
#[derive(Clone, Copy)]
pub struct VideoSurfaceContextFactoryVtable {
    pub user_data: *mut c_void,
    pub create_context: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            attributes: *const u32,
            attribute_words: usize,
            out_context: *mut VideoSurfaceContextVtable,
        ) -> bool,
    >,
}

#[inline]
fn call(callback: UserDataFn, user_data: *mut c_void) {
    if let Some(callback) = callback {
        unsafe { callback(user_data) };
    }
}

#[inline]
fn ask(callback: UserDataPredicate, user_data: *mut c_void) -> bool {
    callback.is_some_and(|callback| unsafe { callback(user_data) })
}

/// ### English
/// `RenderEngine` backed by a foreign vtable.
///
/// ### 中文
/// 由外部 vtable 实现的 `RenderEngine`。
pub(super) struct ForeignEngine {
    vtable: VideoSurfaceEngineVtable,
}

// The vtable contract requires every callback to be callable from any thread.
unsafe impl Send for ForeignEngine {}
unsafe impl Sync for ForeignEngine {}

impl ForeignEngine {
    pub(super) fn new(vtable: VideoSurfaceEngineVtable) -> Self {
        Self { vtable }
    }
}

impl RenderEngine for ForeignEngine {
    fn lock(&self) {
        call(self.vtable.lock, self.vtable.user_data);
    }

    fn unlock(&self) {
        call(self.vtable.unlock, self.vtable.user_data);
    }

    fn has_render_context(&self) -> bool {
        ask(self.vtable.has_render_context, self.vtable.user_data)
    }

    fn has_new_frame(&self) -> bool {
        ask(self.vtable.has_new_frame, self.vtable.user_data)
    }

    fn render_into(&self, target: &Framebuffer) {
        if let Some(render_into) = self.vtable.render_into {
            unsafe {
                render_into(
                    self.vtable.user_data,
                    target.fbo,
                    target.size.width,
                    target.size.height,
                    target.flip_y,
                )
            };
        }
    }

    fn skip_render(&self) {
        call(self.vtable.skip_render, self.vtable.user_data);
    }

    fn report_flip(&self) {
        call(self.vtable.report_flip, self.vtable.user_data);
    }
}

impl Drop for ForeignEngine {
    fn drop(&mut self) {
        call(self.vtable.release, self.vtable.user_data);
    }
}

/// ### English
/// `Compositor` backed by a foreign vtable.
///
/// ### 中文
/// 由外部 vtable 实现的 `Compositor`。
pub(super) struct ForeignCompositor {
    vtable: VideoSurfaceCompositorVtable,
}

unsafe impl Send for ForeignCompositor {}
unsafe impl Sync for ForeignCompositor {}

impl ForeignCompositor {
    pub(super) fn new(vtable: VideoSurfaceCompositorVtable) -> Self {
        Self { vtable }
    }
}

impl Compositor for ForeignCompositor {
    fn display(&self, layer: &Arc<dyn CompositorCallbacks>) {
        let Some(display) = self.vtable.display else {
            return;
        };
        let layer = VideoSurfaceLayer {
            callbacks: layer.clone(),
        };
        unsafe { display(self.vtable.user_data, &layer) };
    }
}

impl Drop for ForeignCompositor {
    fn drop(&mut self) {
        call(self.vtable.release, self.vtable.user_data);
    }
}

/// ### English
/// `GpuContext` backed by a foreign vtable.
///
/// ### 中文
/// 由外部 vtable 实现的 `GpuContext`。
struct ForeignContext {
    vtable: VideoSurfaceContextVtable,
}

// Only used under the coordinator's draw lock.
unsafe impl Send for ForeignContext {}

impl GpuContext for ForeignContext {
    fn handle(&self) -> ContextHandle {
        ContextHandle(self.vtable.handle)
    }

    fn make_current(&mut self) {
        call(self.vtable.make_current, self.vtable.user_data);
    }

    fn clear_current(&mut self) {
        call(self.vtable.clear_current, self.vtable.user_data);
    }

    fn framebuffer(&self) -> u32 {
        self.vtable
            .framebuffer
            .map_or(0, |framebuffer| unsafe { framebuffer(self.vtable.user_data) })
    }

    fn clear_to_blank(&mut self) {
        call(self.vtable.clear_to_blank, self.vtable.user_data);
    }

    fn flush_buffer(&mut self) {
        call(self.vtable.flush_buffer, self.vtable.user_data);
    }
}

impl Drop for ForeignContext {
    fn drop(&mut self) {
        call(self.vtable.release, self.vtable.user_data);
    }
}

/// ### English
/// `GpuContextFactory` backed by a foreign vtable.
///
/// ### 中文
/// 由外部 vtable 实现的 `GpuContextFactory`。
pub(super) struct ForeignContextFactory {
    vtable: VideoSurfaceContextFactoryVtable,
}

impl ForeignContextFactory {
    pub(super) fn new(vtable: VideoSurfaceContextFactoryVtable) -> Self {
        Self { vtable }
    }
}

impl GpuContextFactory for ForeignContextFactory {
    fn create_context(
        &self,
        format: &PixelFormatDescriptor,
    ) -> Result<Box<dyn GpuContext>, GpuContextError> {
        let Some(create_context) = self.vtable.create_context else {
            return Err(GpuContextError::new("context factory has no create_context"));
        };

        let attributes = format.encode();
        let mut out = MaybeUninit::<VideoSurfaceContextVtable>::zeroed();
        let created = unsafe {
            create_context(
                self.vtable.user_data,
                attributes.as_ptr(),
                attributes.len(),
                out.as_mut_ptr(),
            )
        };
        if !created {
            return Err(GpuContextError::new("pixel format rejected by the platform"));
        }

        let vtable = unsafe { out.assume_init() };
        if vtable.make_current.is_none() || vtable.flush_buffer.is_none() {
            warn!("foreign GPU context is missing make_current/flush_buffer");
        }
        Ok(Box::new(ForeignContext { vtable }))
    }
}

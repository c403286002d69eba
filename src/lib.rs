/// ### English
/// `video_surface_sync` crate root.
/// Exposes the C ABI via `ffi`; the render synchronization core lives under `engine`.
///
/// ### 中文
/// `video_surface_sync` 的 crate 根。
/// 通过 `ffi` 导出 C ABI；渲染同步核心实现位于 `engine` 模块。
pub mod engine;
mod ffi;

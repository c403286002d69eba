/// ### English
/// Edge-triggered frame request shared between producers (any thread) and the draw path.
///
/// ### 中文
/// 生产者（任意线程）与绘制路径之间共享的边沿触发帧请求。
mod request;

pub use request::FrameRequest;
pub(crate) use request::PendingFrame;

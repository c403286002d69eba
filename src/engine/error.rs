//! ### English
//! Error types.
//!
//! Only construction and lifecycle failures reach the owner. Torn-down access is a silent no-op,
//! and protocol misuse is logged and swallowed where it happens.
//!
//! ### 中文
//! 错误类型。
//!
//! 只有构造与生命周期失败会返回给持有者。对已销毁 surface 的访问是静默 no-op；
//! 协议误用在发生处记录日志后吞掉。

use thiserror::Error;

use crate::engine::external::ContextHandle;

/// ### English
/// Failures surfaced by `RenderSurface`.
///
/// ### 中文
/// `RenderSurface` 对外报告的失败。
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// ### English
    /// Every candidate pixel format was rejected by the context factory.
    ///
    /// ### 中文
    /// 所有候选像素格式都被上下文工厂拒绝。
    #[error("no compatible pixel format ({attempts} candidates rejected)")]
    NoCompatiblePixelFormat {
        /// Number of formats tried.
        attempts: usize,
    },

    /// ### English
    /// The render-producer thread could not be spawned.
    ///
    /// ### 中文
    /// 无法创建渲染生产者线程。
    #[error("failed to spawn render thread")]
    RenderThreadSpawn(#[source] std::io::Error),

    /// ### English
    /// The operation needs a live surface but teardown has begun.
    ///
    /// ### 中文
    /// 该操作需要存活的 surface，但销毁流程已开始。
    #[error("render surface is torn down")]
    TornDown,
}

/// ### English
/// Returned by a `GpuContextFactory` when it cannot create a context for a format.
///
/// ### 中文
/// `GpuContextFactory` 无法为某格式创建上下文时返回。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("GPU context creation failed: {reason}")]
pub struct GpuContextError {
    /// Human-readable reason from the platform.
    pub reason: String,
}

impl GpuContextError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// ### English
/// Internal logic errors. Logged at error level, never propagated.
///
/// ### 中文
/// 内部逻辑错误。以 error 级别记录，不向上传播。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProtocolViolation {
    #[error("flip acknowledged with no pending frame")]
    FlipWithoutPendingFrame,

    #[error("compositor called back with foreign context {got:?} (expected {expected:?})")]
    ForeignContext {
        expected: ContextHandle,
        got: ContextHandle,
    },
}

//! ### English
//! `needs_flip`/`force_draw` edge flags plus a request epoch, kept in one `GuardedFlag` so every
//! transition is a single critical section.
//!
//! ### 中文
//! `needs_flip`/`force_draw` 边沿标记以及请求纪元（epoch），放在同一个 `GuardedFlag` 中，
//! 使每次状态转换都是单个临界区。

use crate::engine::sync::GuardedFlag;

/// ### English
/// Snapshot of the pending frame request.
///
/// ### 中文
/// 待处理帧请求的快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameRequest {
    /// ### English
    /// A frame render is owed.
    ///
    /// ### 中文
    /// 欠一次帧渲染。
    pub needs_flip: bool,
    /// ### English
    /// Render even if the engine reports nothing changed.
    ///
    /// ### 中文
    /// 即使引擎报告没有变化也要渲染。
    pub force_draw: bool,
    /// ### English
    /// Incremented by every producer signal.
    ///
    /// ### 中文
    /// 每次生产者信号都会递增。
    epoch: u64,
}

impl FrameRequest {
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// ### English
/// The shared request cell.
///
/// Producers only ever set flags. Flags are cleared by the thread holding the draw lock: at the
/// start of a draw (`take`) or by the skip path when nothing re-armed them
/// (`consume_if_unchanged`).
///
/// ### 中文
/// 共享的请求单元。
///
/// 生产者只会置位标记。清除只由持有绘制锁的线程完成：在绘制开始时（`take`），
/// 或在跳过路径中且期间未被重新置位时（`consume_if_unchanged`）。
#[derive(Debug, Default)]
pub(crate) struct PendingFrame {
    cell: GuardedFlag<FrameRequest>,
}

impl PendingFrame {
    /// ### English
    /// Producer signal: a frame is owed (optionally forced). Returns the new epoch.
    ///
    /// ### 中文
    /// 生产者信号：欠一帧（可选强制）。返回新的 epoch。
    pub(crate) fn arm(&self, force: bool) -> u64 {
        self.cell.update(|request| {
            request.needs_flip = true;
            request.force_draw |= force;
            request.epoch = request.epoch.wrapping_add(1);
            request.epoch
        })
    }

    #[inline]
    pub(crate) fn snapshot(&self) -> FrameRequest {
        self.cell.get()
    }

    /// ### English
    /// Clears both flags at the start of a draw and returns what was pending.
    ///
    /// ### 中文
    /// 在绘制开始时清除两个标记，并返回之前待处理的内容。
    pub(crate) fn take(&self) -> FrameRequest {
        self.cell.update(|request| {
            let pending = *request;
            request.needs_flip = false;
            request.force_draw = false;
            pending
        })
    }

    /// ### English
    /// Clears the flags only if a frame is owed and no producer signalled since `epoch`.
    /// Returns whether the owed frame was consumed.
    ///
    /// ### 中文
    /// 仅当欠帧且自 `epoch` 之后没有新的生产者信号时清除标记。返回是否消费了该欠帧。
    pub(crate) fn consume_if_unchanged(&self, epoch: u64) -> bool {
        self.cell.update(|request| {
            if !request.needs_flip || request.epoch != epoch {
                return false;
            }
            request.needs_flip = false;
            request.force_draw = false;
            true
        })
    }
}

//! ### English
//! Per-coordinator render counters.
//!
//! ### 中文
//! 每个协调器的渲染计数器。

use std::sync::atomic::{AtomicU64, Ordering};

/// ### English
/// Snapshot of the render counters.
///
/// ### 中文
/// 渲染计数器快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Draw cycles run on the render-producer thread.
    pub cycles: u64,
    /// Frames rendered by the engine.
    pub frames_drawn: u64,
    /// Blank frames drawn because the engine had no render context.
    pub blank_frames: u64,
    /// Owed frames dropped through skip-render.
    pub skipped_frames: u64,
    /// Flip acknowledgements sent to the engine.
    pub flips: u64,
    /// Draw attempts absorbed after teardown.
    pub torn_down_noops: u64,
    /// UI-thread draws suppressed during live resize.
    pub live_resize_suppressed: u64,
}

#[derive(Debug, Default)]
pub(super) struct RenderCounters {
    pub(super) cycles: AtomicU64,
    pub(super) frames_drawn: AtomicU64,
    pub(super) blank_frames: AtomicU64,
    pub(super) skipped_frames: AtomicU64,
    pub(super) flips: AtomicU64,
    pub(super) torn_down_noops: AtomicU64,
    pub(super) live_resize_suppressed: AtomicU64,
}

impl RenderCounters {
    #[inline]
    pub(super) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> RenderStats {
        RenderStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            frames_drawn: self.frames_drawn.load(Ordering::Relaxed),
            blank_frames: self.blank_frames.load(Ordering::Relaxed),
            skipped_frames: self.skipped_frames.load(Ordering::Relaxed),
            flips: self.flips.load(Ordering::Relaxed),
            torn_down_noops: self.torn_down_noops.load(Ordering::Relaxed),
            live_resize_suppressed: self.live_resize_suppressed.load(Ordering::Relaxed),
        }
    }
}

//! ### English
//! Draw cycle run on the render-producer thread.
//!
//! ### 中文
//! 在渲染生产者线程上运行的绘制周期。

use std::sync::Arc;

use tracing::{debug, trace};

use crate::engine::external::{CompositorCallbacks, EngineLock};

use super::stats::RenderCounters;
use super::{CoordinatorState, RenderCoordinator};

impl RenderCoordinator {
    /// ### English
    /// Runs scheduled cycles until nothing new is owed.
    ///
    /// Each cycle hands the layer to the compositor, which may draw during `display`, later, or
    /// never. Signals that arrive during a cycle schedule another one. If the frame owed when the
    /// last cycle began is still undrawn, its epoch is returned; the caller settles it with
    /// `settle_undrawn` once the compositor had its chance.
    ///
    /// ### 中文
    /// 运行已调度的周期，直到不再有新的欠帧。
    ///
    /// 每个周期都把 layer 交给合成器；合成器可能在 `display` 内绘制、稍后绘制或根本不绘制。
    /// 周期内到达的信号会再调度一个周期。若最后一个周期开始时所欠的帧仍未绘制，则返回其 epoch；
    /// 调用方在合成器有机会绘制之后用 `settle_undrawn` 处理它。
    pub(crate) fn run_cycle(self: &Arc<Self>) -> Option<u64> {
        loop {
            let started = self.state.update(|state| {
                if *state != CoordinatorState::DrawPending {
                    return false;
                }
                *state = CoordinatorState::Drawing;
                true
            });
            if !started {
                return None;
            }

            RenderCounters::bump(&self.counters.cycles);
            let epoch = self.request.snapshot().epoch();

            let layer: Arc<dyn CompositorCallbacks> = self.clone();
            self.compositor.display(&layer);

            if self.finish_cycle(epoch) != CoordinatorState::DrawPending {
                let pending = self.request.snapshot();
                return (pending.needs_flip && pending.epoch() == epoch).then_some(epoch);
            }
            trace!("frame requested during cycle; running another");
        }
    }

    /// ### English
    /// Polls the compositor without a producer signal (live resize). Returns what `run_cycle`
    /// returns.
    ///
    /// ### 中文
    /// 在没有生产者信号的情况下轮询合成器（live resize 期间）。返回值同 `run_cycle`。
    pub(crate) fn poll_compositor(self: &Arc<Self>) -> Option<u64> {
        let scheduled = self.state.update(|state| {
            if *state != CoordinatorState::Idle {
                return false;
            }
            *state = CoordinatorState::DrawPending;
            true
        });
        if !scheduled {
            return None;
        }
        self.run_cycle()
    }

    /// ### English
    /// Leaves `Drawing`. Only a signal newer than the cycle's `epoch` schedules another cycle;
    /// the frame the cycle was for stays owed until drawn or settled.
    ///
    /// ### 中文
    /// 离开 `Drawing`。只有比本周期 `epoch` 更新的信号才会调度下一个周期；
    /// 本周期对应的帧在被绘制或被 settle 之前保持欠帧状态。
    fn finish_cycle(&self, epoch: u64) -> CoordinatorState {
        self.state.update(|state| {
            if *state == CoordinatorState::Drawing {
                let pending = self.request.snapshot();
                *state = if pending.needs_flip && pending.epoch() != epoch {
                    CoordinatorState::DrawPending
                } else {
                    CoordinatorState::Idle
                };
            }
            *state
        })
    }

    /// ### English
    /// Drops the frame owed since `epoch` if the compositor never drew it and no producer
    /// re-armed. Called by the render thread once the skip-render grace period has passed.
    ///
    /// ### 中文
    /// 若合成器始终没有绘制自 `epoch` 起所欠的帧且期间没有生产者重新置位，则丢弃该帧。
    /// 由渲染线程在 skip-render 宽限期结束后调用。
    pub(crate) fn settle_undrawn(&self, epoch: u64) {
        let pending = self.request.snapshot();
        if !pending.needs_flip || pending.epoch() != epoch {
            return;
        }

        let engine = self.engine();
        let _engine_lock = engine.as_deref().map(EngineLock::acquire);
        let mut draw = self.draw.lock();

        self.surface.read(|surface| {
            if surface.is_torn_down() {
                RenderCounters::bump(&self.counters.torn_down_noops);
                trace!("skip-render after teardown ignored");
                return;
            }
            if !self.request.consume_if_unchanged(epoch) {
                return;
            }
            let Some(engine) = engine.as_deref() else {
                return;
            };
            if !engine.has_new_frame() {
                return;
            }
            draw.skip_frame(engine);
            RenderCounters::bump(&self.counters.skipped_frames);
            debug!(epoch, "compositor skipped the draw; frame dropped");
        });
    }
}

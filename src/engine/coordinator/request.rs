//! ### English
//! Producer-facing entry points: redraw requests, live resize, resize and engine attachment.
//!
//! ### 中文
//! 面向生产者的入口：重绘请求、live resize、resize 以及引擎挂接。

use std::sync::Weak;

use dpi::PhysicalSize;
use tracing::{debug, trace};

use crate::engine::error::SurfaceError;
use crate::engine::external::RenderEngine;
use crate::engine::rendering::SurfaceState;
use crate::engine::runtime::RenderTask;

use super::{CoordinatorState, RenderCoordinator};

impl RenderCoordinator {
    /// ### English
    /// Signals that a frame is owed. Callable from any thread, including while holding the engine
    /// lock. Never blocks on the draw lock.
    ///
    /// At most one cycle is scheduled at a time; signals arriving while one is pending or running
    /// are coalesced into it.
    ///
    /// #### Parameters
    /// - `force`: Draw even if the engine reports no new frame.
    ///
    /// ### 中文
    /// 通知欠一帧。可从任意线程调用，包括持有引擎锁时。绝不会阻塞在绘制锁上。
    ///
    /// 同一时刻至多调度一个周期；在周期待执行或执行中到达的信号会被合并进去。
    ///
    /// #### 参数
    /// - `force`：即使引擎报告没有新帧也要绘制。
    pub fn request_redraw(&self, force: bool) {
        if self.state.get() == CoordinatorState::TornDown {
            trace!(force, "redraw requested after teardown");
            return;
        }

        let epoch = self.request.arm(force);
        let schedule = self.state.update(|state| {
            if *state != CoordinatorState::Idle {
                return false;
            }
            *state = CoordinatorState::DrawPending;
            true
        });

        if schedule && self.tasks.send(RenderTask::Draw).is_err() {
            trace!("render thread stopped; redraw dropped");
            return;
        }
        trace!(force, epoch, scheduled = schedule, "redraw requested");
    }

    /// ### English
    /// Enters or leaves live-resize mode (UI thread).
    ///
    /// While active, the render thread polls the compositor on its own and UI-thread draws are
    /// suppressed. Leaving schedules a forced redraw at the final size.
    ///
    /// ### 中文
    /// 进入或退出 live-resize 模式（UI 线程）。
    ///
    /// 激活期间，渲染线程自行轮询合成器，且 UI 线程上的绘制会被抑制。退出时会以最终尺寸调度一次强制重绘。
    pub fn set_live_resize(&self, active: bool) {
        if self.live_resize.replace(active) == active {
            return;
        }
        debug!(active, "live resize");
        if active {
            if self.tasks.send(RenderTask::Wake).is_err() {
                trace!("render thread stopped; live resize wake dropped");
            }
        } else {
            self.request_redraw(true);
        }
    }

    /// ### English
    /// Updates the drawable size. Returns `false` if unchanged or torn down.
    ///
    /// ### 中文
    /// 更新可绘制尺寸。若未变化或已销毁则返回 `false`。
    pub fn resize(&self, size: PhysicalSize<u32>) -> bool {
        let changed = {
            let _draw = self.draw.lock();
            self.surface
                .write(|surface| !surface.is_torn_down() && surface.set_size(size))
        };
        if changed {
            debug!(width = size.width, height = size.height, "drawable resized");
            self.request_redraw(true);
        }
        changed
    }

    /// ### English
    /// Replaces the render engine (e.g. a new playback session) and forces a redraw.
    ///
    /// ### 中文
    /// 替换渲染引擎（例如新的播放会话）并强制重绘。
    pub fn attach_engine(&self, engine: Weak<dyn RenderEngine>) -> Result<(), SurfaceError> {
        {
            let _draw = self.draw.lock();
            if self.surface.read(SurfaceState::is_torn_down) {
                return Err(SurfaceError::TornDown);
            }
            *self.engine.write() = engine;
        }
        debug!("render engine attached");
        self.request_redraw(true);
        Ok(())
    }
}

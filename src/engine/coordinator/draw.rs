//! ### English
//! Compositor callbacks (`can_draw`/`draw`) and the GPU-side draw context.
//!
//! ### 中文
//! 合成器回调（`can_draw`/`draw`）以及 GPU 侧的绘制上下文。

use dpi::PhysicalSize;
use tracing::{debug, error, trace};

use crate::engine::error::ProtocolViolation;
use crate::engine::external::{
    CompositorCallbacks, ContextHandle, CurrentContext, EngineLock, FrameTiming, Framebuffer,
    GpuContext, RenderEngine,
};
use crate::engine::rendering::SurfaceState;

use super::RenderCoordinator;
use super::stats::RenderCounters;

/// ### English
/// State only touched while holding the draw lock.
///
/// ### 中文
/// 仅在持有绘制锁时访问的状态。
pub(crate) struct DrawContext {
    gpu: Box<dyn GpuContext>,
    /// ### English
    /// A rendered frame awaits its flip acknowledgement.
    ///
    /// ### 中文
    /// 已渲染的帧正在等待 flip 确认。
    pending_flip: bool,
}

/// ### English
/// What one draw put on screen.
///
/// ### 中文
/// 一次绘制在屏幕上呈现的内容。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FrameOutcome {
    Rendered,
    Blank,
}

impl DrawContext {
    pub(super) fn new(gpu: Box<dyn GpuContext>) -> Self {
        Self {
            gpu,
            pending_flip: false,
        }
    }

    /// ### English
    /// Renders one frame with the context current, or clears to blank when the engine has no
    /// render context yet.
    ///
    /// ### 中文
    /// 在上下文为 current 时渲染一帧；若引擎尚无渲染上下文则清为空白帧。
    pub(super) fn render_frame(
        &mut self,
        engine: Option<&dyn RenderEngine>,
        size: PhysicalSize<u32>,
    ) -> FrameOutcome {
        let mut current = CurrentContext::enter(self.gpu.as_mut());
        match engine.filter(|engine| engine.has_render_context()) {
            Some(engine) => {
                let target = Framebuffer {
                    fbo: current.framebuffer(),
                    size,
                    flip_y: true,
                };
                engine.render_into(&target);
                current.flush_buffer();
                self.pending_flip = true;
                FrameOutcome::Rendered
            }
            None => {
                current.clear_to_blank();
                current.flush_buffer();
                FrameOutcome::Blank
            }
        }
    }

    /// ### English
    /// Sends the flip acknowledgement for the frame just rendered.
    ///
    /// ### 中文
    /// 为刚渲染的帧发送 flip 确认。
    pub(super) fn acknowledge_flip(
        &mut self,
        engine: &dyn RenderEngine,
    ) -> Result<(), ProtocolViolation> {
        if !std::mem::take(&mut self.pending_flip) {
            return Err(ProtocolViolation::FlipWithoutPendingFrame);
        }
        engine.report_flip();
        Ok(())
    }

    /// ### English
    /// Drops the owed frame on the engine side with the context current.
    ///
    /// ### 中文
    /// 在上下文为 current 时，于引擎侧丢弃欠下的帧。
    pub(super) fn skip_frame(&mut self, engine: &dyn RenderEngine) {
        let _current = CurrentContext::enter(self.gpu.as_mut());
        engine.skip_render();
    }

    /// ### English
    /// Detaches the context for good at teardown.
    ///
    /// ### 中文
    /// 销毁时彻底解除上下文。
    pub(super) fn release(&mut self) {
        self.pending_flip = false;
        self.gpu.clear_current();
    }
}

impl RenderCoordinator {
    fn accepts_context(&self, context: ContextHandle) -> bool {
        if context == self.context {
            return true;
        }
        let violation = ProtocolViolation::ForeignContext {
            expected: self.context,
            got: context,
        };
        error!(%violation, "compositor callback rejected");
        false
    }
}

impl CompositorCallbacks for RenderCoordinator {
    fn context(&self) -> ContextHandle {
        self.context
    }

    /// ### English
    /// Draw if forced or the engine has a new frame, never after teardown.
    ///
    /// ### 中文
    /// 若被强制或引擎有新帧则绘制；销毁后绝不绘制。
    fn can_draw(&self, context: ContextHandle, _timing: FrameTiming) -> bool {
        if !self.accepts_context(context) {
            return false;
        }
        if self.surface.read(SurfaceState::is_torn_down) {
            trace!("can_draw after teardown");
            return false;
        }
        if self.request.snapshot().force_draw {
            return true;
        }
        self.engine()
            .is_some_and(|engine| engine.has_new_frame())
    }

    /// ### English
    /// Draws one frame.
    ///
    /// Locks are taken in order (engine, draw lock, surface state) and the whole draw runs under
    /// the shared surface lock, so teardown cannot complete while a draw is in flight.
    ///
    /// ### 中文
    /// 绘制一帧。
    ///
    /// 按顺序加锁（引擎、绘制锁、surface 状态），整个绘制都在 surface 共享锁下进行，
    /// 因此绘制进行中时销毁无法完成。
    fn draw(&self, context: ContextHandle, timing: FrameTiming) {
        if !self.accepts_context(context) {
            return;
        }
        if self.live_resize.get() && self.draw.arbiter().is_ui_thread() {
            RenderCounters::bump(&self.counters.live_resize_suppressed);
            trace!("UI-thread draw suppressed during live resize");
            return;
        }

        let engine = self.engine();
        let _engine_lock = engine.as_deref().map(EngineLock::acquire);
        let mut draw = self.draw.lock();

        self.surface.read(|surface| {
            if surface.is_torn_down() {
                RenderCounters::bump(&self.counters.torn_down_noops);
                trace!("draw after teardown ignored");
                return;
            }

            let request = self.request.take();
            match draw.render_frame(engine.as_deref(), surface.size()) {
                FrameOutcome::Rendered => {
                    RenderCounters::bump(&self.counters.frames_drawn);
                    if let Some(engine) = engine.as_deref() {
                        match draw.acknowledge_flip(engine) {
                            Ok(()) => RenderCounters::bump(&self.counters.flips),
                            Err(violation) => error!(%violation, "flip acknowledgement dropped"),
                        }
                    }
                }
                FrameOutcome::Blank => {
                    RenderCounters::bump(&self.counters.blank_frames);
                    debug!("engine has no render context; drew a blank frame");
                }
            }
            trace!(
                forced = request.force_draw,
                layer_time = ?timing.layer_time,
                "frame drawn"
            );
        });
    }
}

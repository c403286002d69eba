//! ### English
//! Render coordinator: decides when a frame is drawn into the surface and serializes every draw
//! behind the UI-prioritized draw lock and the torn-down check.
//!
//! Lock order (never reversed):
//! 1. the render engine's own lock,
//! 2. the draw lock (`ArbitratedMutex<DrawContext>`),
//! 3. the surface state (`SharedStateLock<SurfaceState>`).
//!
//! ### 中文
//! 渲染协调器：决定何时向 surface 绘制一帧，并让每次绘制都经过 UI 优先的绘制锁与 torn-down 检查。
//!
//! 加锁顺序（绝不反转）：
//! 1. 渲染引擎自身的锁；
//! 2. 绘制锁（`ArbitratedMutex<DrawContext>`）；
//! 3. surface 状态（`SharedStateLock<SurfaceState>`）。
use std::sync::{Arc, Weak};
use std::thread::ThreadId;

use crossbeam_channel::Sender;
use dpi::PhysicalSize;
use parking_lot::RwLock;

use crate::engine::external::{Compositor, ContextHandle, GpuContext, RenderEngine};
use crate::engine::frame::{FrameRequest, PendingFrame};
use crate::engine::rendering::SurfaceState;
use crate::engine::runtime::RenderTask;
use crate::engine::sync::{ArbitratedMutex, GuardedFlag, SharedStateLock};

use draw::DrawContext;
use stats::RenderCounters;

mod cycle;
mod draw;
mod request;
mod stats;
mod teardown;

pub use stats::RenderStats;

/// ### English
/// Coordinator state machine.
///
/// ### 中文
/// 协调器状态机。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    /// ### English
    /// Nothing scheduled.
    ///
    /// ### 中文
    /// 没有已调度的任务。
    Idle,
    /// ### English
    /// A draw cycle is scheduled on the render-producer thread.
    ///
    /// ### 中文
    /// 渲染生产者线程上已调度一个绘制周期。
    DrawPending,
    /// ### English
    /// The render-producer thread is running the compositor protocol.
    ///
    /// ### 中文
    /// 渲染生产者线程正在执行合成器协议。
    Drawing,
    /// ### English
    /// Terminal: the surface is being torn down.
    ///
    /// ### 中文
    /// 终态：surface 正在销毁。
    TornDown,
}

/// ### English
/// Initialization parameters for `RenderCoordinator`.
///
/// ### 中文
/// `RenderCoordinator` 的初始化参数。
pub(crate) struct CoordinatorInit {
    /// ### English
    /// Negotiated GPU context, exclusively owned from now on.
    ///
    /// ### 中文
    /// 协商得到的 GPU 上下文，此后由协调器独占。
    pub gpu: Box<dyn GpuContext>,
    /// ### English
    /// Non-owning reference to the playback session's render engine.
    ///
    /// ### 中文
    /// 对播放会话渲染引擎的非拥有引用。
    pub engine: Weak<dyn RenderEngine>,
    /// ### English
    /// Compositor that calls back into the coordinator.
    ///
    /// ### 中文
    /// 回调协调器的合成器。
    pub compositor: Arc<dyn Compositor>,
    /// ### English
    /// Initial drawable size (zero clamps to 1).
    ///
    /// ### 中文
    /// 初始可绘制尺寸（0 会被钳制为 1）。
    pub initial_size: PhysicalSize<u32>,
    /// ### English
    /// Thread that gets priority on the draw lock.
    ///
    /// ### 中文
    /// 在绘制锁上享有优先级的线程。
    pub ui_thread: ThreadId,
    /// ### English
    /// Task queue into the render-producer thread.
    ///
    /// ### 中文
    /// 发往渲染生产者线程的任务队列。
    pub tasks: Sender<RenderTask>,
}

/// ### English
/// One coordinator per render surface.
///
/// ### 中文
/// 每个渲染 surface 对应一个协调器。
pub struct RenderCoordinator {
    /// ### English
    /// State machine (`Idle`/`DrawPending`/`Drawing`/`TornDown`).
    ///
    /// ### 中文
    /// 状态机（`Idle`/`DrawPending`/`Drawing`/`TornDown`）。
    state: GuardedFlag<CoordinatorState>,
    /// ### English
    /// Edge-triggered `needs_flip`/`force_draw`.
    ///
    /// ### 中文
    /// 边沿触发的 `needs_flip`/`force_draw`。
    request: PendingFrame,
    /// ### English
    /// Interactive resize in progress (toggled by the UI thread).
    ///
    /// ### 中文
    /// 是否处于交互式 resize 中（由 UI 线程切换）。
    live_resize: GuardedFlag<bool>,
    surface: SharedStateLock<SurfaceState>,
    draw: ArbitratedMutex<DrawContext>,
    context: ContextHandle,
    engine: RwLock<Weak<dyn RenderEngine>>,
    compositor: Arc<dyn Compositor>,
    tasks: Sender<RenderTask>,
    counters: RenderCounters,
}

impl RenderCoordinator {
    pub(crate) fn new(init: CoordinatorInit) -> Arc<Self> {
        let context = init.gpu.handle();
        Arc::new(Self {
            state: GuardedFlag::new(CoordinatorState::Idle),
            request: PendingFrame::default(),
            live_resize: GuardedFlag::new(false),
            surface: SharedStateLock::new(SurfaceState::new(init.initial_size)),
            draw: ArbitratedMutex::new(DrawContext::new(init.gpu), init.ui_thread),
            context,
            engine: RwLock::new(init.engine),
            compositor: init.compositor,
            tasks: init.tasks,
            counters: RenderCounters::default(),
        })
    }

    /// ### English
    /// Current state-machine state.
    ///
    /// ### 中文
    /// 状态机当前状态。
    pub fn state(&self) -> CoordinatorState {
        self.state.get()
    }

    /// ### English
    /// Whether teardown has begun (read under the shared lock).
    ///
    /// ### 中文
    /// 销毁流程是否已开始（在共享锁下读取）。
    pub fn is_torn_down(&self) -> bool {
        self.surface.read(SurfaceState::is_torn_down)
    }

    pub fn is_live_resizing(&self) -> bool {
        self.live_resize.get()
    }

    pub fn pending_request(&self) -> FrameRequest {
        self.request.snapshot()
    }

    pub fn drawable_size(&self) -> PhysicalSize<u32> {
        self.surface.read(SurfaceState::size)
    }

    pub fn stats(&self) -> RenderStats {
        self.counters.snapshot()
    }

    #[inline]
    fn engine(&self) -> Option<Arc<dyn RenderEngine>> {
        self.engine.read().upgrade()
    }
}

#[cfg(test)]
mod tests;

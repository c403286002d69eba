//! ### English
//! Dedicated render-producer thread: runs draw cycles and polls the compositor during live resize.
//!
//! ### 中文
//! 独立的渲染生产者线程：执行绘制周期，并在 live resize 期间轮询合成器。

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, trace};

use crate::engine::coordinator::RenderCoordinator;
use crate::engine::error::SurfaceError;

use super::command::RenderTask;

/// ### English
/// Timer settings of the render thread.
///
/// ### 中文
/// 渲染线程的定时参数。
#[derive(Clone, Copy, Debug)]
pub(super) struct RenderTiming {
    /// ### English
    /// Compositor poll period during live resize.
    ///
    /// ### 中文
    /// live resize 期间轮询合成器的周期。
    pub(super) poll_interval: Duration,
    /// ### English
    /// How long an undrawn owed frame waits for a late compositor draw before it is skipped.
    ///
    /// ### 中文
    /// 未绘制的欠帧在被 skip 之前等待合成器延迟绘制的时长。
    pub(super) skip_render_grace: Duration,
}

/// ### English
/// Frame left undrawn by the last cycle, with its skip-render deadline.
///
/// ### 中文
/// 上一个周期留下的未绘制帧及其 skip-render 截止时间。
#[derive(Clone, Copy, Debug)]
struct Undrawn {
    epoch: u64,
    due: Instant,
}

impl Undrawn {
    /// A repeated epoch keeps its original deadline.
    fn track(current: Option<Self>, epoch: Option<u64>, grace: Duration) -> Option<Self> {
        let epoch = epoch?;
        match current {
            Some(undrawn) if undrawn.epoch == epoch => Some(undrawn),
            _ => Some(Self {
                epoch,
                due: Instant::now() + grace,
            }),
        }
    }
}

/// ### English
/// Owner of the render-producer thread.
///
/// ### 中文
/// 渲染生产者线程的持有者。
pub(super) struct RenderThread {
    /// ### English
    /// Task queue shared with the coordinator.
    ///
    /// ### 中文
    /// 与协调器共享的任务队列。
    tasks: Sender<RenderTask>,
    /// ### English
    /// Thread handle used to detect drops on the render thread itself.
    ///
    /// ### 中文
    /// 线程句柄：用于检测是否在渲染线程自身上 drop。
    thread: thread::Thread,
    /// ### English
    /// Join handle for a clean shutdown.
    ///
    /// ### 中文
    /// 用于干净退出的 JoinHandle。
    join: Option<thread::JoinHandle<()>>,
}

impl RenderThread {
    /// ### English
    /// Spawns the thread.
    ///
    /// #### Parameters
    /// - `name`: OS thread name.
    /// - `coordinator`: Coordinator whose cycles run on the thread.
    /// - `tasks`: Sending side of the task queue (kept for shutdown).
    /// - `receiver`: Receiving side of the task queue.
    /// - `timing`: Poll period and skip-render grace.
    ///
    /// ### 中文
    /// 创建线程。
    ///
    /// #### 参数
    /// - `name`：操作系统线程名。
    /// - `coordinator`：在该线程上运行周期的协调器。
    /// - `tasks`：任务队列发送端（关闭时使用）。
    /// - `receiver`：任务队列接收端。
    /// - `timing`：轮询周期与 skip-render 宽限期。
    pub(super) fn spawn(
        name: String,
        coordinator: Arc<RenderCoordinator>,
        tasks: Sender<RenderTask>,
        receiver: Receiver<RenderTask>,
        timing: RenderTiming,
    ) -> Result<Self, SurfaceError> {
        let join = thread::Builder::new()
            .name(name)
            .spawn(move || run_render_thread(&coordinator, &receiver, timing))
            .map_err(SurfaceError::RenderThreadSpawn)?;
        let thread = join.thread().clone();

        Ok(Self {
            tasks,
            thread,
            join: Some(join),
        })
    }

    /// ### English
    /// Stops the thread and joins it, unless called on the render thread itself.
    ///
    /// ### 中文
    /// 停止线程并 join；若在渲染线程自身上调用则不 join。
    pub(super) fn shutdown(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        let _ = self.tasks.send(RenderTask::Shutdown);
        if thread::current().id() != self.thread.id() {
            let _ = join.join();
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// ### English
/// Render thread main loop.
///
/// Blocks on the task queue. It wakes up early to poll the compositor during live resize and to
/// skip-render a frame the compositor left undrawn past its grace period.
///
/// ### 中文
/// 渲染线程主循环。
///
/// 阻塞等待任务队列；在 live resize 期间会提前醒来轮询合成器，并在合成器超过宽限期仍未绘制欠帧时执行 skip-render。
fn run_render_thread(
    coordinator: &Arc<RenderCoordinator>,
    receiver: &Receiver<RenderTask>,
    timing: RenderTiming,
) {
    debug!("render thread started");
    let mut undrawn: Option<Undrawn> = None;
    let mut next_poll = Instant::now();
    loop {
        let live_resizing = coordinator.is_live_resizing();
        let wake_at = match (undrawn.map(|u| u.due), live_resizing.then_some(next_poll)) {
            (Some(due), Some(poll)) => Some(due.min(poll)),
            (due, poll) => due.or(poll),
        };

        let task = match wake_at {
            Some(wake_at) => match receiver.recv_deadline(wake_at) {
                Ok(task) => task,
                Err(RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    if let Some(expired) = undrawn.filter(|u| u.due <= now) {
                        undrawn = None;
                        coordinator.settle_undrawn(expired.epoch);
                    }
                    if live_resizing && next_poll <= now {
                        trace!("live resize poll");
                        next_poll = now + timing.poll_interval;
                        let left = coordinator.poll_compositor();
                        undrawn = Undrawn::track(undrawn, left, timing.skip_render_grace);
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match receiver.recv() {
                Ok(task) => task,
                Err(_) => break,
            },
        };

        match task {
            RenderTask::Draw => {
                let left = coordinator.run_cycle();
                undrawn = Undrawn::track(undrawn, left, timing.skip_render_grace);
            }
            RenderTask::Wake => next_poll = Instant::now() + timing.poll_interval,
            RenderTask::Shutdown => break,
        }
    }
    debug!("render thread stopped");
}

//! ### English
//! UI-priority arbitration in front of a contended, otherwise unfair mutex.
//!
//! A producer thread that releases and immediately re-acquires a lock in a tight loop can keep the
//! UI thread waiting for an unbounded time. The arbiter inverts that: while the UI thread is
//! waiting for the lock, every other thread waits on a condition variable *before* competing for
//! it, so the UI thread is the only contender once the current holder releases.
//!
//! Only the UI thread gets priority; this is not first-come-first-served fairness.
//!
//! ### 中文
//! 在一个会被争用、且本身不公平的互斥锁前面加一层“UI 优先”仲裁。
//!
//! 若生产者线程在紧循环中释放后立刻重新获取锁，UI 线程可能会被无限期饿死。仲裁器反转了这一点：
//! 当 UI 线程正在等待该锁时，其它线程在*参与竞争之前*先在条件变量上等待，
//! 因此当前持有者释放后，UI 线程是唯一的竞争者。
//!
//! 只有 UI 线程享有优先级；这不是先来先服务的公平锁。

use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// ### English
/// Arbiter bracketing every acquisition of one contended lock.
///
/// The before/after halves of the protocol are private; `acquire` is the only entry point, so they
/// are always paired and the UI claim is dropped even if the acquisition unwinds.
///
/// ### 中文
/// 包裹某个竞争锁每一次获取过程的仲裁器。
///
/// 协议的 before/after 两半均为私有；`acquire` 是唯一入口，因此二者始终成对出现，
/// 即使获取过程发生 unwind，UI 的占用声明也会被撤销。
pub struct PriorityArbiter {
    /// ### English
    /// The thread that gets priority (the window's event-loop thread).
    ///
    /// ### 中文
    /// 享有优先级的线程（窗口事件循环线程）。
    ui_thread: ThreadId,
    /// ### English
    /// "UI thread wants the lock".
    ///
    /// ### 中文
    /// “UI 线程想要获取该锁”。
    ui_wants_lock: Mutex<bool>,
    /// ### English
    /// Signalled when the UI thread has obtained the lock and cleared its claim.
    ///
    /// ### 中文
    /// UI 线程获得锁并撤销声明后发出通知。
    ui_acquired: Condvar,
}

impl PriorityArbiter {
    /// ### English
    /// Creates an arbiter that prioritizes `ui_thread`.
    ///
    /// ### 中文
    /// 创建一个优先 `ui_thread` 的仲裁器。
    pub fn new(ui_thread: ThreadId) -> Self {
        Self {
            ui_thread,
            ui_wants_lock: Mutex::new(false),
            ui_acquired: Condvar::new(),
        }
    }

    /// ### English
    /// Creates an arbiter that prioritizes the calling thread.
    ///
    /// ### 中文
    /// 创建一个优先当前调用线程的仲裁器。
    pub fn for_current_thread() -> Self {
        Self::new(thread::current().id())
    }

    /// ### English
    /// Returns whether the calling thread is the prioritized UI thread.
    ///
    /// ### 中文
    /// 返回调用线程是否为享有优先级的 UI 线程。
    #[inline]
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    /// ### English
    /// Returns whether the UI thread is currently waiting for the lock (diagnostics).
    ///
    /// ### 中文
    /// 返回 UI 线程当前是否正在等待该锁（诊断用）。
    pub fn ui_waiting(&self) -> bool {
        *self.ui_wants_lock.lock()
    }

    /// ### English
    /// Runs `lock` (which must acquire the contended lock and return its guard) inside the
    /// arbitration protocol.
    ///
    /// On the UI thread this never waits in the arbiter itself. On other threads it first waits
    /// while the UI thread wants the lock.
    ///
    /// #### Parameters
    /// - `lock`: Acquires the contended lock.
    ///
    /// ### 中文
    /// 在仲裁协议内执行 `lock`（其必须获取该竞争锁并返回 guard）。
    ///
    /// 在 UI 线程上，仲裁器本身从不等待；在其它线程上，会先等待直到 UI 线程不再需要该锁。
    ///
    /// #### 参数
    /// - `lock`：获取竞争锁的函数。
    pub fn acquire<G>(&self, lock: impl FnOnce() -> G) -> G {
        let claim = self.before_acquire();
        let guard = lock();
        self.after_acquired(claim);
        guard
    }

    fn before_acquire(&self) -> Option<UiClaim<'_>> {
        let is_ui = self.is_ui_thread();
        let mut wants = self.ui_wants_lock.lock();
        if is_ui {
            *wants = true;
            return Some(UiClaim { arbiter: self });
        }
        while *wants {
            self.ui_acquired.wait(&mut wants);
        }
        None
    }

    #[inline]
    fn after_acquired(&self, claim: Option<UiClaim<'_>>) {
        drop(claim);
    }
}

/// ### English
/// The UI thread's pending claim; dropping it clears the flag and wakes waiting threads.
///
/// ### 中文
/// UI 线程尚未撤销的占用声明；drop 时清除标记并唤醒所有等待线程。
struct UiClaim<'a> {
    arbiter: &'a PriorityArbiter,
}

impl Drop for UiClaim<'_> {
    fn drop(&mut self) {
        *self.arbiter.ui_wants_lock.lock() = false;
        self.arbiter.ui_acquired.notify_all();
    }
}

/// ### English
/// Mutex whose every acquisition goes through a `PriorityArbiter`.
///
/// ### 中文
/// 每次获取都经过 `PriorityArbiter` 仲裁的互斥锁。
pub struct ArbitratedMutex<T> {
    arbiter: PriorityArbiter,
    inner: Mutex<T>,
}

impl<T> ArbitratedMutex<T> {
    /// ### English
    /// Wraps `value`, prioritizing `ui_thread`.
    ///
    /// ### 中文
    /// 包装 `value`，并优先 `ui_thread`。
    pub fn new(value: T, ui_thread: ThreadId) -> Self {
        Self {
            arbiter: PriorityArbiter::new(ui_thread),
            inner: Mutex::new(value),
        }
    }

    /// ### English
    /// Acquires the mutex through the arbiter.
    ///
    /// ### 中文
    /// 经由仲裁器获取互斥锁。
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.arbiter.acquire(|| self.inner.lock())
    }

    /// ### English
    /// Returns the arbiter guarding this mutex.
    ///
    /// ### 中文
    /// 返回保护该互斥锁的仲裁器。
    pub fn arbiter(&self) -> &PriorityArbiter {
        &self.arbiter
    }
}

//! ### English
//! Closure-scoped multiple-reader/single-writer lock.
//!
//! ### 中文
//! 以闭包为作用域的多读单写锁。

use parking_lot::RwLock;

/// ### English
/// Reader/writer lock that only hands out access inside a closure.
///
/// The guard lives on the stack frame of `read`/`write`, so it is released on every exit path of
/// `body`, including unwinding. Callers must not re-enter `write` on the same thread.
///
/// ### 中文
/// 仅在闭包内提供访问的读写锁。
///
/// guard 位于 `read`/`write` 的栈帧上，因此 `body` 的任意退出路径（包括 unwind）都会释放锁。
/// 调用方不得在同一线程上重入 `write`。
pub struct SharedStateLock<T> {
    inner: RwLock<T>,
}

impl<T> SharedStateLock<T> {
    /// ### English
    /// Wraps `value`.
    ///
    /// ### 中文
    /// 包装 `value`。
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// ### English
    /// Runs `body` with shared access; any number of readers may run concurrently.
    ///
    /// ### 中文
    /// 以共享方式执行 `body`；可有任意数量的读者并发执行。
    #[inline]
    pub fn read<R>(&self, body: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read();
        body(&guard)
    }

    /// ### English
    /// Runs `body` with exclusive access against all readers and writers.
    ///
    /// ### 中文
    /// 以独占方式执行 `body`（排斥所有读者与写者）。
    #[inline]
    pub fn write<R>(&self, body: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write();
        body(&mut guard)
    }
}

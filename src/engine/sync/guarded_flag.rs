//! ### English
//! Single-value cell with exclusive-write/shared-read semantics.
//!
//! ### 中文
//! 具有“独占写/共享读”语义的单值单元。

use std::fmt;
use std::mem;

use parking_lot::RwLock;

/// ### English
/// Small shared value (flag, counter or state enum) guarded by a reader/writer lock.
///
/// Every operation is one critical section; nothing retries or backs off, so the only wait is the
/// critical section of a concurrent holder.
///
/// ### 中文
/// 由读写锁保护的小型共享值（标记位、计数器或状态枚举）。
///
/// 每个操作都是一个临界区；不会重试或退避，唯一的等待是并发持有者的临界区。
pub struct GuardedFlag<T> {
    value: RwLock<T>,
}

impl<T: Copy> GuardedFlag<T> {
    /// ### English
    /// Creates a cell holding `value`.
    ///
    /// ### 中文
    /// 创建持有 `value` 的单元。
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// ### English
    /// Returns the current value (read lock).
    ///
    /// ### 中文
    /// 返回当前值（读锁）。
    #[inline]
    pub fn get(&self) -> T {
        *self.value.read()
    }

    /// ### English
    /// Stores `value` (write lock).
    ///
    /// ### 中文
    /// 写入 `value`（写锁）。
    #[inline]
    pub fn set(&self, value: T) {
        *self.value.write() = value;
    }

    /// ### English
    /// Stores `value` and returns the previous one in the same critical section.
    ///
    /// ### 中文
    /// 写入 `value` 并在同一临界区内返回旧值。
    #[inline]
    pub fn replace(&self, value: T) -> T {
        mem::replace(&mut *self.value.write(), value)
    }

    /// ### English
    /// Read-modify-write as one critical section.
    ///
    /// `f` runs under the write lock and must not touch this cell again.
    ///
    /// #### Parameters
    /// - `f`: Mutator; its return value is passed through.
    ///
    /// ### 中文
    /// 以单个临界区完成“读-改-写”。
    ///
    /// `f` 在写锁内执行，不得再次访问本单元。
    ///
    /// #### 参数
    /// - `f`：修改函数；其返回值原样透传。
    #[inline]
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.value.write();
        f(&mut guard)
    }
}

impl<T: Copy + Default> Default for GuardedFlag<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for GuardedFlag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GuardedFlag").field(&self.get()).finish()
    }
}

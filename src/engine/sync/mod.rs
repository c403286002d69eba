//! ### English
//! Locking primitives shared between the UI thread, the render-producer thread and compositor
//! callback threads.
//!
//! - `GuardedFlag`: tiny exclusive-write/shared-read cell for flags and state enums.
//! - `SharedStateLock`: closure-scoped reader/writer lock for the surface state.
//! - `PriorityArbiter`/`ArbitratedMutex`: lets the UI thread jump ahead of a producer that keeps
//!   re-acquiring a contended lock.
//!
//! ### 中文
//! UI 线程、渲染生产者线程与合成器回调线程之间共享的锁原语。
//!
//! - `GuardedFlag`：用于标记位/状态枚举的小型“独占写/共享读”单元。
//! - `SharedStateLock`：以闭包为作用域的读写锁，保护 surface 状态。
//! - `PriorityArbiter`/`ArbitratedMutex`：让 UI 线程优先于反复抢锁的生产者线程获得竞争锁。
mod guarded_flag;
mod priority_arbiter;
mod shared_state_lock;

pub use guarded_flag::GuardedFlag;
pub use priority_arbiter::{ArbitratedMutex, PriorityArbiter};
pub use shared_state_lock::SharedStateLock;

use tracing::{debug, trace};

use crate::engine::rendering::SurfaceState;

use super::{CoordinatorState, RenderCoordinator};

impl RenderCoordinator {
    /// ### English
    /// Begins teardown. Idempotent.
    ///
    /// Takes the draw lock with UI priority and then the exclusive surface lock, so when this
    /// returns no draw is in flight and every later callback is a no-op.
    ///
    /// ### 中文
    /// 开始销毁。幂等。
    ///
    /// 先以 UI 优先级获取绘制锁，再获取 surface 独占锁；因此返回时没有进行中的绘制，
    /// 之后的所有回调都是 no-op。
    pub fn teardown(&self) {
        let mut draw = self.draw.lock();
        self.state.set(CoordinatorState::TornDown);
        if self.surface.write(SurfaceState::mark_torn_down) {
            draw.release();
            debug!("render surface torn down");
        } else {
            trace!("teardown repeated");
        }
    }
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;

use crossbeam_channel::{Receiver, unbounded};
use dpi::PhysicalSize;
use parking_lot::Mutex;
use parking_lot::lock_api::RawMutex as _;

use super::*;
use crate::engine::error::SurfaceError;
use crate::engine::external::{CompositorCallbacks, FrameTiming, Framebuffer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GpuEvent {
    MakeCurrent,
    ClearCurrent,
    Blank,
    Flush,
}

struct SpyContext {
    events: Arc<Mutex<Vec<GpuEvent>>>,
}

impl GpuContext for SpyContext {
    fn handle(&self) -> ContextHandle {
        ContextHandle(7)
    }
    fn make_current(&mut self) {
        self.events.lock().push(GpuEvent::MakeCurrent);
    }
    fn clear_current(&mut self) {
        self.events.lock().push(GpuEvent::ClearCurrent);
    }
    fn framebuffer(&self) -> u32 {
        3
    }
    fn clear_to_blank(&mut self) {
        self.events.lock().push(GpuEvent::Blank);
    }
    fn flush_buffer(&mut self) {
        self.events.lock().push(GpuEvent::Flush);
    }
}

struct SpyEngine {
    raw: parking_lot::RawMutex,
    render_context: AtomicBool,
    new_frame: AtomicBool,
    rendered: Mutex<Vec<Framebuffer>>,
    skips: AtomicUsize,
    flips: AtomicUsize,
    /// Re-requests a frame from inside `render_into`, once.
    rearm: AtomicBool,
    coordinator: OnceLock<Weak<RenderCoordinator>>,
}

impl SpyEngine {
    fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
            render_context: AtomicBool::new(true),
            new_frame: AtomicBool::new(false),
            rendered: Mutex::new(Vec::new()),
            skips: AtomicUsize::new(0),
            flips: AtomicUsize::new(0),
            rearm: AtomicBool::new(false),
            coordinator: OnceLock::new(),
        }
    }

    fn produce(&self) {
        self.new_frame.store(true, Ordering::SeqCst);
    }

    fn rendered(&self) -> usize {
        self.rendered.lock().len()
    }
}

impl RenderEngine for SpyEngine {
    fn lock(&self) {
        self.raw.lock();
    }
    fn unlock(&self) {
        unsafe { self.raw.unlock() };
    }
    fn has_render_context(&self) -> bool {
        self.render_context.load(Ordering::SeqCst)
    }
    fn has_new_frame(&self) -> bool {
        self.new_frame.load(Ordering::SeqCst)
    }
    fn render_into(&self, target: &Framebuffer) {
        self.new_frame.store(false, Ordering::SeqCst);
        self.rendered.lock().push(*target);
        if self.rearm.swap(false, Ordering::SeqCst)
            && let Some(coordinator) = self.coordinator.get().and_then(Weak::upgrade)
        {
            self.new_frame.store(true, Ordering::SeqCst);
            coordinator.request_redraw(false);
        }
    }
    fn skip_render(&self) {
        self.new_frame.store(false, Ordering::SeqCst);
        self.skips.fetch_add(1, Ordering::SeqCst);
    }
    fn report_flip(&self) {
        self.flips.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CompositorMode {
    /// Calls `can_draw` and, if accepted, `draw` synchronously.
    Draw,
    /// Never calls back (e.g. occluded window).
    Skip,
    /// Keeps the layer and calls back after `display` has returned.
    Defer,
}

struct SpyCompositor {
    mode: Mutex<CompositorMode>,
    displays: AtomicUsize,
    kept: Mutex<Option<Arc<dyn CompositorCallbacks>>>,
}

impl SpyCompositor {
    fn new(mode: CompositorMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            displays: AtomicUsize::new(0),
            kept: Mutex::new(None),
        }
    }
}

impl Compositor for SpyCompositor {
    fn display(&self, layer: &Arc<dyn CompositorCallbacks>) {
        self.displays.fetch_add(1, Ordering::SeqCst);
        match *self.mode.lock() {
            CompositorMode::Draw => {}
            CompositorMode::Skip => return,
            CompositorMode::Defer => {
                *self.kept.lock() = Some(layer.clone());
                return;
            }
        }
        let timing = FrameTiming::default();
        if layer.can_draw(layer.context(), timing) {
            layer.draw(layer.context(), timing);
        }
    }
}

struct Fixture {
    coordinator: Arc<RenderCoordinator>,
    engine: Arc<SpyEngine>,
    compositor: Arc<SpyCompositor>,
    events: Arc<Mutex<Vec<GpuEvent>>>,
    tasks: Receiver<RenderTask>,
}

fn fixture(mode: CompositorMode) -> Fixture {
    let events = Arc::new(Mutex::new(Vec::new()));
    let engine = Arc::new(SpyEngine::new());
    let compositor = Arc::new(SpyCompositor::new(mode));
    let (sender, tasks) = unbounded();
    let engine_dyn: Arc<dyn RenderEngine> = engine.clone();

    let coordinator = RenderCoordinator::new(CoordinatorInit {
        gpu: Box::new(SpyContext {
            events: events.clone(),
        }),
        engine: Arc::downgrade(&engine_dyn),
        compositor: compositor.clone(),
        initial_size: PhysicalSize::new(640, 360),
        ui_thread: thread::current().id(),
        tasks: sender,
    });
    let _ = engine.coordinator.set(Arc::downgrade(&coordinator));

    Fixture {
        coordinator,
        engine,
        compositor,
        events,
        tasks,
    }
}

#[test]
fn redraw_requests_coalesce_into_one_task() {
    let f = fixture(CompositorMode::Draw);
    f.coordinator.request_redraw(false);
    f.coordinator.request_redraw(true);
    f.coordinator.request_redraw(false);

    assert_eq!(f.coordinator.state(), CoordinatorState::DrawPending);
    assert!(matches!(f.tasks.try_recv(), Ok(RenderTask::Draw)));
    assert!(f.tasks.try_recv().is_err());

    let pending = f.coordinator.pending_request();
    assert!(pending.needs_flip);
    assert!(pending.force_draw);
}

#[test]
fn cycle_draws_new_frame_and_acknowledges_flip() {
    let f = fixture(CompositorMode::Draw);
    f.engine.produce();
    f.coordinator.request_redraw(false);
    f.coordinator.run_cycle();

    assert_eq!(f.coordinator.state(), CoordinatorState::Idle);
    assert_eq!(f.engine.rendered(), 1);
    assert_eq!(f.engine.flips.load(Ordering::SeqCst), 1);
    assert_eq!(f.engine.skips.load(Ordering::SeqCst), 0);

    let target = f.engine.rendered.lock()[0];
    assert_eq!(target.fbo, 3);
    assert_eq!(target.size, PhysicalSize::new(640, 360));
    assert!(target.flip_y);

    let stats = f.coordinator.stats();
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.frames_drawn, 1);
    assert_eq!(stats.flips, 1);
    assert!(!f.coordinator.pending_request().needs_flip);
}

#[test]
fn skipped_pass_drops_owed_frame_when_settled() {
    let f = fixture(CompositorMode::Skip);
    f.engine.produce();
    f.coordinator.request_redraw(false);
    let epoch = f.coordinator.run_cycle().unwrap();

    assert_eq!(f.coordinator.state(), CoordinatorState::Idle);
    assert!(f.coordinator.pending_request().needs_flip);
    assert_eq!(f.engine.skips.load(Ordering::SeqCst), 0);

    f.coordinator.settle_undrawn(epoch);
    assert_eq!(f.engine.rendered(), 0);
    assert_eq!(f.engine.skips.load(Ordering::SeqCst), 1);
    assert_eq!(f.coordinator.stats().skipped_frames, 1);
    assert!(!f.coordinator.pending_request().needs_flip);

    let events = f.events.lock().clone();
    assert_eq!(events, vec![GpuEvent::MakeCurrent, GpuEvent::ClearCurrent]);
}

#[test]
fn skipped_pass_without_new_frame_does_not_skip_render() {
    let f = fixture(CompositorMode::Skip);
    f.coordinator.request_redraw(false);
    let epoch = f.coordinator.run_cycle().unwrap();
    f.coordinator.settle_undrawn(epoch);

    assert_eq!(f.engine.skips.load(Ordering::SeqCst), 0);
    assert_eq!(f.coordinator.state(), CoordinatorState::Idle);
    assert!(!f.coordinator.pending_request().needs_flip);
}

#[test]
fn late_draw_from_another_thread_gets_the_owed_frame() {
    let f = fixture(CompositorMode::Defer);
    f.engine.produce();
    f.coordinator.request_redraw(false);
    let epoch = f.coordinator.run_cycle().unwrap();
    assert_eq!(f.coordinator.state(), CoordinatorState::Idle);

    let layer = f.compositor.kept.lock().clone().unwrap();
    let drew = thread::spawn(move || {
        let timing = FrameTiming::default();
        let ready = layer.can_draw(layer.context(), timing);
        if ready {
            layer.draw(layer.context(), timing);
        }
        ready
    })
    .join()
    .unwrap();
    assert!(drew);

    f.coordinator.settle_undrawn(epoch);
    assert_eq!(f.engine.rendered(), 1);
    assert_eq!(f.engine.flips.load(Ordering::SeqCst), 1);
    assert_eq!(f.engine.skips.load(Ordering::SeqCst), 0);
    assert!(!f.coordinator.pending_request().needs_flip);
}

#[test]
fn newer_request_supersedes_undrawn_frame() {
    let f = fixture(CompositorMode::Defer);
    f.engine.produce();
    f.coordinator.request_redraw(false);
    let first = f.coordinator.run_cycle().unwrap();

    f.coordinator.request_redraw(false);
    assert!(matches!(f.tasks.try_recv(), Ok(RenderTask::Draw)));
    f.coordinator.settle_undrawn(first);
    assert_eq!(f.engine.skips.load(Ordering::SeqCst), 0);

    let second = f.coordinator.run_cycle().unwrap();
    assert_ne!(first, second);
    assert_eq!(f.compositor.displays.load(Ordering::SeqCst), 2);
    f.coordinator.settle_undrawn(second);
    assert_eq!(f.engine.skips.load(Ordering::SeqCst), 1);
}

#[test]
fn polling_an_undrawn_frame_does_not_loop() {
    let f = fixture(CompositorMode::Defer);
    f.engine.produce();
    f.coordinator.request_redraw(false);
    let epoch = f.coordinator.run_cycle().unwrap();

    assert_eq!(f.coordinator.poll_compositor(), Some(epoch));
    assert_eq!(f.compositor.displays.load(Ordering::SeqCst), 2);
    assert_eq!(f.coordinator.stats().cycles, 2);
}

#[test]
fn request_during_draw_runs_another_cycle() {
    let f = fixture(CompositorMode::Draw);
    f.engine.rearm.store(true, Ordering::SeqCst);
    f.engine.produce();
    f.coordinator.request_redraw(false);
    f.coordinator.run_cycle();

    assert_eq!(f.engine.rendered(), 2);
    assert_eq!(f.coordinator.stats().cycles, 2);
    assert_eq!(f.coordinator.state(), CoordinatorState::Idle);
}

#[test]
fn forced_draw_ignores_missing_new_frame() {
    let f = fixture(CompositorMode::Draw);
    f.coordinator.request_redraw(false);
    f.coordinator.run_cycle();
    assert_eq!(f.engine.rendered(), 0);

    f.coordinator.request_redraw(true);
    f.coordinator.run_cycle();
    assert_eq!(f.engine.rendered(), 1);
}

#[test]
fn no_render_context_draws_blank() {
    let f = fixture(CompositorMode::Draw);
    f.engine.render_context.store(false, Ordering::SeqCst);
    f.coordinator.request_redraw(true);
    f.coordinator.run_cycle();

    assert_eq!(f.engine.rendered(), 0);
    assert_eq!(f.engine.flips.load(Ordering::SeqCst), 0);
    assert_eq!(f.coordinator.stats().blank_frames, 1);
    assert!(f.events.lock().contains(&GpuEvent::Blank));
}

#[test]
fn dropped_engine_draws_blank() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let (sender, _tasks) = unbounded();
    let coordinator = RenderCoordinator::new(CoordinatorInit {
        gpu: Box::new(SpyContext {
            events: events.clone(),
        }),
        engine: Weak::<SpyEngine>::new(),
        compositor: Arc::new(SpyCompositor::new(CompositorMode::Draw)),
        initial_size: PhysicalSize::new(1, 1),
        ui_thread: thread::current().id(),
        tasks: sender,
    });

    coordinator.request_redraw(true);
    coordinator.run_cycle();
    assert_eq!(coordinator.stats().blank_frames, 1);
}

#[test]
fn foreign_context_is_rejected() {
    let f = fixture(CompositorMode::Draw);
    f.engine.produce();
    f.coordinator.request_redraw(true);

    let timing = FrameTiming::default();
    assert!(!f.coordinator.can_draw(ContextHandle(99), timing));
    f.coordinator.draw(ContextHandle(99), timing);
    assert_eq!(f.engine.rendered(), 0);
    assert!(f.coordinator.can_draw(ContextHandle(7), timing));
}

#[test]
fn teardown_turns_everything_into_noops() {
    let f = fixture(CompositorMode::Draw);
    f.engine.produce();
    f.coordinator.teardown();

    assert_eq!(f.coordinator.state(), CoordinatorState::TornDown);
    assert!(f.coordinator.is_torn_down());

    f.coordinator.request_redraw(true);
    assert!(f.tasks.try_recv().is_err());

    let timing = FrameTiming::default();
    assert!(!f.coordinator.can_draw(ContextHandle(7), timing));
    f.coordinator.draw(ContextHandle(7), timing);
    assert_eq!(f.engine.rendered(), 0);
    assert_eq!(f.coordinator.stats().torn_down_noops, 1);

    f.coordinator.teardown();
    let clears = f
        .events
        .lock()
        .iter()
        .filter(|event| **event == GpuEvent::ClearCurrent)
        .count();
    assert_eq!(clears, 1);
}

#[test]
fn teardown_aborts_pending_cycle() {
    let f = fixture(CompositorMode::Draw);
    f.engine.produce();
    f.coordinator.request_redraw(true);
    f.coordinator.teardown();
    f.coordinator.run_cycle();

    assert_eq!(f.compositor.displays.load(Ordering::SeqCst), 0);
    assert_eq!(f.coordinator.state(), CoordinatorState::TornDown);
}

#[test]
fn no_draw_completes_after_teardown_returns() {
    let f = fixture(CompositorMode::Draw);
    let stop = Arc::new(AtomicBool::new(false));

    let drawers: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = f.coordinator.clone();
            let engine = f.engine.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let timing = FrameTiming::default();
                while !stop.load(Ordering::SeqCst) {
                    engine.produce();
                    coordinator.request_redraw(true);
                    coordinator.draw(ContextHandle(7), timing);
                }
            })
        })
        .collect();

    thread::sleep(std::time::Duration::from_millis(20));
    f.coordinator.teardown();
    let rendered_at_teardown = f.engine.rendered();

    thread::sleep(std::time::Duration::from_millis(20));
    stop.store(true, Ordering::SeqCst);
    for drawer in drawers {
        drawer.join().unwrap();
    }

    assert_eq!(f.engine.rendered(), rendered_at_teardown);
}

#[test]
fn live_resize_suppresses_ui_thread_draws_only() {
    let f = fixture(CompositorMode::Draw);
    f.coordinator.set_live_resize(true);
    assert!(f.coordinator.is_live_resizing());
    assert!(matches!(f.tasks.try_recv(), Ok(RenderTask::Wake)));

    let timing = FrameTiming::default();
    f.coordinator.draw(ContextHandle(7), timing);
    assert_eq!(f.engine.rendered(), 0);
    assert_eq!(f.coordinator.stats().live_resize_suppressed, 1);

    let coordinator = f.coordinator.clone();
    thread::spawn(move || coordinator.draw(ContextHandle(7), timing))
        .join()
        .unwrap();
    assert_eq!(f.engine.rendered(), 1);
}

#[test]
fn leaving_live_resize_forces_redraw() {
    let f = fixture(CompositorMode::Draw);
    f.coordinator.set_live_resize(true);
    f.coordinator.set_live_resize(true);
    let _ = f.tasks.try_recv();
    assert!(f.tasks.try_recv().is_err());

    f.coordinator.set_live_resize(false);
    assert!(matches!(f.tasks.try_recv(), Ok(RenderTask::Draw)));
    assert!(f.coordinator.pending_request().force_draw);
}

#[test]
fn poll_runs_cycle_without_request() {
    let f = fixture(CompositorMode::Draw);
    f.coordinator.poll_compositor();
    assert_eq!(f.compositor.displays.load(Ordering::SeqCst), 1);
    assert_eq!(f.engine.rendered(), 0);

    f.engine.produce();
    f.coordinator.poll_compositor();
    assert_eq!(f.engine.rendered(), 1);
    assert_eq!(f.coordinator.state(), CoordinatorState::Idle);
}

#[test]
fn resize_updates_framebuffer_size() {
    let f = fixture(CompositorMode::Draw);
    assert!(f.coordinator.resize(PhysicalSize::new(1280, 720)));
    assert!(!f.coordinator.resize(PhysicalSize::new(1280, 720)));
    f.coordinator.run_cycle();

    assert_eq!(f.engine.rendered.lock()[0].size, PhysicalSize::new(1280, 720));
    assert_eq!(f.coordinator.drawable_size(), PhysicalSize::new(1280, 720));
}

#[test]
fn attach_engine_after_teardown_fails() {
    let f = fixture(CompositorMode::Draw);
    let replacement: Arc<dyn RenderEngine> = Arc::new(SpyEngine::new());

    f.coordinator.attach_engine(Arc::downgrade(&replacement)).unwrap();
    assert!(f.coordinator.pending_request().force_draw);

    f.coordinator.teardown();
    let err = f
        .coordinator
        .attach_engine(Arc::downgrade(&replacement))
        .unwrap_err();
    assert!(matches!(err, SurfaceError::TornDown));
}

#[test]
fn live_resize_survives_stopped_render_thread() {
    let Fixture {
        coordinator, tasks, ..
    } = fixture(CompositorMode::Draw);
    drop(tasks);

    coordinator.set_live_resize(true);
    assert!(coordinator.is_live_resizing());
    coordinator.set_live_resize(false);
    assert!(!coordinator.is_live_resizing());
    assert!(coordinator.pending_request().force_draw);
}

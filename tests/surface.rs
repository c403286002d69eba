use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use dpi::PhysicalSize;
use parking_lot::Mutex;
use parking_lot::lock_api::RawMutex as _;

use video_surface_sync::engine::flags::VIDEO_SURFACE_FLAG_ALLOW_SOFTWARE_RENDERER;
use video_surface_sync::engine::{
    Compositor, CompositorCallbacks, ContextHandle, CoordinatorState, FrameTiming, Framebuffer,
    GpuContext, GpuContextError, GpuContextFactory, PixelFormatDescriptor, RenderEngine,
    RenderSurface, SurfaceConfig, SurfaceError,
};

const CONTEXT: ContextHandle = ContextHandle(42);

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

struct NullContext;

impl GpuContext for NullContext {
    fn handle(&self) -> ContextHandle {
        CONTEXT
    }
    fn make_current(&mut self) {}
    fn clear_current(&mut self) {}
    fn framebuffer(&self) -> u32 {
        0
    }
    fn clear_to_blank(&mut self) {}
    fn flush_buffer(&mut self) {}
}

struct Factory {
    accept: fn(&PixelFormatDescriptor) -> bool,
}

impl GpuContextFactory for Factory {
    fn create_context(
        &self,
        format: &PixelFormatDescriptor,
    ) -> Result<Box<dyn GpuContext>, GpuContextError> {
        if (self.accept)(format) {
            Ok(Box::new(NullContext))
        } else {
            Err(GpuContextError::new("unsupported"))
        }
    }
}

fn any_format() -> Factory {
    Factory { accept: |_| true }
}

struct SpyEngine {
    raw: parking_lot::RawMutex,
    new_frame: AtomicBool,
    rendered: AtomicUsize,
    skips: AtomicUsize,
    flips: AtomicUsize,
    last_size: Mutex<Option<PhysicalSize<u32>>>,
}

impl SpyEngine {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            raw: parking_lot::RawMutex::INIT,
            new_frame: AtomicBool::new(false),
            rendered: AtomicUsize::new(0),
            skips: AtomicUsize::new(0),
            flips: AtomicUsize::new(0),
            last_size: Mutex::new(None),
        })
    }

    fn produce(&self) {
        self.new_frame.store(true, Ordering::SeqCst);
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
        true
    }
    fn has_new_frame(&self) -> bool {
        self.new_frame.load(Ordering::SeqCst)
    }
    fn render_into(&self, target: &Framebuffer) {
        self.new_frame.store(false, Ordering::SeqCst);
        *self.last_size.lock() = Some(target.size);
        self.rendered.fetch_add(1, Ordering::SeqCst);
    }
    fn skip_render(&self) {
        self.new_frame.store(false, Ordering::SeqCst);
        self.skips.fetch_add(1, Ordering::SeqCst);
    }
    fn report_flip(&self) {
        self.flips.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps the last layer it was asked to display and optionally draws synchronously.
struct SpyCompositor {
    draws: AtomicBool,
    displays: AtomicUsize,
    layer: Mutex<Option<Arc<dyn CompositorCallbacks>>>,
}

impl SpyCompositor {
    fn new(draws: bool) -> Arc<Self> {
        Arc::new(Self {
            draws: AtomicBool::new(draws),
            displays: AtomicUsize::new(0),
            layer: Mutex::new(None),
        })
    }

    fn layer(&self) -> Option<Arc<dyn CompositorCallbacks>> {
        self.layer.lock().clone()
    }
}

impl Compositor for SpyCompositor {
    fn display(&self, layer: &Arc<dyn CompositorCallbacks>) {
        self.displays.fetch_add(1, Ordering::SeqCst);
        *self.layer.lock() = Some(layer.clone());
        if !self.draws.load(Ordering::SeqCst) {
            return;
        }
        let timing = FrameTiming::default();
        if layer.can_draw(layer.context(), timing) {
            layer.draw(layer.context(), timing);
        }
    }
}

fn spawn_surface(
    engine: &Arc<SpyEngine>,
    compositor: &Arc<SpyCompositor>,
    config: SurfaceConfig,
) -> RenderSurface {
    let engine: Arc<dyn RenderEngine> = engine.clone();
    RenderSurface::new(config, &any_format(), &engine, compositor.clone()).unwrap()
}

fn is_settled(surface: &RenderSurface) -> bool {
    let coordinator = surface.coordinator();
    coordinator.state() == CoordinatorState::Idle && !coordinator.pending_request().needs_flip
}

#[test]
fn produced_frame_is_drawn_on_render_thread() {
    let engine = SpyEngine::new();
    let compositor = SpyCompositor::new(true);
    let surface = spawn_surface(&engine, &compositor, SurfaceConfig::default());

    engine.produce();
    surface.request_redraw(false);

    assert!(wait_until(|| engine.flips.load(Ordering::SeqCst) == 1));
    assert!(wait_until(|| is_settled(&surface)));
    assert_eq!(engine.rendered.load(Ordering::SeqCst), 1);
}

#[test]
fn redraw_burst_from_many_threads_settles() {
    let engine = SpyEngine::new();
    let compositor = SpyCompositor::new(true);
    let surface = Arc::new(spawn_surface(&engine, &compositor, SurfaceConfig::default()));
    let barrier = Arc::new(Barrier::new(4));

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let surface = surface.clone();
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..500 {
                    engine.produce();
                    surface.request_redraw(false);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert!(wait_until(|| is_settled(&surface)));
    let stats = surface.coordinator().stats();
    assert!(stats.frames_drawn >= 1);
    assert!(stats.frames_drawn <= 2000);
    assert_eq!(stats.flips, stats.frames_drawn);
    assert!(!engine.new_frame.load(Ordering::SeqCst));
}

#[test]
fn occluded_compositor_gets_skip_render() {
    let engine = SpyEngine::new();
    let compositor = SpyCompositor::new(false);
    let surface = spawn_surface(&engine, &compositor, SurfaceConfig::default());

    engine.produce();
    surface.request_redraw(false);

    assert!(wait_until(|| engine.skips.load(Ordering::SeqCst) == 1));
    assert!(wait_until(|| is_settled(&surface)));
    assert_eq!(engine.rendered.load(Ordering::SeqCst), 0);
}

#[test]
fn late_compositor_draw_within_grace_is_not_skipped() {
    let engine = SpyEngine::new();
    let compositor = SpyCompositor::new(false);
    let config = SurfaceConfig {
        skip_render_grace: Duration::from_secs(30),
        ..SurfaceConfig::default()
    };
    let surface = spawn_surface(&engine, &compositor, config);

    engine.produce();
    surface.request_redraw(false);
    assert!(wait_until(|| compositor.layer().is_some()));
    let layer = compositor.layer().unwrap();

    let drew = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
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
    assert_eq!(engine.rendered.load(Ordering::SeqCst), 1);
    assert_eq!(engine.flips.load(Ordering::SeqCst), 1);
    assert_eq!(engine.skips.load(Ordering::SeqCst), 0);
    assert!(wait_until(|| is_settled(&surface)));
}

#[test]
fn resize_reaches_engine_framebuffer() {
    let engine = SpyEngine::new();
    let compositor = SpyCompositor::new(true);
    let surface = spawn_surface(&engine, &compositor, SurfaceConfig::default());

    assert!(surface.resize(PhysicalSize::new(800, 0)));
    assert!(wait_until(|| {
        *engine.last_size.lock() == Some(PhysicalSize::new(800, 1))
    }));
}

#[test]
fn live_resize_polls_compositor_without_requests() {
    let engine = SpyEngine::new();
    let compositor = SpyCompositor::new(true);
    let config = SurfaceConfig {
        live_resize_poll_interval: Duration::from_millis(2),
        ..SurfaceConfig::default()
    };
    let surface = spawn_surface(&engine, &compositor, config);

    surface.set_live_resize(true);
    assert!(wait_until(|| compositor.displays.load(Ordering::SeqCst) >= 3));

    let drawn = engine.rendered.load(Ordering::SeqCst);
    surface.set_live_resize(false);
    assert!(wait_until(|| engine.rendered.load(Ordering::SeqCst) > drawn));
}

#[test]
fn no_compatible_pixel_format_fails_creation() {
    let engine: Arc<dyn RenderEngine> = SpyEngine::new();
    let compositor = SpyCompositor::new(true);
    let hardware_only = Factory {
        accept: |format| format.is_software(),
    };

    let err = RenderSurface::new(
        SurfaceConfig::default(),
        &hardware_only,
        &engine,
        compositor.clone(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, SurfaceError::NoCompatiblePixelFormat { .. }));

    let config = SurfaceConfig {
        flags: VIDEO_SURFACE_FLAG_ALLOW_SOFTWARE_RENDERER,
        ..SurfaceConfig::default()
    };
    let surface = RenderSurface::new(config, &hardware_only, &engine, compositor).unwrap();
    assert!(surface.pixel_format().is_software());
}

#[test]
fn retained_layer_is_inert_after_drop() {
    let engine = SpyEngine::new();
    let compositor = SpyCompositor::new(false);
    let surface = spawn_surface(&engine, &compositor, SurfaceConfig::default());

    surface.request_redraw(true);
    assert!(wait_until(|| compositor.layer().is_some()));
    let layer = compositor.layer().unwrap();
    drop(surface);

    engine.produce();
    let timing = FrameTiming::default();
    assert!(!layer.can_draw(CONTEXT, timing));
    layer.draw(CONTEXT, timing);
    assert_eq!(engine.rendered.load(Ordering::SeqCst), 0);
}

#[test]
fn ui_teardown_is_not_starved_by_background_draws() {
    let engine = SpyEngine::new();
    let compositor = SpyCompositor::new(false);
    let surface = spawn_surface(&engine, &compositor, SurfaceConfig::default());

    surface.request_redraw(true);
    assert!(wait_until(|| compositor.layer().is_some()));
    let layer = compositor.layer().unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let drawer = {
        let layer = layer.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let timing = FrameTiming::default();
            while !stop.load(Ordering::SeqCst) {
                layer.draw(CONTEXT, timing);
            }
        })
    };

    assert!(wait_until(|| engine.rendered.load(Ordering::SeqCst) > 10));
    let started = Instant::now();
    surface.teardown();
    let waited = started.elapsed();

    stop.store(true, Ordering::SeqCst);
    drawer.join().unwrap();

    assert!(waited < Duration::from_millis(500), "teardown waited {waited:?}");
    let rendered = engine.rendered.load(Ordering::SeqCst);
    layer.draw(CONTEXT, FrameTiming::default());
    assert_eq!(engine.rendered.load(Ordering::SeqCst), rendered);
}

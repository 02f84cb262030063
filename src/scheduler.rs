//! Cooperative frame loop
//!
//! One callback at a time is outstanding with the injected [`Scheduler`]
//! (`requestAnimationFrame` in the browser, [`ManualScheduler`] in tests).
//! Every callback reschedules itself; the [`FramePacer`] decides whether
//! enough time has passed to do real work, otherwise the callback is a
//! skip, not a busy-wait.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// A one-shot frame callback receiving the host timestamp in ms
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Source of "next frame" callbacks
pub trait Scheduler {
    /// Arrange for `callback` to run once, on the next frame
    fn schedule_next(&self, callback: FrameCallback);
    /// Drop the outstanding callback, if any
    fn cancel(&self);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule_next(&self, callback: FrameCallback) {
        (**self).schedule_next(callback)
    }

    fn cancel(&self) {
        (**self).cancel()
    }
}

/// Display refresh jitter allowance; without it a 60 Hz target on a 60 Hz
/// display would drop every other frame.
const PACING_TOLERANCE_MS: f64 = 1.0;

/// Decides which callbacks get to run a frame
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval_ms: f64,
    last_frame: Option<f64>,
}

impl FramePacer {
    pub fn new(interval_ms: f64) -> Self {
        let interval_ms = if interval_ms.is_finite() {
            interval_ms.max(0.0)
        } else {
            0.0
        };
        Self {
            interval_ms,
            last_frame: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// True if a frame should run at `now`. The first call always runs.
    pub fn ready(&mut self, now: f64) -> bool {
        let Some(last) = self.last_frame else {
            self.last_frame = Some(now);
            return true;
        };

        let elapsed = now - last;
        if elapsed < 0.0 {
            // Clock went backwards; restart the cadence from here
            self.last_frame = Some(now);
            return false;
        }
        if elapsed + PACING_TOLERANCE_MS < self.interval_ms {
            return false;
        }

        // Keep the cadence aligned instead of drifting by the overshoot,
        // but never bank more than half a frame after a stall
        let overshoot = if self.interval_ms > 0.0 && elapsed >= self.interval_ms {
            (elapsed % self.interval_ms).min(self.interval_ms * 0.5)
        } else {
            0.0
        };
        self.last_frame = Some(now - overshoot);
        true
    }

    /// Forget the last frame (after a pause) so the next callback runs
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

/// Loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Created, never started
    Idle,
    Running,
    /// Suspended (e.g. tab hidden); resumable
    Paused,
    /// Torn down; terminal
    Stopped,
}

/// Callback counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Callbacks that ran a frame
    pub frames: u64,
    /// Callbacks that only rescheduled
    pub skipped: u64,
}

struct LoopInner {
    scheduler: Box<dyn Scheduler>,
    state: Cell<LoopState>,
    /// Bumped on pause/stop so callbacks from an older chain are ignored
    epoch: Cell<u64>,
    pacer: RefCell<FramePacer>,
    stats: Cell<LoopStats>,
    on_frame: RefCell<Box<dyn FnMut(f64)>>,
}

/// Handle to the running frame loop; clones share the same loop
#[derive(Clone)]
pub struct FrameLoop {
    inner: Rc<LoopInner>,
}

impl FrameLoop {
    pub fn new(
        scheduler: impl Scheduler + 'static,
        interval_ms: f64,
        on_frame: impl FnMut(f64) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                scheduler: Box::new(scheduler),
                state: Cell::new(LoopState::Idle),
                epoch: Cell::new(0),
                pacer: RefCell::new(FramePacer::new(interval_ms)),
                stats: Cell::new(LoopStats::default()),
                on_frame: RefCell::new(Box::new(on_frame)),
            }),
        }
    }

    pub fn state(&self) -> LoopState {
        self.inner.state.get()
    }

    pub fn stats(&self) -> LoopStats {
        self.inner.stats.get()
    }

    /// Begin (or resume) running frames
    pub fn start(&self) {
        match self.state() {
            LoopState::Idle | LoopState::Paused => {
                self.inner.state.set(LoopState::Running);
                self.inner.pacer.borrow_mut().reset();
                self.schedule();
                log::info!("Frame loop running");
            }
            LoopState::Running | LoopState::Stopped => {}
        }
    }

    /// Suspend without losing anything; `resume` continues identically
    pub fn pause(&self) {
        if self.state() == LoopState::Running {
            self.inner.state.set(LoopState::Paused);
            self.invalidate();
            log::info!("Frame loop paused");
        }
    }

    pub fn resume(&self) {
        if self.state() == LoopState::Paused {
            self.start();
        }
    }

    /// Visibility hook: hidden pauses, visible resumes
    pub fn set_visible(&self, visible: bool) {
        if visible {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Tear down: cancel the outstanding callback; the loop never runs again
    pub fn stop(&self) {
        if self.state() != LoopState::Stopped {
            self.inner.state.set(LoopState::Stopped);
            self.invalidate();
            log::info!("Frame loop stopped");
        }
    }

    /// `pagehide` hook. A page kept in the back/forward cache may come back,
    /// so it only pauses; a real unload stops for good.
    pub fn page_hide(&self, persisted: bool) {
        if persisted {
            self.pause();
        } else {
            self.stop();
        }
    }

    /// `pageshow` hook: picks up a loop paused by [`FrameLoop::page_hide`]
    pub fn page_show(&self) {
        self.resume();
    }

    fn invalidate(&self) {
        self.inner.epoch.set(self.inner.epoch.get() + 1);
        self.inner.scheduler.cancel();
    }

    fn schedule(&self) {
        let weak: Weak<LoopInner> = Rc::downgrade(&self.inner);
        let epoch = self.inner.epoch.get();
        self.inner.scheduler.schedule_next(Box::new(move |now| {
            if let Some(inner) = weak.upgrade() {
                FrameLoop { inner }.fire(epoch, now);
            }
        }));
    }

    fn fire(&self, epoch: u64, now: f64) {
        if self.state() != LoopState::Running || epoch != self.inner.epoch.get() {
            return;
        }

        let ready = self.inner.pacer.borrow_mut().ready(now);
        let mut stats = self.inner.stats.get();
        if ready {
            stats.frames += 1;
            self.inner.stats.set(stats);
            (self.inner.on_frame.borrow_mut())(now);
        } else {
            stats.skipped += 1;
            self.inner.stats.set(stats);
        }

        // The frame itself may have paused or stopped the loop
        if self.state() == LoopState::Running && epoch == self.inner.epoch.get() {
            self.schedule();
        }
    }
}

/// Scheduler driven by hand: `fire(now)` runs the outstanding callback
#[derive(Default)]
pub struct ManualScheduler {
    pending: RefCell<Option<FrameCallback>>,
    scheduled: Cell<u64>,
    cancelled: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Run the outstanding callback at `now`; false if none was scheduled
    pub fn fire(&self, now: f64) -> bool {
        // Take it first so the callback can schedule its successor
        let callback = self.pending.borrow_mut().take();
        match callback {
            Some(callback) => {
                callback(now);
                true
            }
            None => false,
        }
    }

    pub fn scheduled(&self) -> u64 {
        self.scheduled.get()
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled.get()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_next(&self, callback: FrameCallback) {
        *self.pending.borrow_mut() = Some(callback);
        self.scheduled.set(self.scheduled.get() + 1);
    }

    fn cancel(&self) {
        if self.pending.borrow_mut().take().is_some() {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_loop(interval: f64) -> (Rc<ManualScheduler>, FrameLoop, Rc<Cell<u32>>) {
        let scheduler = ManualScheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let frame_loop = FrameLoop::new(Rc::clone(&scheduler), interval, move |_| {
            c.set(c.get() + 1);
        });
        (scheduler, frame_loop, count)
    }

    #[test]
    fn test_pacer_skips_early_callbacks() {
        let mut pacer = FramePacer::new(33.3);
        assert!(pacer.ready(0.0));
        assert!(!pacer.ready(16.7));
        assert!(pacer.ready(33.4));
        assert!(!pacer.ready(50.0));
        assert!(pacer.ready(66.8));
    }

    #[test]
    fn test_pacer_tolerates_refresh_jitter() {
        // 60 Hz target on a 60 Hz display must not halve the rate
        let mut pacer = FramePacer::new(1000.0 / 60.0);
        let mut ran = 0;
        let mut t = 0.0;
        for _ in 0..60 {
            if pacer.ready(t) {
                ran += 1;
            }
            t += 16.6;
        }
        assert_eq!(ran, 60);
    }

    #[test]
    fn test_pacer_backwards_clock() {
        let mut pacer = FramePacer::new(10.0);
        assert!(pacer.ready(100.0));
        assert!(!pacer.ready(50.0));
        assert!(pacer.ready(60.0));
    }

    #[test]
    fn test_loop_reschedules_and_skips() {
        let (scheduler, frame_loop, count) = counting_loop(33.3);
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(!scheduler.is_pending());

        frame_loop.start();
        assert!(scheduler.is_pending());

        let mut t = 0.0;
        for _ in 0..12 {
            assert!(scheduler.fire(t));
            t += 1000.0 / 60.0;
        }
        // Every other 60 Hz callback runs a 30 Hz frame
        assert_eq!(count.get(), 6);
        assert_eq!(frame_loop.stats().frames, 6);
        assert_eq!(frame_loop.stats().skipped, 6);
        assert!(scheduler.is_pending());
    }

    #[test]
    fn test_pause_resume_and_stop() {
        let (scheduler, frame_loop, count) = counting_loop(0.0);
        frame_loop.start();
        scheduler.fire(0.0);
        assert_eq!(count.get(), 1);

        frame_loop.pause();
        assert_eq!(frame_loop.state(), LoopState::Paused);
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.cancelled(), 1);

        frame_loop.set_visible(true);
        assert_eq!(frame_loop.state(), LoopState::Running);
        scheduler.fire(10_000.0);
        assert_eq!(count.get(), 2);

        frame_loop.stop();
        assert!(!scheduler.is_pending());
        assert!(!scheduler.fire(20_000.0));
        frame_loop.start();
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn test_back_forward_cache_round_trip() {
        let (scheduler, frame_loop, count) = counting_loop(0.0);
        frame_loop.start();
        scheduler.fire(0.0);

        // Page frozen into the cache, then restored
        frame_loop.page_hide(true);
        assert_eq!(frame_loop.state(), LoopState::Paused);
        assert!(!scheduler.is_pending());
        frame_loop.page_show();
        assert_eq!(frame_loop.state(), LoopState::Running);
        assert!(scheduler.fire(10_000.0));
        assert_eq!(count.get(), 2);

        // Real unload
        frame_loop.page_hide(false);
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        frame_loop.page_show();
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn test_stale_callback_is_ignored() {
        // A scheduler that cannot cancel must not end up with two chains
        struct Leaky(RefCell<Vec<FrameCallback>>);
        impl Scheduler for Leaky {
            fn schedule_next(&self, callback: FrameCallback) {
                self.0.borrow_mut().push(callback);
            }
            fn cancel(&self) {}
        }

        let leaky = Rc::new(Leaky(RefCell::new(Vec::new())));
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let frame_loop = FrameLoop::new(Rc::clone(&leaky), 0.0, move |_| c.set(c.get() + 1));

        frame_loop.start();
        frame_loop.pause();
        frame_loop.resume();
        let callbacks: Vec<_> = leaky.0.borrow_mut().drain(..).collect();
        assert_eq!(callbacks.len(), 2);
        for cb in callbacks {
            cb(0.0);
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_frame_can_stop_loop() {
        let scheduler = ManualScheduler::new();
        let handle: Rc<RefCell<Option<FrameLoop>>> = Rc::new(RefCell::new(None));
        let h = Rc::clone(&handle);
        let frame_loop = FrameLoop::new(Rc::clone(&scheduler), 0.0, move |_| {
            if let Some(l) = h.borrow().as_ref() {
                l.stop();
            }
        });
        *handle.borrow_mut() = Some(frame_loop.clone());
        frame_loop.start();
        scheduler.fire(0.0);
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert!(!scheduler.is_pending());
    }
}

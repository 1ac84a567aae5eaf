//! Timeline synchronizer.
//!
//! Owns the replay engine for one player surface and publishes the single
//! [`PlaybackState`] that the player, trim control and log panels read.
//! Views never drive the engine themselves; they call the intent methods
//! here (`play`, `pause`, `seek`, `set_speed`, `set_trim`).
//!
//! Failures never escape this type. A recording that cannot be replayed
//! leaves the synchronizer idle with a zero duration, and the reason is
//! available from [`Synchronizer::last_error`].

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use thiserror::Error;

use super::engine::{EngineError, EngineFactory, Frame, ReplayEngine, Subscription, SurfaceId, Tick};
use super::playback::{DEFAULT_SPEED, PlaybackState, TrimRange, clamp_speed};
use super::recording::CapturedEvent;
use super::timeline::{NormalizedEvent, Timeline, TimelineError};

/// Why a recording ended up in the idle state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("invalid event stream: {0}")]
    Timeline(#[from] TimelineError),

    #[error("replay engine failed to start: {0}")]
    Engine(#[from] EngineError),
}

/// A live engine together with its tick subscription.
struct ActiveEngine {
    engine: Box<dyn ReplayEngine>,
    subscription: Option<Subscription>,
    ticks: Receiver<Tick>,
}

impl Drop for ActiveEngine {
    fn drop(&mut self) {
        // Unsubscribe before destroying so no tick lands mid-teardown.
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.engine.destroy();
    }
}

enum Mount {
    /// Nothing to replay
    Idle,
    /// Waiting for the host to report a surface
    Pending,
    Active(ActiveEngine),
}

/// Coordinates one replay engine with the shared playback clock.
pub struct Synchronizer {
    source: Option<Arc<[CapturedEvent]>>,
    timeline: Option<Timeline>,
    state: PlaybackState,
    trim: TrimRange,
    speed: f32,
    mount: Mount,
    last_error: Option<SyncError>,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synchronizer {
    pub fn new() -> Self {
        Self {
            source: None,
            timeline: None,
            state: PlaybackState::default(),
            trim: TrimRange::default(),
            speed: DEFAULT_SPEED,
            mount: Mount::Idle,
            last_error: None,
        }
    }

    /// Load an event stream.
    ///
    /// Handing in the same `Arc` again is a no-op, so callers may invoke
    /// this every frame. A different stream releases the current engine,
    /// normalizes the new events, resets the trim range to the full
    /// duration and waits for [`attach`](Self::attach) to build an engine.
    pub fn initialize(&mut self, events: &Arc<[CapturedEvent]>) {
        if self
            .source
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, events))
        {
            return;
        }

        self.reset();
        self.source = Some(Arc::clone(events));

        match Timeline::normalize(events) {
            Ok(timeline) => {
                let duration = timeline.duration();
                self.state.duration = duration;
                self.trim = TrimRange::full(duration);
                self.timeline = Some(timeline);
                self.mount = Mount::Pending;
                log::debug!(
                    "loaded {} events spanning {} ms, awaiting surface",
                    events.len(),
                    duration
                );
            }
            Err(TimelineError::Empty) => {
                log::debug!("recording has no events yet");
            }
            Err(e) => {
                log::warn!("cannot replay recording: {}", e);
                self.last_error = Some(e.into());
            }
        }
    }

    /// Bind the engine to the surface the host has committed.
    ///
    /// Builds the engine on the first call after `initialize`. A different
    /// surface destroys the current engine before building a new one. Any
    /// construction failure puts the synchronizer into the idle state.
    pub fn attach(&mut self, surface: SurfaceId, factory: &dyn EngineFactory) {
        match &self.mount {
            Mount::Idle => return,
            Mount::Active(active) if active.engine.surface() == surface => return,
            Mount::Active(_) | Mount::Pending => {}
        }

        let Some(events) = self.timeline.as_ref().map(|t| Arc::clone(t.events())) else {
            return;
        };

        // Release the previous engine first; two engines never coexist.
        self.mount = Mount::Pending;

        match factory.create(events, surface) {
            Ok(mut engine) => {
                let (subscription, ticks) = engine.subscribe();
                let now = Instant::now();
                engine.set_speed(self.speed, now);
                engine.pause_at(self.state.current_time);
                if self.state.is_playing {
                    engine.play(self.state.current_time, now);
                }
                self.mount = Mount::Active(ActiveEngine {
                    engine,
                    subscription: Some(subscription),
                    ticks,
                });
                log::debug!("replay engine attached to surface {:?}", surface);
            }
            Err(e) => {
                log::warn!("replay engine failed to start: {}", e);
                self.degrade(e.into());
            }
        }
    }

    /// Release the engine, e.g. when the player surface goes away.
    ///
    /// The loaded timeline is kept, so a later `attach` rebuilds the engine.
    pub fn teardown(&mut self) {
        self.process_ticks();
        self.state.is_playing = false;
        self.mount = if self.timeline.is_some() {
            Mount::Pending
        } else {
            Mount::Idle
        };
    }

    /// Drive the engine's timing loop and apply the ticks it emitted.
    pub fn pump(&mut self, now: Instant) {
        if let Mount::Active(active) = &mut self.mount {
            active.engine.advance(now);
        }
        self.process_ticks();
    }

    /// Resume playback from the current time.
    pub fn play(&mut self) {
        if self.state.is_playing {
            return;
        }
        let Mount::Active(active) = &mut self.mount else {
            return;
        };

        if self.state.current_time >= self.trim.end {
            self.state.current_time = self.trim.start;
        }
        active.engine.play(self.state.current_time, Instant::now());
        self.state.is_playing = true;
    }

    /// Halt playback at the current time.
    pub fn pause(&mut self) {
        self.process_ticks();
        if !self.state.is_playing {
            return;
        }
        if let Mount::Active(active) = &mut self.mount {
            active.engine.pause_at(self.state.current_time);
        }
        self.state.is_playing = false;
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Move the playhead, clamped into the trim range.
    ///
    /// The play state is left untouched. The engine renders the target frame
    /// while stopped and, if playback was running, resumes from there.
    pub fn seek(&mut self, target_ms: i64) {
        self.process_ticks();

        let target = self.trim.clamp(target_ms);
        self.state.current_time = target;

        if let Mount::Active(active) = &mut self.mount {
            active.engine.pause_at(target);
            if self.state.is_playing {
                active.engine.play(target, Instant::now());
            }
        }
    }

    /// Seek relative to the current time.
    pub fn skip(&mut self, delta_ms: i64) {
        self.process_ticks();
        let target = (self.state.current_time as i64).saturating_add(delta_ms);
        self.seek(target);
    }

    /// Set the playback rate (clamped to the supported range).
    pub fn set_speed(&mut self, multiplier: f32) {
        self.speed = clamp_speed(multiplier);
        if let Mount::Active(active) = &mut self.mount {
            active.engine.set_speed(self.speed, Instant::now());
        }
    }

    /// Replace the trim range; takes effect immediately.
    pub fn set_trim(&mut self, start: u64, end: u64) {
        self.process_ticks();
        self.trim = TrimRange::new(start, end, self.state.duration);

        if self.trim.contains(self.state.current_time) {
            return;
        }

        let clamped = self.trim.clamp(self.state.current_time as i64);
        self.state.current_time = clamped;
        if let Mount::Active(active) = &mut self.mount {
            if self.state.is_playing {
                active.engine.play(clamped, Instant::now());
            } else {
                active.engine.pause_at(clamped);
            }
        }
    }

    /// Restore the untrimmed range `[0, duration]`.
    pub fn reset_trim(&mut self) {
        self.set_trim(0, self.state.duration);
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn trim(&self) -> TrimRange {
        self.trim
    }

    pub fn is_trimmed(&self) -> bool {
        self.trim.is_trimmed(self.state.duration)
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn has_engine(&self) -> bool {
        matches!(self.mount, Mount::Active(_))
    }

    /// Whether an engine is waiting for a surface.
    pub fn is_pending(&self) -> bool {
        matches!(self.mount, Mount::Pending)
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    /// Normalized events of the loaded recording.
    pub fn events(&self) -> Option<&Arc<[NormalizedEvent]>> {
        self.timeline.as_ref().map(Timeline::events)
    }

    /// The frame the engine currently shows.
    pub fn frame(&self) -> Option<Frame<'_>> {
        match &self.mount {
            Mount::Active(active) => Some(active.engine.frame()),
            _ => None,
        }
    }

    fn process_ticks(&mut self) {
        let ticks: Vec<Tick> = match &self.mount {
            Mount::Active(active) => active.ticks.try_iter().collect(),
            _ => return,
        };
        for tick in ticks {
            self.apply_tick(tick);
        }
    }

    fn apply_tick(&mut self, tick: Tick) {
        // Ticks queued before a pause or boundary stop are stale.
        if !self.state.is_playing {
            return;
        }

        match tick {
            Tick::Time(offset) => {
                let offset = offset.min(self.state.duration);
                if offset >= self.trim.end && self.is_trimmed() {
                    self.stop_at(self.trim.start);
                } else if offset < self.trim.start {
                    self.state.current_time = self.trim.start;
                    if let Mount::Active(active) = &mut self.mount {
                        active.engine.play(self.trim.start, Instant::now());
                    }
                } else {
                    self.state.current_time = offset;
                }
            }
            Tick::Finished => {
                let end = self.state.duration.min(self.trim.end);
                self.stop_at(end);
            }
        }
    }

    fn stop_at(&mut self, offset: u64) {
        self.state.is_playing = false;
        self.state.current_time = offset;
        if let Mount::Active(active) = &mut self.mount {
            active.engine.pause_at(offset);
        }
    }

    fn reset(&mut self) {
        self.mount = Mount::Idle;
        self.source = None;
        self.timeline = None;
        self.state = PlaybackState::default();
        self.trim = TrimRange::default();
        self.last_error = None;
    }

    fn degrade(&mut self, error: SyncError) {
        let source = self.source.take();
        self.reset();
        // Keep the identity so re-initializing with the same stream does not retry.
        self.source = source;
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::TickEmitter;
    use crate::core::recording::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Play(u64),
        PauseAt(u64),
        SetSpeed(f32),
        Destroy { listeners: usize },
    }

    /// Shared view into the engines a [`MockFactory`] has built.
    #[derive(Clone, Default)]
    struct Spy {
        calls: Rc<RefCell<Vec<Call>>>,
        emitter: Rc<RefCell<TickEmitter>>,
        created: Rc<RefCell<Vec<SurfaceId>>>,
    }

    impl Spy {
        fn emit(&self, tick: Tick) {
            self.emitter.borrow().emit(tick);
        }

        fn take_calls(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.borrow_mut())
        }
    }

    struct MockEngine {
        surface: SurfaceId,
        events: Arc<[NormalizedEvent]>,
        spy: Spy,
    }

    impl ReplayEngine for MockEngine {
        fn surface(&self) -> SurfaceId {
            self.surface
        }

        fn play(&mut self, offset: u64, _now: Instant) {
            self.spy.calls.borrow_mut().push(Call::Play(offset));
        }

        fn pause_at(&mut self, offset: u64) {
            self.spy.calls.borrow_mut().push(Call::PauseAt(offset));
        }

        fn set_speed(&mut self, speed: f32, _now: Instant) {
            self.spy.calls.borrow_mut().push(Call::SetSpeed(speed));
        }

        fn subscribe(&mut self) -> (Subscription, Receiver<Tick>) {
            self.spy.emitter.borrow_mut().subscribe()
        }

        fn advance(&mut self, _now: Instant) {}

        fn frame(&self) -> Frame<'_> {
            Frame {
                offset: 0,
                applied: 0,
                total: self.events.len(),
                last_event: None,
                viewport: None,
                href: None,
            }
        }

        fn destroy(&mut self) {
            let listeners = self.spy.emitter.borrow().listener_count();
            self.spy
                .calls
                .borrow_mut()
                .push(Call::Destroy { listeners });
        }
    }

    #[derive(Default)]
    struct MockFactory {
        spy: Spy,
        fail: bool,
    }

    impl EngineFactory for MockFactory {
        fn create(
            &self,
            events: Arc<[NormalizedEvent]>,
            surface: SurfaceId,
        ) -> Result<Box<dyn ReplayEngine>, EngineError> {
            if self.fail {
                return Err(EngineError::NoFullSnapshot);
            }
            self.spy.created.borrow_mut().push(surface);
            Ok(Box::new(MockEngine {
                surface,
                events,
                spy: self.spy.clone(),
            }))
        }
    }

    fn recording(timestamps: &[u64]) -> Arc<[CapturedEvent]> {
        timestamps
            .iter()
            .map(|&timestamp| CapturedEvent {
                timestamp,
                kind: EventKind::FullSnapshot,
                data: serde_json::Value::Null,
            })
            .collect()
    }

    /// Synchronizer with a 10s recording attached to surface 1.
    fn attached(factory: &MockFactory) -> Synchronizer {
        let mut sync = Synchronizer::new();
        sync.initialize(&recording(&[50_000, 52_000, 60_000]));
        sync.attach(SurfaceId(1), factory);
        factory.spy.take_calls();
        sync
    }

    #[test]
    fn test_initialize_normalizes_duration() {
        let mut sync = Synchronizer::new();
        sync.initialize(&recording(&[1_000, 1_500, 4_000]));

        assert_eq!(sync.state().duration, 3_000);
        assert_eq!(sync.state().current_time, 0);
        assert_eq!(sync.events().unwrap()[0].offset, 0);
        assert_eq!(sync.trim(), TrimRange::full(3_000));
        assert!(sync.is_pending());
        assert!(!sync.has_engine());
    }

    #[test]
    fn test_initialize_empty_is_idle() {
        let factory = MockFactory::default();
        let mut sync = Synchronizer::new();
        sync.initialize(&recording(&[]));
        sync.attach(SurfaceId(1), &factory);

        assert_eq!(sync.state(), PlaybackState::default());
        assert!(!sync.has_engine());
        assert!(sync.last_error().is_none());
        assert!(factory.spy.created.borrow().is_empty());
    }

    #[test]
    fn test_initialize_unordered_is_idle() {
        let mut sync = Synchronizer::new();
        sync.initialize(&recording(&[100, 50]));

        assert_eq!(sync.state().duration, 0);
        assert!(!sync.is_pending());
        assert!(matches!(sync.last_error(), Some(SyncError::Timeline(_))));
    }

    #[test]
    fn test_engine_built_only_after_attach() {
        let factory = MockFactory::default();
        let mut sync = Synchronizer::new();
        sync.initialize(&recording(&[0, 10_000]));
        assert!(factory.spy.created.borrow().is_empty());

        sync.attach(SurfaceId(7), &factory);
        assert!(sync.has_engine());
        assert_eq!(*factory.spy.created.borrow(), vec![SurfaceId(7)]);
        assert_eq!(
            factory.spy.take_calls(),
            vec![Call::SetSpeed(1.0), Call::PauseAt(0)]
        );

        // Same surface: nothing rebuilt.
        sync.attach(SurfaceId(7), &factory);
        assert_eq!(factory.spy.created.borrow().len(), 1);
    }

    #[test]
    fn test_same_stream_is_not_renormalized() {
        let factory = MockFactory::default();
        let events = recording(&[0, 10_000]);
        let mut sync = Synchronizer::new();
        sync.initialize(&events);
        sync.attach(SurfaceId(1), &factory);
        sync.seek(4_000);

        sync.initialize(&events);
        assert!(sync.has_engine());
        assert_eq!(sync.state().current_time, 4_000);
        assert_eq!(factory.spy.created.borrow().len(), 1);
    }

    #[test]
    fn test_surface_change_destroys_before_rebuilding() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);

        sync.attach(SurfaceId(2), &factory);

        assert_eq!(
            *factory.spy.created.borrow(),
            vec![SurfaceId(1), SurfaceId(2)]
        );
        let calls = factory.spy.take_calls();
        assert_eq!(calls[0], Call::Destroy { listeners: 0 });
        assert!(sync.has_engine());
    }

    #[test]
    fn test_surface_change_while_playing_resumes_on_new_engine() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.seek(3_000);
        sync.play();
        factory.spy.take_calls();

        sync.attach(SurfaceId(2), &factory);

        assert_eq!(
            factory.spy.take_calls(),
            vec![
                Call::Destroy { listeners: 0 },
                Call::SetSpeed(1.0),
                Call::PauseAt(3_000),
                Call::Play(3_000),
            ]
        );
        assert!(sync.state().is_playing);
        assert_eq!(sync.state().current_time, 3_000);
    }

    #[test]
    fn test_new_recording_releases_engine() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);

        sync.initialize(&recording(&[0, 3_000]));

        assert_eq!(
            factory.spy.take_calls(),
            vec![Call::Destroy { listeners: 0 }]
        );
        assert!(!sync.has_engine());
        assert_eq!(sync.state().duration, 3_000);
        assert_eq!(sync.trim(), TrimRange::full(3_000));
    }

    #[test]
    fn test_drop_releases_engine() {
        let factory = MockFactory::default();
        let sync = attached(&factory);

        drop(sync);

        assert_eq!(
            factory.spy.take_calls(),
            vec![Call::Destroy { listeners: 0 }]
        );
    }

    #[test]
    fn test_construction_failure_degrades() {
        let factory = MockFactory {
            fail: true,
            ..Default::default()
        };
        let events = recording(&[0, 10_000]);
        let mut sync = Synchronizer::new();
        sync.initialize(&events);
        sync.attach(SurfaceId(1), &factory);

        assert_eq!(sync.state(), PlaybackState::default());
        assert!(!sync.has_engine());
        assert!(matches!(sync.last_error(), Some(SyncError::Engine(_))));

        // Same stream again does not retry.
        sync.initialize(&events);
        assert!(!sync.is_pending());
        assert!(sync.last_error().is_some());

        sync.play();
        assert!(!sync.state().is_playing);
    }

    #[test]
    fn test_play_without_engine_is_noop() {
        let mut sync = Synchronizer::new();
        sync.initialize(&recording(&[0, 10_000]));
        sync.play();
        assert!(!sync.state().is_playing);
    }

    #[test]
    fn test_play_and_pause_are_idempotent() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);

        sync.play();
        sync.play();
        assert!(sync.state().is_playing);
        assert_eq!(factory.spy.take_calls(), vec![Call::Play(0)]);

        sync.pause();
        sync.pause();
        assert!(!sync.state().is_playing);
        assert_eq!(factory.spy.take_calls(), vec![Call::PauseAt(0)]);
    }

    #[test]
    fn test_ticks_advance_current_time_in_order() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.play();

        factory.spy.emit(Tick::Time(100));
        factory.spy.emit(Tick::Time(250));
        sync.pump(Instant::now());

        assert_eq!(sync.state().current_time, 250);
        assert!(sync.state().is_playing);
    }

    #[test]
    fn test_ticks_ignored_while_paused() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);

        factory.spy.emit(Tick::Time(900));
        sync.pump(Instant::now());

        assert_eq!(sync.state().current_time, 0);
    }

    #[test]
    fn test_seek_clamps_into_duration() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);

        for target in [-5_000, 0, 3_000, 10_000, 99_999, i64::MIN, i64::MAX] {
            sync.seek(target);
            let state = sync.state();
            assert!(state.current_time <= state.duration);
        }

        sync.seek(-1);
        assert_eq!(sync.state().current_time, 0);
        sync.seek(12_345);
        assert_eq!(sync.state().current_time, 10_000);
    }

    #[test]
    fn test_seek_clamps_into_trim() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.set_trim(1_000, 4_000);

        for target in [-1, 0, 999, 1_000, 2_500, 4_000, 4_001, 20_000] {
            sync.seek(target);
            let current = sync.state().current_time;
            assert!((1_000..=4_000).contains(&current), "seek({target}) -> {current}");
        }
    }

    #[test]
    fn test_seek_preserves_play_state() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);

        sync.seek(3_000);
        assert!(!sync.state().is_playing);
        assert_eq!(factory.spy.take_calls(), vec![Call::PauseAt(3_000)]);

        sync.play();
        factory.spy.take_calls();
        sync.seek(6_000);
        assert!(sync.state().is_playing);
        assert_eq!(
            factory.spy.take_calls(),
            vec![Call::PauseAt(6_000), Call::Play(6_000)]
        );
    }

    #[test]
    fn test_seek_wins_over_queued_ticks() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.play();

        factory.spy.emit(Tick::Time(800));
        sync.seek(5_000);
        sync.pump(Instant::now());

        assert_eq!(sync.state().current_time, 5_000);
    }

    #[test]
    fn test_trim_boundary_loops_to_trim_start() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.set_trim(1_000, 4_000);
        sync.seek(3_000);
        sync.play();

        factory.spy.emit(Tick::Time(3_900));
        sync.pump(Instant::now());
        assert!(sync.state().is_playing);

        factory.spy.emit(Tick::Time(4_000));
        factory.spy.emit(Tick::Time(4_016));
        sync.pump(Instant::now());

        assert!(!sync.state().is_playing);
        assert_eq!(sync.state().current_time, 1_000);
    }

    #[test]
    fn test_tick_before_trim_start_is_forced_forward() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.set_trim(2_000, 8_000);
        sync.play();
        factory.spy.take_calls();

        factory.spy.emit(Tick::Time(500));
        sync.pump(Instant::now());

        assert_eq!(sync.state().current_time, 2_000);
        assert!(sync.state().is_playing);
        assert_eq!(factory.spy.take_calls(), vec![Call::Play(2_000)]);
    }

    #[test]
    fn test_finished_stops_at_end() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.play();

        factory.spy.emit(Tick::Time(10_000));
        factory.spy.emit(Tick::Finished);
        sync.pump(Instant::now());

        assert!(!sync.state().is_playing);
        assert_eq!(sync.state().current_time, 10_000);

        // Playing again from the end restarts at the beginning.
        factory.spy.take_calls();
        sync.play();
        assert_eq!(factory.spy.take_calls(), vec![Call::Play(0)]);
    }

    #[test]
    fn test_set_trim_clamps_immediately_when_paused() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.seek(9_000);
        factory.spy.take_calls();

        sync.set_trim(1_000, 4_000);

        assert_eq!(sync.state().current_time, 4_000);
        assert_eq!(factory.spy.take_calls(), vec![Call::PauseAt(4_000)]);

        // Moving the range around a playhead that already fits is silent.
        sync.set_trim(500, 6_000);
        assert_eq!(sync.state().current_time, 4_000);
        assert!(factory.spy.take_calls().is_empty());
    }

    #[test]
    fn test_set_trim_repositions_running_engine() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.play();
        factory.spy.take_calls();

        sync.set_trim(3_000, 7_000);

        assert_eq!(sync.state().current_time, 3_000);
        assert!(sync.state().is_playing);
        assert_eq!(factory.spy.take_calls(), vec![Call::Play(3_000)]);
    }

    #[test]
    fn test_trim_reset_detection() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        assert!(!sync.is_trimmed());

        sync.set_trim(0, 9_000);
        assert!(sync.is_trimmed());

        sync.set_trim(0, 10_000);
        assert!(!sync.is_trimmed());

        sync.set_trim(200, 20_000);
        assert_eq!(sync.trim(), TrimRange { start: 200, end: 10_000 });
        sync.reset_trim();
        assert!(!sync.is_trimmed());
    }

    #[test]
    fn test_set_speed_clamps_and_forwards() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);

        sync.set_speed(2.0);
        sync.set_speed(0.0);
        sync.set_speed(-1.0);

        assert_eq!(sync.speed(), 0.1);
        assert_eq!(
            factory.spy.take_calls(),
            vec![Call::SetSpeed(2.0), Call::SetSpeed(0.1), Call::SetSpeed(0.1)]
        );
        assert_eq!(sync.state().current_time, 0);
    }

    #[test]
    fn test_teardown_keeps_timeline_for_remount() {
        let factory = MockFactory::default();
        let mut sync = attached(&factory);
        sync.seek(2_000);
        sync.play();
        factory.spy.take_calls();

        sync.teardown();
        assert_eq!(
            factory.spy.take_calls(),
            vec![Call::Destroy { listeners: 0 }]
        );
        assert!(!sync.state().is_playing);
        assert!(sync.is_pending());

        sync.attach(SurfaceId(3), &factory);
        assert!(sync.has_engine());
        assert_eq!(
            factory.spy.take_calls(),
            vec![Call::SetSpeed(1.0), Call::PauseAt(2_000)]
        );
    }
}

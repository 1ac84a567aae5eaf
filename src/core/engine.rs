//! Replay engine interface and the built-in clock-driven engine.
//!
//! A replay engine reconstructs the visual state of a recording at a given
//! offset and, while running, reports its position through tick
//! notifications. Only the synchronizer constructs and drives engines.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use thiserror::Error;

use super::playback::DEFAULT_SPEED;
use super::recording::EventKind;
use super::timeline::NormalizedEvent;

/// Identity of the rendering surface an engine paints into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Notification pushed by a running engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Current playback offset in milliseconds
    Time(u64),
    /// Playback reached the end of the recording and stopped
    Finished,
}

/// Errors raised while constructing an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("event stream is empty")]
    EmptyStream,

    #[error("event stream has no full DOM snapshot to start from")]
    NoFullSnapshot,
}

type Listeners = Rc<RefCell<Vec<(u64, Sender<Tick>)>>>;

/// Fan-out point for tick notifications.
#[derive(Debug, Default)]
pub struct TickEmitter {
    listeners: Listeners,
    next_id: u64,
}

impl TickEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Ticks arrive on the returned receiver in the
    /// order they are emitted until the subscription is dropped.
    pub fn subscribe(&mut self) -> (Subscription, Receiver<Tick>) {
        let (sender, receiver) = mpsc::channel();
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.borrow_mut().push((id, sender));

        let subscription = Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        };
        (subscription, receiver)
    }

    /// Deliver a tick to every live listener.
    pub fn emit(&self, tick: Tick) {
        // Listeners whose receiver is gone are pruned on the way.
        self.listeners
            .borrow_mut()
            .retain(|(_, sender)| sender.send(tick).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

/// Handle for a tick subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Vec<(u64, Sender<Tick>)>>>,
}

impl Subscription {
    /// Stop receiving ticks.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Snapshot of what an engine currently displays.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<'a> {
    /// Offset the frame was rendered at
    pub offset: u64,
    /// Number of events applied to reach this frame
    pub applied: usize,
    /// Total events in the stream
    pub total: usize,
    /// Most recently applied event
    pub last_event: Option<&'a NormalizedEvent>,
    /// Viewport size from the latest applied meta event
    pub viewport: Option<(u32, u32)>,
    /// Page address from the latest applied meta event
    pub href: Option<&'a str>,
}

/// A replay engine bound to one rendering surface.
pub trait ReplayEngine {
    /// Surface this engine paints into.
    fn surface(&self) -> SurfaceId;

    /// Start running from `offset`.
    fn play(&mut self, offset: u64, now: Instant);

    /// Stop running and render the frame at `offset`.
    fn pause_at(&mut self, offset: u64);

    /// Change the playback rate without moving the playhead.
    fn set_speed(&mut self, speed: f32, now: Instant);

    /// Subscribe to tick notifications.
    fn subscribe(&mut self) -> (Subscription, Receiver<Tick>);

    /// Drive the engine's timing loop up to `now`, emitting ticks.
    fn advance(&mut self, now: Instant);

    /// The frame currently displayed.
    fn frame(&self) -> Frame<'_>;

    /// Stop the timing loop and release the surface.
    fn destroy(&mut self);
}

/// Constructs engines for the synchronizer.
pub trait EngineFactory {
    fn create(
        &self,
        events: Arc<[NormalizedEvent]>,
        surface: SurfaceId,
    ) -> Result<Box<dyn ReplayEngine>, EngineError>;
}

/// Engine that replays by walking the event list against a wall clock.
pub struct ClockEngine {
    events: Arc<[NormalizedEvent]>,
    surface: SurfaceId,
    duration: u64,
    offset: u64,
    speed: f32,
    /// Set while running: the instant and offset playback resumed from
    anchor: Option<(Instant, u64)>,
    emitter: TickEmitter,
    destroyed: bool,
}

impl ClockEngine {
    /// Bind a new engine to `surface`.
    ///
    /// The stream must contain a full snapshot; incremental patches have
    /// nothing to apply to otherwise.
    pub fn new(events: Arc<[NormalizedEvent]>, surface: SurfaceId) -> Result<Self, EngineError> {
        if events.is_empty() {
            return Err(EngineError::EmptyStream);
        }
        if !events.iter().any(|e| e.kind == EventKind::FullSnapshot) {
            return Err(EngineError::NoFullSnapshot);
        }

        let duration = events.last().map_or(0, |e| e.offset);
        Ok(Self {
            events,
            surface,
            duration,
            offset: 0,
            speed: DEFAULT_SPEED,
            anchor: None,
            emitter: TickEmitter::new(),
            destroyed: false,
        })
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    fn offset_at(&self, now: Instant) -> u64 {
        match self.anchor {
            Some((started, base)) => {
                let elapsed = now.saturating_duration_since(started).as_secs_f64();
                base + (elapsed * 1000.0 * f64::from(self.speed)) as u64
            }
            None => self.offset,
        }
    }
}

impl ReplayEngine for ClockEngine {
    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn play(&mut self, offset: u64, now: Instant) {
        if self.destroyed {
            return;
        }
        self.offset = offset.min(self.duration);
        self.anchor = Some((now, self.offset));
    }

    fn pause_at(&mut self, offset: u64) {
        self.anchor = None;
        self.offset = offset.min(self.duration);
    }

    fn set_speed(&mut self, speed: f32, now: Instant) {
        if self.anchor.is_some() {
            let current = self.offset_at(now).min(self.duration);
            self.anchor = Some((now, current));
            self.offset = current;
        }
        self.speed = speed;
    }

    fn subscribe(&mut self) -> (Subscription, Receiver<Tick>) {
        self.emitter.subscribe()
    }

    fn advance(&mut self, now: Instant) {
        if self.destroyed || !self.is_running() {
            return;
        }

        let offset = self.offset_at(now);
        if offset >= self.duration {
            self.offset = self.duration;
            self.anchor = None;
            self.emitter.emit(Tick::Time(self.duration));
            self.emitter.emit(Tick::Finished);
        } else {
            self.offset = offset;
            self.emitter.emit(Tick::Time(offset));
        }
    }

    fn frame(&self) -> Frame<'_> {
        let applied = self.events.partition_point(|e| e.offset <= self.offset);
        let shown = &self.events[..applied];
        let meta = shown.iter().rev().find(|e| e.kind == EventKind::Meta);

        let viewport = meta.and_then(|e| {
            let width = e.data.get("width")?.as_u64()?;
            let height = e.data.get("height")?.as_u64()?;
            Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
        });

        Frame {
            offset: self.offset,
            applied,
            total: self.events.len(),
            last_event: shown.last(),
            viewport,
            href: meta.and_then(|e| e.data.get("href")?.as_str()),
        }
    }

    fn destroy(&mut self) {
        self.anchor = None;
        self.destroyed = true;
        log::debug!(
            "replay engine on surface {:?} destroyed, dropping {} listener(s)",
            self.surface,
            self.emitter.listener_count()
        );
        self.emitter.clear();
    }
}

/// Factory for [`ClockEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockEngineFactory;

impl EngineFactory for ClockEngineFactory {
    fn create(
        &self,
        events: Arc<[NormalizedEvent]>,
        surface: SurfaceId,
    ) -> Result<Box<dyn ReplayEngine>, EngineError> {
        Ok(Box::new(ClockEngine::new(events, surface)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stream() -> Arc<[NormalizedEvent]> {
        Arc::from(vec![
            NormalizedEvent {
                offset: 0,
                kind: EventKind::Meta,
                data: serde_json::json!({"href": "https://app.test/", "width": 1280, "height": 720}),
            },
            NormalizedEvent {
                offset: 0,
                kind: EventKind::FullSnapshot,
                data: serde_json::Value::Null,
            },
            NormalizedEvent {
                offset: 400,
                kind: EventKind::IncrementalSnapshot,
                data: serde_json::Value::Null,
            },
            NormalizedEvent {
                offset: 1000,
                kind: EventKind::IncrementalSnapshot,
                data: serde_json::Value::Null,
            },
        ])
    }

    fn drain(receiver: &Receiver<Tick>) -> Vec<Tick> {
        receiver.try_iter().collect()
    }

    #[test]
    fn test_construction_requires_full_snapshot() {
        let no_snapshot: Arc<[NormalizedEvent]> = Arc::from(vec![NormalizedEvent {
            offset: 0,
            kind: EventKind::Meta,
            data: serde_json::Value::Null,
        }]);

        assert_eq!(
            ClockEngine::new(no_snapshot, SurfaceId(1)).err(),
            Some(EngineError::NoFullSnapshot)
        );
        assert_eq!(
            ClockEngine::new(Arc::from(Vec::new()), SurfaceId(1)).err(),
            Some(EngineError::EmptyStream)
        );
    }

    #[test]
    fn test_advance_emits_ticks_while_running() {
        let mut engine = ClockEngine::new(stream(), SurfaceId(1)).unwrap();
        let (_subscription, ticks) = engine.subscribe();
        let start = Instant::now();

        // Paused engines stay silent.
        engine.advance(start + Duration::from_millis(100));
        assert!(drain(&ticks).is_empty());

        engine.play(0, start);
        engine.advance(start + Duration::from_millis(250));
        assert_eq!(drain(&ticks), vec![Tick::Time(250)]);
    }

    #[test]
    fn test_advance_finishes_at_end() {
        let mut engine = ClockEngine::new(stream(), SurfaceId(1)).unwrap();
        let (_subscription, ticks) = engine.subscribe();
        let start = Instant::now();

        engine.play(900, start);
        engine.advance(start + Duration::from_millis(500));

        assert_eq!(drain(&ticks), vec![Tick::Time(1000), Tick::Finished]);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_speed_scales_clock() {
        let mut engine = ClockEngine::new(stream(), SurfaceId(1)).unwrap();
        let (_subscription, ticks) = engine.subscribe();
        let start = Instant::now();

        engine.play(0, start);
        engine.set_speed(2.0, start + Duration::from_millis(100));
        engine.advance(start + Duration::from_millis(200));

        // 100ms at 1x, then 100ms at 2x
        assert_eq!(drain(&ticks), vec![Tick::Time(300)]);
    }

    #[test]
    fn test_frame_reflects_offset() {
        let mut engine = ClockEngine::new(stream(), SurfaceId(1)).unwrap();

        engine.pause_at(500);
        let frame = engine.frame();
        assert_eq!(frame.offset, 500);
        assert_eq!(frame.applied, 3);
        assert_eq!(frame.total, 4);
        assert_eq!(frame.viewport, Some((1280, 720)));
        assert_eq!(frame.href, Some("https://app.test/"));
        assert_eq!(
            frame.last_event.map(|e| e.kind),
            Some(EventKind::IncrementalSnapshot)
        );
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let mut emitter = TickEmitter::new();
        let (subscription, ticks) = emitter.subscribe();
        let (_other, other_ticks) = emitter.subscribe();
        assert_eq!(emitter.listener_count(), 2);

        subscription.unsubscribe();
        emitter.emit(Tick::Time(5));

        assert_eq!(emitter.listener_count(), 1);
        assert!(drain(&ticks).is_empty());
        assert_eq!(drain(&other_ticks), vec![Tick::Time(5)]);
    }

    #[test]
    fn test_destroy_stops_ticks() {
        let mut engine = ClockEngine::new(stream(), SurfaceId(1)).unwrap();
        let (_subscription, ticks) = engine.subscribe();
        let start = Instant::now();

        engine.play(0, start);
        engine.destroy();
        engine.advance(start + Duration::from_millis(100));

        assert!(drain(&ticks).is_empty());
        assert!(!engine.is_running());
    }
}

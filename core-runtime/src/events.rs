//! # Event Bus System
//!
//! Broadcasts lifecycle events of video surface sessions using
//! `tokio::sync::broadcast`, so hosts, analytics and debugging overlays can
//! observe sessions without holding a reference to them.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps domain enums; today that is
//!   [`SurfaceEvent`].
//! - **EventBus**: cloneable broadcast sender.
//! - **EventStream**: receiver wrapper with optional filtering.
//!
//! ```text
//! ┌─────────────────┐    emit    ┌───────────┐  subscribe  ┌────────────┐
//! │ PlaybackSession ├───────────>│ EventBus  ├────────────>│ Subscriber │
//! └─────────────────┘            └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SurfaceEvent};
//!
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//! bus.emit(CoreEvent::Surface(SurfaceEvent::Released { engine: 1 })).ok();
//! assert!(rx.try_recv().is_ok());
//! ```
//!
//! Emitting while nobody is subscribed returns an error that callers are
//! expected to ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, SendError};

pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Video surface session events
    Surface(SurfaceEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Surface(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Surface(SurfaceEvent::Error {
                recoverable: false, ..
            }) => EventSeverity::Error,
            CoreEvent::Surface(SurfaceEvent::Error { .. }) => EventSeverity::Warning,
            CoreEvent::Surface(SurfaceEvent::Rendered { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Surface Events
// ============================================================================

/// Events emitted by a playback session over one or more bind cycles.
///
/// `engine` is the session-local id of the engine instance the event relates
/// to; it changes on every rebind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum SurfaceEvent {
    /// A fresh engine was created and bound to the surface.
    Bound {
        engine: u64,
        /// Number of items in the bound playlist.
        items: usize,
    },
    /// First transform of the bind cycle was applied; the surface is visible.
    Rendered {
        engine: u64,
        width: u32,
        height: u32,
        /// Time from bind to first rendered frame.
        time_to_first_frame_ms: u64,
    },
    /// Engine buffering state changed (`idle`, `buffering`, `ready`, `ended`).
    PlaybackStateChanged { engine: u64, state: String },
    /// Engine started or stopped actually playing.
    IsPlayingChanged { engine: u64, playing: bool },
    /// Bind failure or runtime playback error.
    Error {
        engine: Option<u64>,
        message: String,
        /// Whether the session is still usable without a release.
        recoverable: bool,
    },
    /// The engine was released and detached from the surface.
    Released { engine: u64 },
}

impl SurfaceEvent {
    fn description(&self) -> &str {
        match self {
            SurfaceEvent::Bound { .. } => "Engine bound to surface",
            SurfaceEvent::Rendered { .. } => "First frame rendered",
            SurfaceEvent::PlaybackStateChanged { .. } => "Playback state changed",
            SurfaceEvent::IsPlayingChanged { .. } => "Playing state changed",
            SurfaceEvent::Error { .. } => "Surface error",
            SurfaceEvent::Released { .. } => "Engine released",
        }
    }

    /// Engine id carried by the event, if any.
    pub fn engine(&self) -> Option<u64> {
        match self {
            SurfaceEvent::Bound { engine, .. }
            | SurfaceEvent::Rendered { engine, .. }
            | SurfaceEvent::PlaybackStateChanged { engine, .. }
            | SurfaceEvent::IsPlayingChanged { engine, .. }
            | SurfaceEvent::Released { engine } => Some(*engine),
            SurfaceEvent::Error { engine, .. } => *engine,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every [`EventBus::subscribe`] call
/// creates an independent receiver that only sees future events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Shorthand for emitting a [`SurfaceEvent`].
    pub fn emit_surface(&self, event: SurfaceEvent) -> Result<usize, SendError<CoreEvent>> {
        self.emit(CoreEvent::Surface(event))
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Stream restricted to events about one engine instance.
    pub fn for_engine(self, engine: u64) -> Self {
        self.filter(move |event| match event {
            CoreEvent::Surface(e) => e.engine() == Some(engine),
        })
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once every sender has been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns `None` if no matching event is currently queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

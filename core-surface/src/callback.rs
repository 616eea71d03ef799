//! Engine callback marshaling.
//!
//! Engines invoke their listeners from internal threads. Each bind cycle gets
//! an [`EngineCallbacks`] listener tagged with that cycle's [`EngineId`]; it
//! only forwards the callback into an unbounded channel. The owning session
//! drains the channel on its own thread and discards anything whose origin no
//! longer matches the live engine.
//!
//! Nothing is applied until the owner drains the mailbox. Hosts that do not
//! want to poll can await the shared [`Notify`], which is signalled after
//! every successful forward.

use bridge_traits::{EngineFailure, EngineListener, EngineState, PixelSize};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tracing::trace;

/// Identity of one engine instance within a session. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EngineId(u64);

impl EngineId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of an engine callback.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PlaybackStateChanged(EngineState),
    IsPlayingChanged(bool),
    VideoSizeChanged(PixelSize),
    Error(EngineFailure),
}

/// A callback captured on an engine thread, waiting to be applied on the
/// session's thread.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCallback {
    /// Engine that produced the callback.
    pub origin: EngineId,
    pub event: EngineEvent,
}

impl EngineCallback {
    pub fn new(origin: EngineId, event: EngineEvent) -> Self {
        Self { origin, event }
    }
}

/// Outcome of handing a callback to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackDisposition {
    /// The callback came from the live engine and was applied.
    Applied,
    /// The callback came from a released engine and was dropped.
    Stale,
}

/// Listener registered on an engine. Forwards every callback, tagged with the
/// engine's identity, to the owning session.
#[derive(Debug)]
pub struct EngineCallbacks {
    origin: EngineId,
    sender: UnboundedSender<EngineCallback>,
    wake: Arc<Notify>,
}

impl EngineCallbacks {
    pub fn origin(&self) -> EngineId {
        self.origin
    }

    fn forward(&self, event: EngineEvent) {
        // The session is gone; nothing left to update.
        if self.sender.send(EngineCallback::new(self.origin, event)).is_err() {
            trace!(engine = %self.origin, "dropping callback for closed session");
            return;
        }
        self.wake.notify_one();
    }
}

impl EngineListener for EngineCallbacks {
    fn on_playback_state_changed(&self, state: EngineState) {
        self.forward(EngineEvent::PlaybackStateChanged(state));
    }

    fn on_is_playing_changed(&self, playing: bool) {
        self.forward(EngineEvent::IsPlayingChanged(playing));
    }

    fn on_video_size_changed(&self, size: PixelSize) {
        self.forward(EngineEvent::VideoSizeChanged(size));
    }

    fn on_player_error(&self, failure: EngineFailure) {
        self.forward(EngineEvent::Error(failure));
    }
}

/// Session-side end of the callback channel.
#[derive(Debug)]
pub(crate) struct CallbackMailbox {
    sender: UnboundedSender<EngineCallback>,
    receiver: UnboundedReceiver<EngineCallback>,
    wake: Arc<Notify>,
}

impl CallbackMailbox {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Listener to register on the engine identified by `origin`.
    pub(crate) fn listener_for(&self, origin: EngineId) -> EngineCallbacks {
        EngineCallbacks {
            origin,
            sender: self.sender.clone(),
            wake: Arc::clone(&self.wake),
        }
    }

    /// Signalled whenever a callback is queued.
    pub(crate) fn waker(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    pub(crate) fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Next queued callback, if any. Never blocks.
    pub(crate) fn try_next(&mut self) -> Option<EngineCallback> {
        self.receiver.try_recv().ok()
    }

    /// Drops everything queued so far. Returns how many callbacks were dropped.
    pub(crate) fn discard_all(&mut self) -> usize {
        let mut dropped = 0;
        while self.receiver.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_are_tagged_with_their_origin() {
        let mut mailbox = CallbackMailbox::new();
        let first = mailbox.listener_for(EngineId::new(1));
        let second = mailbox.listener_for(EngineId::new(2));

        first.on_video_size_changed(PixelSize::new(640, 360));
        second.on_player_error(EngineFailure::new(7, "decoder init"));

        assert_eq!(
            mailbox.try_next(),
            Some(EngineCallback::new(
                EngineId::new(1),
                EngineEvent::VideoSizeChanged(PixelSize::new(640, 360))
            ))
        );
        let next = mailbox.try_next().unwrap();
        assert_eq!(next.origin, EngineId::new(2));
        assert!(matches!(next.event, EngineEvent::Error(ref f) if f.code == 7));
        assert!(mailbox.try_next().is_none());
    }

    #[test]
    fn callbacks_cross_threads() {
        let mut mailbox = CallbackMailbox::new();
        let listener = mailbox.listener_for(EngineId::new(3));

        std::thread::spawn(move || {
            listener.on_playback_state_changed(EngineState::Buffering);
            listener.on_is_playing_changed(true);
        })
        .join()
        .unwrap();

        assert_eq!(
            mailbox.try_next().map(|c| c.event),
            Some(EngineEvent::PlaybackStateChanged(EngineState::Buffering))
        );
        assert_eq!(
            mailbox.try_next().map(|c| c.event),
            Some(EngineEvent::IsPlayingChanged(true))
        );
    }

    #[test]
    fn forwarding_after_session_drop_is_silent() {
        let mailbox = CallbackMailbox::new();
        let listener = mailbox.listener_for(EngineId::new(9));
        drop(mailbox);

        listener.on_is_playing_changed(false);
        assert_eq!(listener.origin(), EngineId::new(9));
    }

    #[tokio::test]
    async fn forwarding_wakes_the_owner() {
        let mut mailbox = CallbackMailbox::new();
        let waker = mailbox.waker();
        let listener = mailbox.listener_for(EngineId::new(4));

        std::thread::spawn(move || listener.on_is_playing_changed(true))
            .join()
            .unwrap();

        // The permit stored by notify_one completes this immediately.
        waker.notified().await;
        assert_eq!(mailbox.len(), 1);
        assert_eq!(
            mailbox.try_next().map(|c| c.event),
            Some(EngineEvent::IsPlayingChanged(true))
        );
    }

    #[test]
    fn discard_all_empties_the_queue() {
        let mut mailbox = CallbackMailbox::new();
        let listener = mailbox.listener_for(EngineId::new(5));
        listener.on_is_playing_changed(true);
        listener.on_video_size_changed(PixelSize::new(320, 240));

        assert_eq!(mailbox.discard_all(), 2);
        assert_eq!(mailbox.len(), 0);
        assert!(mailbox.try_next().is_none());
    }

    #[test]
    fn engine_id_display() {
        assert_eq!(EngineId::new(12).to_string(), "#12");
        assert_eq!(EngineId::new(12).get(), 12);
    }
}

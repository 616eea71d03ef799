//! Deduplicated set of telemetry listeners.

use crate::callback::EngineId;
use bridge_traits::{TelemetryListener, VideoEngine};
use std::sync::Arc;
use tracing::debug;

/// Telemetry listeners that outlive individual engines.
///
/// Membership is by identity (`Arc` address), not by value. Members are
/// attached to each engine as it is bound and detached before it is released.
#[derive(Default)]
pub struct ListenerRegistry {
    members: Vec<Arc<dyn TelemetryListener>>,
    attached_to: Option<EngineId>,
}

fn same_listener(a: &Arc<dyn TelemetryListener>, b: &Arc<dyn TelemetryListener>) -> bool {
    // Compare data addresses only; vtable pointers are not guaranteed unique.
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener`. Returns `false` if it was already a member.
    pub fn add(&mut self, listener: Arc<dyn TelemetryListener>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.members.push(listener);
        true
    }

    /// Removes `listener`. Returns `false` if it was not a member.
    pub fn remove(&mut self, listener: &Arc<dyn TelemetryListener>) -> bool {
        let before = self.members.len();
        self.members.retain(|member| !same_listener(member, listener));
        self.members.len() != before
    }

    /// Removes every member and hands them back so the caller can detach them
    /// from a live engine.
    pub fn clear(&mut self) -> Vec<Arc<dyn TelemetryListener>> {
        std::mem::take(&mut self.members)
    }

    pub fn contains(&self, listener: &Arc<dyn TelemetryListener>) -> bool {
        self.members.iter().any(|member| same_listener(member, listener))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Engine the members are currently attached to.
    pub fn attached_to(&self) -> Option<EngineId> {
        self.attached_to
    }

    /// Attaches every member to `engine`.
    pub fn attach_all(&mut self, id: EngineId, engine: &mut dyn VideoEngine) {
        for listener in &self.members {
            engine.add_telemetry_listener(Arc::clone(listener));
        }
        self.attached_to = Some(id);
        debug!(engine = %id, count = self.members.len(), "attached telemetry listeners");
    }

    /// Detaches every member from `engine`, if they were attached to it.
    pub fn detach_all(&mut self, id: EngineId, engine: &mut dyn VideoEngine) {
        if self.attached_to != Some(id) {
            return;
        }
        for listener in &self.members {
            engine.remove_telemetry_listener(listener);
        }
        self.attached_to = None;
        debug!(engine = %id, count = self.members.len(), "detached telemetry listeners");
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.members.len())
            .field("attached_to", &self.attached_to)
            .finish()
    }
}

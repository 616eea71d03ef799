//! Debug telemetry logger.

use crate::callback::EngineId;
use bridge_traits::{TelemetryEvent, TelemetryListener};
use tracing::debug;

/// Telemetry listener that writes every engine analytics event to `tracing`
/// at debug level. Attached per engine when
/// [`SurfaceConfig::debug_event_logging`](crate::SurfaceConfig::debug_event_logging)
/// is enabled.
#[derive(Debug, Clone, Copy)]
pub struct TracingEventLogger {
    engine: EngineId,
}

impl TracingEventLogger {
    pub fn new(engine: EngineId) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> EngineId {
        self.engine
    }
}

impl TelemetryListener for TracingEventLogger {
    fn on_event(&self, event: &TelemetryEvent) {
        let mut fields: Vec<_> = event.fields.iter().collect();
        fields.sort();
        debug!(
            target: "core_surface::telemetry",
            engine = %self.engine,
            event = %event.name,
            position_ms = ?event.position_ms,
            fields = ?fields,
            "engine event"
        );
    }
}

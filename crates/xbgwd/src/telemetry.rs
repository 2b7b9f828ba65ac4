//! Telemetry log sink
//!
//! Stands in for an upload client: every event published under `xbee` is
//! logged as one structured line.

use xbgw_core::{TelemetryBus, TelemetryEvent};

/// Parent topic of all radio telemetry
pub const TELEMETRY_ROOT_TOPIC: &str = "xbee";

pub fn register_log_sink(bus: &TelemetryBus) {
    bus.subscribe(TELEMETRY_ROOT_TOPIC, |event: &TelemetryEvent| {
        match serde_json::to_string(&event.value) {
            Ok(value) => tracing::info!(
                stream = %event.ident.stream_name(),
                %value,
                received_at = %event.received_at.to_rfc3339(),
                "Telemetry"
            ),
            Err(e) => tracing::warn!(error = %e, "Could not serialize telemetry value"),
        }
    });
}

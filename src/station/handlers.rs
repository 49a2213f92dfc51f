//! Packet handlers registered by the base station

use tracing::{debug, warn};

use super::StationState;
use crate::com::Com;
use crate::packet::protocol::{Address, Frame, PacketType};
use crate::radio::RadioLink;

/// Handle a `Reading` frame from a field node
///
/// Updates the node's activity, signal strength, battery and sensor state,
/// records a telemetry snapshot and replies with the current time. The reply
/// is skipped if the RTC cannot be read.
///
/// # Returns
///
/// * `bool` - `false` if the frame came from an unregistered node
pub fn handle_reading_packet<R: RadioLink>(
    com: &mut Com<R, StationState>,
    state: &mut StationState,
    frame: &Frame,
) -> bool {
    let source = frame.header.source;

    let Some(node) = state.registry.get_node_from_id(source) else {
        warn!("Received packet from unknown node: 0x{:02X}", source);
        return false;
    };

    debug!("Reading packet from 0x{:02X}", source);

    node.report_activity(state.clock.as_ref());
    node.set_rssi(frame.header.rssi);
    node.update(frame.content.payload());

    if !node.is_battery_ok() {
        warn!("Node 0x{:02X} battery low: {} mV", source, node.battery_voltage());
    }

    if let Some(logger) = state.telemetry.as_mut() {
        if let Err(e) = logger.record(node) {
            warn!("Failed to record telemetry for node 0x{:02X}: {}", source, e);
        }
    }

    send_ack(com, source);
    true
}

/// Reply to `target` with the current time
fn send_ack<R: RadioLink>(com: &mut Com<R, StationState>, target: Address) {
    // RtcFail is logged by current_time
    let Some(timestamp) = com.current_time() else {
        return;
    };

    if !com.send(target, PacketType::Time, &timestamp.to_bytes()) {
        debug!("Time ack to 0x{:02X} not queued", target);
    }
}

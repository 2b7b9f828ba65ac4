//! Pieces shared by the socket managers

use std::time::Duration;

use tracing::{debug, warn};
use xbgw_core::ReplySender;

use crate::error::XBeeCommandError;
use crate::transport::{DatagramSocket, Interest, TransportError};
use crate::txid::{TransmissionSlotTable, TxIdError};

/// Send one frame if the socket is writable right now
///
/// Readiness is checked with a zero timeout; a socket that is not
/// writable (or reports anything besides writability) fails immediately
/// rather than queueing.
pub fn attempt_send<S>(
    socket: &S,
    payload: &[u8],
    destination: &S::Addr,
) -> Result<(), TransportError>
where
    S: DatagramSocket + ?Sized,
{
    let readiness = socket.poll(Interest::Write, Duration::ZERO)?;
    if readiness.is_empty() {
        return Err(TransportError::SocketUnavailable(
            "No poll events returned".to_string(),
        ));
    }
    if !readiness.is_write_only() {
        return Err(TransportError::SocketUnavailable(
            "Socket not available for write".to_string(),
        ));
    }
    socket.send_to(payload, destination)?;
    Ok(())
}

/// Reserve a transmission id for `reply`
///
/// When the table is full, slots whose command has already been answered
/// by timeout (reply channel closed) are reclaimed once before giving up.
pub fn allocate_transmission(
    slots: &TransmissionSlotTable<ReplySender>,
    reply: &ReplySender,
) -> Result<u8, XBeeCommandError> {
    match slots.allocate(reply.clone()) {
        Ok(id) => Ok(id),
        Err(TxIdError::CapacityExhausted(_)) => {
            let freed = slots.reclaim(ReplySender::is_closed);
            if freed > 0 {
                warn!(freed, "Reclaimed transmission ids of abandoned commands");
            }
            slots.allocate(reply.clone()).map_err(|e| {
                debug!(error = %e, "Transmission id allocation failed");
                XBeeCommandError::TxFull
            })
        }
        Err(e) => Err(XBeeCommandError::Unexpected(e.to_string())),
    }
}

/// Send after allocation; on failure the id is released again
pub fn send_or_release<S>(
    socket: &S,
    slots: &TransmissionSlotTable<ReplySender>,
    txid: u8,
    payload: &[u8],
    destination: &S::Addr,
) -> Result<(), XBeeCommandError>
where
    S: DatagramSocket + ?Sized,
{
    attempt_send(socket, payload, destination).map_err(|e| {
        if let Err(release) = slots.release(txid) {
            warn!(txid, error = %release, "Failed to release transmission id");
        }
        XBeeCommandError::TxFailed(e.to_string())
    })
}

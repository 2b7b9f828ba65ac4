//! Address headers for bridged frames
//!
//! When radio frames are carried over UDP, each datagram is the encoded
//! address followed by the payload:
//!
//! ```text
//! DestinationDescriptor (15 bytes)
//!   address u64 | endpoint u8 | profile u16 | cluster u16 | options u8 | txid u8
//! DdoDescriptor (13 bytes)
//!   address u64 | command [u8; 2] | options u8 | txid u8 | status u8
//! ```
//!
//! All integers are big-endian.

use super::TransportError;
use crate::address::{DdoDescriptor, DestinationDescriptor, HardwareAddress};

/// An address that can prefix a bridged datagram
pub trait FrameAddress: Sized {
    const HEADER_LEN: usize;

    fn encode_header(&self, out: &mut Vec<u8>);

    fn decode_header(header: &[u8]) -> Result<Self, TransportError>;
}

/// Header + payload
pub fn encode_frame<A: FrameAddress>(addr: &A, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(A::HEADER_LEN + payload.len());
    addr.encode_header(&mut frame);
    frame.extend_from_slice(payload);
    frame
}

/// Split a frame into its address and payload
pub fn decode_frame<A: FrameAddress>(frame: &[u8]) -> Result<(A, &[u8]), TransportError> {
    if frame.len() < A::HEADER_LEN {
        return Err(TransportError::ProtocolError(format!(
            "Frame too short: {} bytes, header needs {}",
            frame.len(),
            A::HEADER_LEN
        )));
    }
    let (header, payload) = frame.split_at(A::HEADER_LEN);
    Ok((A::decode_header(header)?, payload))
}

fn read_address(header: &[u8]) -> HardwareAddress {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&header[..8]);
    HardwareAddress::new(u64::from_be_bytes(raw))
}

impl FrameAddress for DestinationDescriptor {
    const HEADER_LEN: usize = 15;

    fn encode_header(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.address.value().to_be_bytes());
        out.push(self.endpoint);
        out.extend_from_slice(&self.profile.to_be_bytes());
        out.extend_from_slice(&self.cluster.to_be_bytes());
        out.push(self.options);
        out.push(self.transmission_id);
    }

    fn decode_header(h: &[u8]) -> Result<Self, TransportError> {
        if h.len() < Self::HEADER_LEN {
            return Err(TransportError::ProtocolError("Short address header".into()));
        }
        Ok(Self {
            address: read_address(h),
            endpoint: h[8],
            profile: u16::from_be_bytes([h[9], h[10]]),
            cluster: u16::from_be_bytes([h[11], h[12]]),
            options: h[13],
            transmission_id: h[14],
        })
    }
}

impl FrameAddress for DdoDescriptor {
    const HEADER_LEN: usize = 13;

    fn encode_header(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.address.value().to_be_bytes());
        out.extend_from_slice(&self.command);
        out.push(self.options);
        out.push(self.transmission_id);
        out.push(self.status);
    }

    fn decode_header(h: &[u8]) -> Result<Self, TransportError> {
        if h.len() < Self::HEADER_LEN {
            return Err(TransportError::ProtocolError("Short address header".into()));
        }
        Ok(Self {
            address: read_address(h),
            command: [h[8], h[9]],
            options: h[10],
            transmission_id: h[11],
            status: h[12],
        })
    }
}

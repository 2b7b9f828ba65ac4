//! UDP bridge socket
//!
//! Exchanges radio frames with a bridge process over UDP. Each datagram is
//! an address header followed by the payload (see [`super::frame`]). The
//! socket is non-blocking; readiness comes from `poll(2)`.

use std::io;
use std::marker::PhantomData;
use std::net::{SocketAddr, UdpSocket};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, warn};

use super::frame::{decode_frame, encode_frame, FrameAddress};
use super::{DatagramSocket, Interest, Readiness, TransportError};
use crate::config::UdpConfig;

/// Largest payload a radio frame carries
const MAX_PAYLOAD: usize = 255;

pub struct UdpBridgeSocket<A> {
    socket: UdpSocket,
    remote: SocketAddr,
    recv_buf: Mutex<Vec<u8>>,
    _addr: PhantomData<fn() -> A>,
}

impl<A: FrameAddress> UdpBridgeSocket<A> {
    pub fn bind(config: &UdpConfig) -> Result<Self, TransportError> {
        let bind: SocketAddr = config.bind.parse().map_err(|e| {
            TransportError::InvalidConfig(format!("Invalid bind address '{}': {}", config.bind, e))
        })?;
        let remote: SocketAddr = config.remote.parse().map_err(|e| {
            TransportError::InvalidConfig(format!(
                "Invalid remote address '{}': {}",
                config.remote, e
            ))
        })?;

        let socket = Self::create_socket(bind)?;
        info!(%bind, %remote, "UDP bridge socket bound");

        Ok(Self {
            socket,
            remote,
            // One spare byte so an oversize datagram is seen, not truncated
            recv_buf: Mutex::new(vec![0u8; A::HEADER_LEN + MAX_PAYLOAD + 1]),
            _addr: PhantomData,
        })
    }

    fn create_socket(bind: SocketAddr) -> Result<UdpSocket, TransportError> {
        let socket = Socket::new(Domain::for_address(bind), Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("Failed to create UDP socket: {}", e))
            })?;

        socket.set_reuse_address(true).map_err(|e| {
            TransportError::InvalidConfig(format!("Failed to set SO_REUSEADDR: {}", e))
        })?;

        socket.set_nonblocking(true).map_err(|e| {
            TransportError::InvalidConfig(format!("Failed to set non-blocking: {}", e))
        })?;

        socket.bind(&bind.into()).map_err(|e| {
            TransportError::ConnectionFailed(format!("Failed to bind {}: {}", bind, e))
        })?;

        Ok(socket.into())
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket
            .local_addr()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))
    }
}

impl<A> DatagramSocket for UdpBridgeSocket<A>
where
    A: FrameAddress + Clone + std::fmt::Debug + Send + Sync,
{
    type Addr = A;

    fn poll(&self, interest: Interest, timeout: Duration) -> Result<Readiness, TransportError> {
        let events = match interest {
            Interest::Read => libc::POLLIN,
            Interest::Write => libc::POLLOUT,
        };
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;
        let revents = poll_fd(self.socket.as_raw_fd(), events, timeout_ms)
            .map_err(|e| TransportError::SocketUnavailable(e.to_string()))?;

        Ok(Readiness {
            readable: revents & libc::POLLIN != 0,
            writable: revents & libc::POLLOUT != 0,
            error: revents & libc::POLLERR != 0,
            hangup: revents & libc::POLLHUP != 0,
        })
    }

    fn send_to(&self, payload: &[u8], addr: &A) -> Result<usize, TransportError> {
        let frame = encode_frame(addr, payload);
        let sent = self
            .socket
            .send_to(&frame, self.remote)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(sent.saturating_sub(A::HEADER_LEN))
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, A), TransportError> {
        let mut frame = self.recv_buf.lock();
        let (len, peer) = self
            .socket
            .recv_from(&mut frame)
            .map_err(TransportError::from_recv)?;
        debug!(%peer, len, "UDP bridge frame received");

        if len > A::HEADER_LEN + MAX_PAYLOAD {
            warn!(%peer, len, "Oversize frame from bridge, dropping");
            return Err(TransportError::ProtocolError(format!(
                "Frame of {} bytes exceeds {} byte limit",
                len,
                A::HEADER_LEN + MAX_PAYLOAD
            )));
        }

        let (addr, payload) = decode_frame::<A>(&frame[..len])?;
        let copied = payload.len().min(buf.len());
        buf[..copied].copy_from_slice(&payload[..copied]);
        Ok((copied, addr))
    }
}

/// Wait up to `timeout_ms` for `events` on `fd`; returns the reported events.
/// An interrupted wait reports no events.
fn poll_fd(fd: RawFd, events: libc::c_short, timeout_ms: libc::c_int) -> io::Result<libc::c_short> {
    let mut pfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };
    // SAFETY: pfd is a valid pollfd for the duration of the call and nfds is 1.
    unsafe {
        if libc::poll(&mut pfd, 1, timeout_ms) < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(0);
            }
            return Err(err);
        }
    }
    Ok(pfd.revents)
}

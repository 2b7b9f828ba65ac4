//! In-memory datagram socket for tests and demo mode

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{DatagramSocket, Interest, Readiness, TransportError};
use crate::config::MockConfig;

/// Mock socket: inbound frames are injected, outbound frames are recorded
pub struct MockSocket<A> {
    inbound: Mutex<VecDeque<(Vec<u8>, A)>>,
    arrived: Condvar,
    sent: Mutex<Vec<(Vec<u8>, A)>>,
    write_readiness: Mutex<Readiness>,
    send_error: Mutex<Option<String>>,
}

impl<A> MockSocket<A> {
    pub fn new(config: &MockConfig) -> Self {
        let write_readiness = if config.writable {
            Readiness::WRITABLE
        } else {
            Readiness::NONE
        };
        Self {
            inbound: Mutex::new(VecDeque::new()),
            arrived: Condvar::new(),
            sent: Mutex::new(Vec::new()),
            write_readiness: Mutex::new(write_readiness),
            send_error: Mutex::new(None),
        }
    }

    /// Queue a frame as if it arrived from the radio
    pub fn inject(&self, payload: impl Into<Vec<u8>>, addr: A) {
        self.inbound.lock().push_back((payload.into(), addr));
        self.arrived.notify_all();
    }

    /// Readiness reported for write interest
    pub fn set_write_readiness(&self, readiness: Readiness) {
        *self.write_readiness.lock() = readiness;
    }

    /// Make every send fail with `message` until cleared with `None`
    pub fn set_send_error(&self, message: Option<&str>) {
        *self.send_error.lock() = message.map(str::to_string);
    }

    /// Drain recorded outbound frames
    pub fn take_sent(&self) -> Vec<(Vec<u8>, A)> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbound.lock().len()
    }
}

impl<A> Default for MockSocket<A> {
    fn default() -> Self {
        Self::new(&MockConfig::default())
    }
}

impl<A> DatagramSocket for MockSocket<A>
where
    A: Clone + std::fmt::Debug + Send + Sync,
{
    type Addr = A;

    fn poll(&self, interest: Interest, timeout: Duration) -> Result<Readiness, TransportError> {
        if interest == Interest::Write {
            return Ok(*self.write_readiness.lock());
        }

        // Read interest blocks until a frame is injected or the timeout passes
        let deadline = Instant::now() + timeout;
        let mut inbound = self.inbound.lock();
        while inbound.is_empty() {
            if self.arrived.wait_until(&mut inbound, deadline).timed_out() {
                break;
            }
        }
        Ok(if inbound.is_empty() {
            Readiness::NONE
        } else {
            Readiness::READABLE
        })
    }

    fn send_to(&self, payload: &[u8], addr: &A) -> Result<usize, TransportError> {
        if let Some(message) = self.send_error.lock().clone() {
            return Err(TransportError::SendFailed(message));
        }
        tracing::debug!(len = payload.len(), ?addr, "Mock socket: sent frame");
        self.sent.lock().push((payload.to_vec(), addr.clone()));
        Ok(payload.len())
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, A), TransportError> {
        let (payload, addr) = self
            .inbound
            .lock()
            .pop_front()
            .ok_or(TransportError::WouldBlock)?;
        // Datagram semantics: excess bytes are discarded
        let len = payload.len().min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        Ok((len, addr))
    }
}

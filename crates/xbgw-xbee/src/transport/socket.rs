//! Datagram socket abstraction

use std::fmt;
use std::time::Duration;

use super::TransportError;

/// Readiness the caller is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Read,
    Write,
}

/// Events reported by [`DatagramSocket::poll`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    pub readable: bool,
    pub writable: bool,
    pub error: bool,
    pub hangup: bool,
}

impl Readiness {
    pub const NONE: Readiness = Readiness {
        readable: false,
        writable: false,
        error: false,
        hangup: false,
    };

    pub const READABLE: Readiness = Readiness {
        readable: true,
        ..Readiness::NONE
    };

    pub const WRITABLE: Readiness = Readiness {
        writable: true,
        ..Readiness::NONE
    };

    pub fn is_empty(&self) -> bool {
        *self == Readiness::NONE
    }

    /// Writable and nothing else
    pub fn is_write_only(&self) -> bool {
        *self == Readiness::WRITABLE
    }
}

/// A non-blocking, message-oriented socket addressed by `Addr`
///
/// The radio stack exposes one such socket per frame family: data frames
/// use [`DestinationDescriptor`](crate::address::DestinationDescriptor)
/// addresses, remote configuration uses
/// [`DdoDescriptor`](crate::address::DdoDescriptor).
pub trait DatagramSocket: Send + Sync {
    type Addr: Clone + fmt::Debug + Send + Sync;

    /// Report readiness for `interest`, waiting at most `timeout`
    fn poll(&self, interest: Interest, timeout: Duration) -> Result<Readiness, TransportError>;

    /// Send one datagram; returns the number of payload bytes sent
    fn send_to(&self, payload: &[u8], addr: &Self::Addr) -> Result<usize, TransportError>;

    /// Receive one datagram into `buf`. Returns [`TransportError::WouldBlock`]
    /// when nothing is queued.
    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, Self::Addr), TransportError>;
}

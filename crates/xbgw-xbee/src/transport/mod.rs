//! Transport layer for radio frames
//!
//! This module provides the datagram sockets the managers talk through:
//! - UDP bridge socket exchanging framed datagrams with a radio bridge (unix)
//! - Mock socket for testing and demo mode
//!
//! # Example
//!
//! ```ignore
//! use xbgw_xbee::transport::{create_socket, DatagramSocket};
//! use xbgw_xbee::config::TransportConfig;
//! use xbgw_xbee::DestinationDescriptor;
//!
//! let config = TransportConfig::Mock(Default::default());
//! let socket = create_socket::<DestinationDescriptor>(&config)?;
//! socket.send_to(b"hello", &destination)?;
//! ```

pub mod error;
pub mod frame;
pub mod mock;
mod socket;

#[cfg(unix)]
pub mod udp;

pub use error::TransportError;
pub use frame::FrameAddress;
pub use mock::MockSocket;
pub use socket::{DatagramSocket, Interest, Readiness};

use std::fmt::Debug;
use std::sync::Arc;

use crate::config::TransportConfig;

/// Shared handle to a socket addressed by `A`
pub type SharedSocket<A> = Arc<dyn DatagramSocket<Addr = A>>;

/// Create a datagram socket based on configuration
pub fn create_socket<A>(config: &TransportConfig) -> Result<SharedSocket<A>, TransportError>
where
    A: FrameAddress + Clone + Debug + Send + Sync + 'static,
{
    match config {
        #[cfg(unix)]
        TransportConfig::Udp(cfg) => {
            let socket = udp::UdpBridgeSocket::<A>::bind(cfg)?;
            Ok(Arc::new(socket))
        }
        #[cfg(not(unix))]
        TransportConfig::Udp(_) => Err(TransportError::Unsupported(
            "UDP bridge socket requires a unix platform".to_string(),
        )),
        TransportConfig::Mock(cfg) => {
            let socket = mock::MockSocket::<A>::new(cfg);
            Ok(Arc::new(socket))
        }
    }
}

//! xbgw-command - Command routing for the XBee gateway
//!
//! This crate provides the [`CommandRouter`], which turns a batch of XML
//! command elements into a batch of XML replies by publishing each command
//! on the command bus and collecting what the handlers put on its reply
//! channel.
//!
//! # Architecture
//!
//! ```text
//!  "<send_serial .../><echo/>"
//!            │ process_batch
//!            ▼
//! ┌─────────────────────────┐   command.<tag>   ┌──────────────────┐
//! │      CommandRouter      │ ────────────────▶ │  CommandBus      │
//! │  per command:           │                   │  handlers run    │
//! │   publish, drop sender, │ ◀──────────────── │  synchronously   │
//! │   collect until settled │   ReplySender     └──────────────────┘
//! └─────────────────────────┘   (Immediate / Pending / Deferred)
//!            │
//!            ▼
//!  "<responses command=..>..</responses><responses ..>..</responses>"
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = Arc::new(CommandBus::new());
//! EchoCommand::new().register(&bus);
//! let router = CommandRouter::new(bus);
//! let xml = router.process_batch("<echo>hi</echo>").await?;
//! ```

mod echo;
mod error;
mod router;

pub use echo::{EchoCommand, ECHO_COMMAND};
pub use error::RouterError;
pub use router::{CommandRouter, DEFAULT_RESPONSE_TIMEOUT};

// Re-export core types for convenience
pub use xbgw_core::{CommandBus, CommandMessage, Element, ElementError, Reply, ReplySender};

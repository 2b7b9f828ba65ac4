//! Read-readiness event loop for the socket managers
//!
//! The reactor owns one dedicated thread. Each pass checks every registered
//! [`EventSource`] for readability without blocking and lets ready sources
//! handle their frames. After a pass that finds nothing, the thread blocks
//! on read readiness, sharing the poll interval between the sources, and
//! starts the next pass as soon as one of them turns readable.
//!
//! Errors from a source are handed back to that source's
//! [`EventSource::handle_error`]; the loop never stops because of them.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::ReactorConfig;
use crate::error::ManagerError;
use crate::transport::TransportError;

/// Upper bound on reads from one source per pass
const MAX_READS_PER_PASS: usize = 64;

/// A socket owner driven by the reactor
pub trait EventSource: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a frame is waiting; must not block
    fn readable(&self) -> Result<bool, TransportError>;

    /// Block up to `timeout` for a frame to arrive
    fn wait_readable(&self, timeout: Duration) -> Result<bool, TransportError> {
        thread::sleep(timeout);
        self.readable()
    }

    /// Consume one frame
    fn handle_read(&self) -> Result<(), ManagerError>;

    /// Report a failure from `readable` or `handle_read`. The socket stays open.
    fn handle_error(&self, err: ManagerError) {
        error!(source = self.name(), error = %err, "Uncaught error in event source");
    }
}

pub struct Reactor {
    sources: Vec<Arc<dyn EventSource>>,
    poll_interval: Duration,
}

impl Reactor {
    pub fn new(config: &ReactorConfig) -> Self {
        Self {
            sources: Vec::new(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    pub fn register(&mut self, source: Arc<dyn EventSource>) {
        debug!(source = source.name(), "Registered event source");
        self.sources.push(source);
    }

    /// One pass over all sources. Returns the number of frames handled.
    pub fn run_once(&self) -> usize {
        let mut handled = 0;
        for source in &self.sources {
            for _ in 0..MAX_READS_PER_PASS {
                match source.readable() {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        source.handle_error(e.into());
                        break;
                    }
                }
                if let Err(e) = source.handle_read() {
                    source.handle_error(e);
                }
                handled += 1;
            }
        }
        handled
    }

    /// Block until some source is readable or the poll interval is spent
    fn wait_idle(&self) {
        if self.sources.is_empty() {
            thread::sleep(self.poll_interval);
            return;
        }

        let slice = self.poll_interval / self.sources.len() as u32;
        for source in &self.sources {
            match source.wait_readable(slice) {
                Ok(true) => return,
                Ok(false) => {}
                Err(e) => source.handle_error(e.into()),
            }
        }
    }

    /// Run the loop on a dedicated thread until the handle is shut down
    pub fn spawn(self) -> io::Result<ReactorHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let thread = thread::Builder::new()
            .name("xbgw-reactor".to_string())
            .spawn(move || {
                info!(sources = self.sources.len(), "Reactor started");
                while flag.load(Ordering::SeqCst) {
                    if self.run_once() == 0 {
                        self.wait_idle();
                    }
                }
                info!("Reactor stopped");
            })?;

        Ok(ReactorHandle {
            running,
            thread: Some(thread),
        })
    }
}

/// Stops and joins the reactor thread; dropping the handle does the same
pub struct ReactorHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReactorHandle {
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Reactor thread panicked");
            }
        }
    }
}

impl Drop for ReactorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

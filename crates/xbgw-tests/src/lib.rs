//! Integration tests for the XBee gateway
//!
//! This crate contains end-to-end tests that exercise the full stack:
//! - Command router and batch handling
//! - Serial and DDO socket managers
//! - Reactor thread and mock radio sockets
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p xbgw-tests
//! ```
//!
//! # Test Structure
//!
//! - `gateway_e2e_test.rs` - Command batches answered by a simulated radio
//! - `telemetry_e2e_test.rs` - Inbound frames published on the telemetry bus
//!
//! The [`GatewayTestHarness`] wires the real components together over
//! [`MockSocket`]s; a [`RadioSimulator`] thread plays the radio side.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use xbgw_command::{CommandRouter, EchoCommand};
use xbgw_core::telemetry::DATA_TOPICS;
use xbgw_core::{CommandBus, TelemetryBus, TelemetryEvent};
use xbgw_xbee::serial::TX_STATUS_CLUSTER;
use xbgw_xbee::{
    DdoConfig, DdoDescriptor, DdoManager, DestinationDescriptor, MockSocket, Reactor,
    ReactorConfig, ReactorHandle, XBeeConfig, XBeeSerialManager,
};

/// Reply behaviour of the simulated radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    /// Answer every frame with a status frame
    Answer,
    /// Swallow frames; no status ever arrives
    Silent,
}

type Frames<A> = Arc<Mutex<Vec<(Vec<u8>, A)>>>;

/// Plays the radio side of both sockets on a background thread
pub struct RadioSimulator {
    running: Arc<AtomicBool>,
    serial_frames: Frames<DestinationDescriptor>,
    ddo_frames: Frames<DdoDescriptor>,
    delivery_status: Arc<AtomicU8>,
    ddo_status: Arc<AtomicU8>,
    silent: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RadioSimulator {
    pub fn start(
        serial: Arc<MockSocket<DestinationDescriptor>>,
        ddo: Arc<MockSocket<DdoDescriptor>>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let delivery_status = Arc::new(AtomicU8::new(0));
        let ddo_status = Arc::new(AtomicU8::new(0));
        let silent = Arc::new(AtomicBool::new(false));
        let serial_frames: Frames<DestinationDescriptor> = Arc::default();
        let ddo_frames: Frames<DdoDescriptor> = Arc::default();

        let thread = {
            let serial_frames = serial_frames.clone();
            let ddo_frames = ddo_frames.clone();
            let running = running.clone();
            let delivery_status = delivery_status.clone();
            let ddo_status = ddo_status.clone();
            let silent = silent.clone();
            thread::spawn(move || {
                while running.load(Ordering::SeqCst) {
                    let quiet = silent.load(Ordering::SeqCst);

                    for (payload, dest) in serial.take_sent() {
                        tracing::debug!(%dest, len = payload.len(), "Radio got serial frame");
                        serial_frames.lock().push((payload, dest));
                        if quiet || dest.transmission_id == 0 {
                            continue;
                        }
                        let mut status_addr = dest;
                        status_addr.cluster = TX_STATUS_CLUSTER;
                        let delivery = delivery_status.load(Ordering::SeqCst);
                        serial.inject(vec![0, 0, 0xFF, 0xFE, 0, delivery, 0], status_addr);
                    }

                    for (payload, dest) in ddo.take_sent() {
                        tracing::debug!(%dest, "Radio got DDO frame");
                        ddo_frames.lock().push((payload, dest));
                        if quiet {
                            continue;
                        }
                        let mut status_addr = dest;
                        status_addr.status = ddo_status.load(Ordering::SeqCst);
                        ddo.inject(Vec::new(), status_addr);
                    }

                    thread::sleep(Duration::from_millis(2));
                }
            })
        };

        Self {
            running,
            serial_frames,
            ddo_frames,
            delivery_status,
            ddo_status,
            silent,
            thread: Some(thread),
        }
    }

    /// Data frames received so far
    pub fn serial_frames(&self) -> Vec<(Vec<u8>, DestinationDescriptor)> {
        self.serial_frames.lock().clone()
    }

    /// Remote configuration frames received so far
    pub fn ddo_frames(&self) -> Vec<(Vec<u8>, DdoDescriptor)> {
        self.ddo_frames.lock().clone()
    }

    pub fn set_delivery_status(&self, status: u8) {
        self.delivery_status.store(status, Ordering::SeqCst);
    }

    pub fn set_ddo_status(&self, status: u8) {
        self.ddo_status.store(status, Ordering::SeqCst);
    }

    pub fn set_mode(&self, mode: RadioMode) {
        self.silent.store(mode == RadioMode::Silent, Ordering::SeqCst);
    }
}

impl Drop for RadioSimulator {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Options for [`GatewayTestHarness::with_options`]
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub xbee: XBeeConfig,
    pub ddo: DdoConfig,
    pub response_timeout: Duration,
    pub echo_delay: Duration,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            xbee: XBeeConfig::default(),
            ddo: DdoConfig::default(),
            response_timeout: Duration::from_secs(5),
            echo_delay: Duration::ZERO,
        }
    }
}

/// The gateway stack over mock sockets, with a running reactor
pub struct GatewayTestHarness {
    pub serial_socket: Arc<MockSocket<DestinationDescriptor>>,
    pub ddo_socket: Arc<MockSocket<DdoDescriptor>>,
    pub serial: Arc<XBeeSerialManager>,
    pub ddo: Arc<DdoManager>,
    pub router: CommandRouter,
    pub telemetry: Arc<TelemetryBus>,
    pub events: Arc<Mutex<Vec<(String, TelemetryEvent)>>>,
    pub radio: RadioSimulator,
    _reactor: ReactorHandle,
}

impl GatewayTestHarness {
    pub fn new() -> Self {
        Self::with_options(HarnessOptions::default())
    }

    pub fn with_options(options: HarnessOptions) -> Self {
        let commands = Arc::new(CommandBus::new());
        let telemetry = Arc::new(TelemetryBus::new());

        let events = Arc::new(Mutex::new(Vec::new()));
        for topic in DATA_TOPICS {
            let events = events.clone();
            telemetry.subscribe(topic, move |event: &TelemetryEvent| {
                events.lock().push((topic.to_string(), event.clone()));
            });
        }

        EchoCommand::with_delay(options.echo_delay).register(&commands);

        let serial_socket = Arc::new(MockSocket::default());
        let serial = Arc::new(XBeeSerialManager::new(
            serial_socket.clone(),
            &options.xbee,
            telemetry.clone(),
        ));
        serial.register(&commands);

        let ddo_socket = Arc::new(MockSocket::default());
        let ddo = Arc::new(DdoManager::new(ddo_socket.clone(), &options.ddo));
        ddo.register(&commands);

        let mut reactor = Reactor::new(&ReactorConfig { poll_interval_ms: 2 });
        reactor.register(serial.clone());
        reactor.register(ddo.clone());
        let reactor = reactor.spawn().expect("spawn reactor thread");

        let radio = RadioSimulator::start(serial_socket.clone(), ddo_socket.clone());
        let router = CommandRouter::new(commands).with_response_timeout(options.response_timeout);

        Self {
            serial_socket,
            ddo_socket,
            serial,
            ddo,
            router,
            telemetry,
            events,
            radio,
            _reactor: reactor,
        }
    }

    /// Run a batch, panicking on malformed XML
    pub async fn run(&self, batch: &str) -> String {
        self.router.process_batch(batch).await.expect("well-formed batch")
    }

    /// Wait until `count` telemetry events were seen, or the deadline passes
    pub async fn wait_for_events(&self, count: usize) -> Vec<(String, TelemetryEvent)> {
        for _ in 0..500 {
            if self.events.lock().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        self.events.lock().clone()
    }
}

impl Default for GatewayTestHarness {
    fn default() -> Self {
        Self::new()
    }
}

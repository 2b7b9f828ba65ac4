//! End-to-end tests for command batches against a simulated radio
//!
//! Each test builds the full gateway stack over mock sockets: the command
//! router, both socket managers, a running reactor thread and a radio
//! simulator that answers outbound frames with status frames.
//!
//! Run with: cargo test -p xbgw-tests --test gateway_e2e_test

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use xbgw_command::CommandRouter;
use xbgw_core::{CommandBus, Element, TelemetryBus};
use xbgw_tests::{GatewayTestHarness, HarnessOptions, RadioMode};
use xbgw_xbee::ddo::{DDO_OPTION_APPLY, OUTPUT_HIGH, STATUS_BAD_COMMAND, STATUS_OK};
use xbgw_xbee::serial::{DEFAULT_ENDPOINT, DIGI_PROFILE, SERIAL_CLUSTER, TX_STATUS_CLUSTER};
use xbgw_xbee::transport::{Interest, Readiness};
use xbgw_xbee::{
    DatagramSocket, DdoConfig, DestinationDescriptor, HardwareAddress, MockSocket, Reactor,
    ReactorConfig, TransportError, XBeeConfig, XBeeSerialManager,
};

const NODE: &str = "00:13:a2:00:40:0a:12:34";

/// Parse a concatenated batch reply into its `<responses>` elements
fn parse_responses(xml: &str) -> Vec<Element> {
    Element::parse(&format!("<root>{}</root>", xml))
        .expect("batch reply is well-formed")
        .children
}

fn error_id(response: &Element) -> Option<&str> {
    response.find("error").and_then(|e| e.attribute("id"))
}

fn error_hint(response: &Element) -> Option<&str> {
    response
        .find("error")
        .and_then(|e| e.find("hint"))
        .and_then(|h| h.text())
}

// =============================================================================
// send_serial
// =============================================================================

#[tokio::test]
async fn test_send_serial_delivered() {
    let harness = GatewayTestHarness::new();

    let batch = format!(r#"<send_serial addr="{NODE}" encoding="utf-8">hello</send_serial>"#);
    let reply = harness.run(&batch).await;

    assert_eq!(reply, r#"<responses command="send_serial"><response/></responses>"#);
    assert_eq!(harness.serial.outstanding(), 0);
}

#[tokio::test]
async fn test_send_serial_frame_reaches_radio() {
    let harness = GatewayTestHarness::new();

    // Whitespace inside base64 bodies is ignored
    let batch = format!("<send_serial addr=\"{NODE}\">aGVs\n  bG8=</send_serial>");
    harness.run(&batch).await;

    let frames = harness.radio.serial_frames();
    assert_eq!(frames.len(), 1);
    let (payload, dest) = &frames[0];
    assert_eq!(payload.as_slice(), b"hello");
    assert_eq!(dest.address, HardwareAddress::parse(NODE).unwrap());
    assert_eq!(dest.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(dest.profile, DIGI_PROFILE);
    assert_eq!(dest.cluster, SERIAL_CLUSTER);
    assert_ne!(dest.transmission_id, 0);
}

#[tokio::test]
async fn test_broadcast_send_serial() {
    let harness = GatewayTestHarness::new();

    let reply = harness
        .run(r#"<send_serial addr="broadcast" encoding="utf-8">all</send_serial>"#)
        .await;
    assert_eq!(reply, r#"<responses command="send_serial"><response/></responses>"#);

    let frames = harness.radio.serial_frames();
    assert_eq!(frames[0].1.address, HardwareAddress::BROADCAST);
}

#[tokio::test]
async fn test_send_serial_delivery_failure() {
    let harness = GatewayTestHarness::new();
    harness.radio.set_delivery_status(0x25);

    let batch = format!(r#"<send_serial addr="{NODE}" encoding="utf-8">x</send_serial>"#);
    let responses = parse_responses(&harness.run(&batch).await);

    assert_eq!(responses.len(), 1);
    let response = &responses[0].children[0];
    assert_eq!(error_id(response), Some("txstatus"));
    assert_eq!(error_hint(response), Some("0x25: Route not found"));
}

#[tokio::test]
async fn test_send_serial_validation_never_reaches_radio() {
    let harness = GatewayTestHarness::new();

    let batch = concat!(
        r#"<send_serial>aGk=</send_serial>"#,
        r#"<send_serial addr="zz:zz">aGk=</send_serial>"#,
        r#"<send_serial addr="00:13:a2:00:40:0a:12:34" encoding="utf-16">hi</send_serial>"#,
        r#"<send_serial addr="00:13:a2:00:40:0a:12:34">not base64!</send_serial>"#,
    );
    let responses = parse_responses(&harness.run(batch).await);

    let ids: Vec<Option<&str>> = responses.iter().map(|r| error_id(&r.children[0])).collect();
    assert_eq!(
        ids,
        vec![Some("missingattr"), Some("address"), Some("encoding"), Some("base64")]
    );
    assert_eq!(harness.serial.outstanding(), 0);
}

#[tokio::test]
async fn test_send_serial_socket_error_reports_txfailed() {
    let harness = GatewayTestHarness::new();
    harness.serial_socket.set_send_error(Some("Network is down"));

    let batch = format!(r#"<send_serial addr="{NODE}" encoding="utf-8">x</send_serial>"#);
    let responses = parse_responses(&harness.run(&batch).await);

    let response = &responses[0].children[0];
    assert_eq!(error_id(response), Some("txfailed"));
    assert_eq!(error_hint(response), Some("Network is down"));
    assert_eq!(harness.serial.outstanding(), 0);
}

// =============================================================================
// set_digital_output
// =============================================================================

#[tokio::test]
async fn test_set_digital_output_acknowledged() {
    let harness = GatewayTestHarness::new();
    harness.radio.set_ddo_status(STATUS_OK);

    let batch = format!(r#"<set_digital_output addr="{NODE}" index="3">on</set_digital_output>"#);
    let reply = harness.run(&batch).await;

    assert_eq!(
        reply,
        r#"<responses command="set_digital_output"><response/></responses>"#
    );
    assert_eq!(harness.ddo.outstanding(), 0);

    let frames = harness.radio.ddo_frames();
    assert_eq!(frames.len(), 1);
    let (payload, dest) = &frames[0];
    assert_eq!(payload.as_slice(), &OUTPUT_HIGH.to_be_bytes()[..]);
    assert_eq!(&dest.command, b"D3");
    assert_eq!(dest.options, DDO_OPTION_APPLY);
}

#[tokio::test]
async fn test_set_digital_output_bad_command_status() {
    let harness = GatewayTestHarness::new();
    harness.radio.set_ddo_status(STATUS_BAD_COMMAND);

    let batch = format!(r#"<set_digital_output addr="{NODE}" name="DIO2">0</set_digital_output>"#);
    let responses = parse_responses(&harness.run(&batch).await);

    let response = &responses[0].children[0];
    assert_eq!(error_id(response), Some("badcmd"));
    assert_eq!(error_hint(response), Some("D2"));
}

#[tokio::test]
async fn test_set_digital_output_validation() {
    let harness = GatewayTestHarness::new();

    let batch = concat!(
        r#"<set_digital_output addr="00:13:a2:00:40:0a:12:34">on</set_digital_output>"#,
        r#"<set_digital_output addr="00:13:a2:00:40:0a:12:34" index="1" name="DIO1">on</set_digital_output>"#,
        r#"<set_digital_output addr="00:13:a2:00:40:0a:12:34" index="1">maybe</set_digital_output>"#,
    );
    let responses = parse_responses(&harness.run(batch).await);

    let ids: Vec<Option<&str>> = responses.iter().map(|r| error_id(&r.children[0])).collect();
    assert_eq!(ids, vec![Some("missingattr"), Some("toomanyattrs"), Some("badoutput")]);
    assert_eq!(harness.ddo.outstanding(), 0);
}

// =============================================================================
// Batches and timeouts
// =============================================================================

#[tokio::test]
async fn test_mixed_batch_keeps_document_order() {
    let harness = GatewayTestHarness::with_options(HarnessOptions {
        echo_delay: Duration::from_millis(20),
        ..Default::default()
    });

    let batch = format!(
        concat!(
            r#"<echo>first</echo>"#,
            r#"<send_serial addr="{node}" encoding="utf-8">x</send_serial>"#,
            r#"<reboot/>"#,
            r#"<set_digital_output addr="{node}" index="0">1</set_digital_output>"#,
        ),
        node = NODE
    );
    let responses = parse_responses(&harness.run(&batch).await);

    let commands: Vec<Option<&str>> = responses.iter().map(|r| r.attribute("command")).collect();
    assert_eq!(
        commands,
        vec![
            Some("echo"),
            Some("send_serial"),
            Some("reboot"),
            Some("set_digital_output")
        ]
    );
    assert_eq!(responses[0].children[0].text(), Some("first"));
    assert_eq!(error_id(&responses[2].children[0]), Some("command.unknown"));
    assert_eq!(error_hint(&responses[2].children[0]), Some("reboot"));
}

#[tokio::test]
async fn test_silent_radio_times_out_and_slot_is_reclaimed() {
    let harness = GatewayTestHarness::with_options(HarnessOptions {
        xbee: XBeeConfig {
            max_transmission_id: 1,
            ..Default::default()
        },
        ddo: DdoConfig::default(),
        response_timeout: Duration::from_millis(100),
        echo_delay: Duration::ZERO,
    });
    harness.radio.set_mode(RadioMode::Silent);

    let batch = format!(r#"<send_serial addr="{NODE}" encoding="utf-8">x</send_serial>"#);
    let responses = parse_responses(&harness.run(&batch).await);
    assert_eq!(error_id(&responses[0].children[0]), Some("command.timeout"));
    // The only id stays taken by the abandoned command
    assert_eq!(harness.serial.outstanding(), 1);

    harness.radio.set_mode(RadioMode::Answer);
    let reply = harness.run(&batch).await;
    assert_eq!(reply, r#"<responses command="send_serial"><response/></responses>"#);
    assert_eq!(harness.serial.outstanding(), 0);
}

/// Radio that reports delivery before `send_to` even returns
struct InstantRadio {
    inner: MockSocket<DestinationDescriptor>,
}

impl DatagramSocket for InstantRadio {
    type Addr = DestinationDescriptor;

    fn poll(&self, interest: Interest, timeout: Duration) -> Result<Readiness, TransportError> {
        self.inner.poll(interest, timeout)
    }

    fn send_to(&self, payload: &[u8], addr: &DestinationDescriptor) -> Result<usize, TransportError> {
        let sent = self.inner.send_to(payload, addr)?;
        let mut status_addr = *addr;
        status_addr.cluster = TX_STATUS_CLUSTER;
        self.inner.inject(vec![0, 0, 0xFF, 0xFE, 0, 0, 0], status_addr);
        // Give the reactor time to complete the command first
        std::thread::sleep(Duration::from_millis(50));
        Ok(sent)
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, DestinationDescriptor), TransportError> {
        self.inner.recv_from(buf)
    }
}

#[tokio::test]
async fn test_status_overtaking_pending_is_not_a_timeout() {
    let commands = Arc::new(CommandBus::new());
    let telemetry = Arc::new(TelemetryBus::new());
    let socket = Arc::new(InstantRadio {
        inner: MockSocket::default(),
    });
    let serial = Arc::new(XBeeSerialManager::new(socket, &XBeeConfig::default(), telemetry));
    serial.register(&commands);

    let mut reactor = Reactor::new(&ReactorConfig { poll_interval_ms: 2 });
    reactor.register(serial.clone());
    let _reactor = reactor.spawn().expect("spawn reactor thread");

    let router = CommandRouter::new(commands).with_response_timeout(Duration::from_secs(2));
    let batch = format!(r#"<send_serial addr="{NODE}" encoding="utf-8">x</send_serial>"#);
    let reply = router.process_batch(&batch).await.unwrap();

    assert_eq!(reply, r#"<responses command="send_serial"><response/></responses>"#);
    assert_eq!(serial.outstanding(), 0);
}

#[tokio::test]
async fn test_malformed_batch_is_rejected() {
    let harness = GatewayTestHarness::new();
    assert!(harness.router.process_batch("<echo>").await.is_err());
}

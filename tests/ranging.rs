//! Protocol-level tests driven by a scripted mock transceiver

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::blocking::delay::DelayMs;

use sstwr_initiator::frame::{self, RESPONSE_TEMPLATE};
use sstwr_initiator::time::{DEVICE_TIME_UNIT_SECONDS, SPEED_OF_LIGHT_M_PER_S};
use sstwr_initiator::{
    Leg, Poller, PollerConfig, RadioConfig, RangeOutcome, RangingSession, Screen, SystemStatus,
    Transceiver, TxMode,
};

/// What the radio does after the next poll goes out
#[derive(Clone, Debug)]
enum RxEvent {
    Good {
        frame: Vec<u8>,
        reported_len: u32,
        tx_timestamp: u32,
        rx_timestamp: u32,
    },
    Timeout,
    ReceiveError,
}

/// A transceiver that replays a scripted sequence of receive outcomes
#[derive(Default)]
struct MockRadio {
    events: VecDeque<RxEvent>,
    current: Option<RxEvent>,
    status: SystemStatus,
    /// Number of empty status reads before the terminal flag shows up
    status_latency: u32,
    pending_reads: u32,
    polls_sent: Vec<Vec<u8>>,
    rx_read_lengths: Vec<usize>,
    receiver_resets: usize,
    rx_timeout_uus: Option<u16>,
}

impl MockRadio {
    fn with_script(events: Vec<RxEvent>) -> Self {
        MockRadio {
            events: events.into(),
            status_latency: 2,
            ..MockRadio::default()
        }
    }
}

impl Transceiver for MockRadio {
    type Error = Infallible;

    fn configure(&mut self, _config: &RadioConfig) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_antenna_delay(&mut self, _tx: u16, _rx: u16) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_rx_after_tx_delay(&mut self, _delay_uus: u32) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_rx_timeout(&mut self, timeout_uus: u16) -> Result<(), Infallible> {
        self.rx_timeout_uus = Some(timeout_uus);
        Ok(())
    }

    fn write_tx_data(&mut self, data: &[u8]) -> Result<(), Infallible> {
        self.polls_sent.push(data.to_vec());
        Ok(())
    }

    fn start_tx(&mut self, mode: TxMode) -> Result<(), Infallible> {
        assert_eq!(mode, TxMode::ExpectResponse);

        let event = self
            .events
            .pop_front()
            .expect("poll sent but no scripted receive event left");
        self.status = match &event {
            RxEvent::Good { .. } => SystemStatus::TX_FRAME_SENT | SystemStatus::RX_FRAME_GOOD,
            RxEvent::Timeout => SystemStatus::TX_FRAME_SENT | SystemStatus::RX_TIMEOUT,
            RxEvent::ReceiveError => SystemStatus::TX_FRAME_SENT | SystemStatus::RX_ERROR,
        };
        self.current = Some(event);
        self.pending_reads = self.status_latency;
        Ok(())
    }

    fn read_status(&mut self) -> Result<SystemStatus, Infallible> {
        if self.pending_reads > 0 {
            self.pending_reads -= 1;
            return Ok(SystemStatus::EMPTY);
        }
        Ok(self.status)
    }

    fn clear_status(&mut self, flags: SystemStatus) -> Result<(), Infallible> {
        self.status.remove(flags);
        Ok(())
    }

    fn read_frame_length(&mut self) -> Result<u32, Infallible> {
        match &self.current {
            Some(RxEvent::Good { reported_len, .. }) => Ok(*reported_len),
            _ => panic!("frame length read without a received frame"),
        }
    }

    fn read_rx_data(&mut self, buffer: &mut [u8]) -> Result<(), Infallible> {
        self.rx_read_lengths.push(buffer.len());
        match &self.current {
            Some(RxEvent::Good { frame, .. }) => {
                buffer.copy_from_slice(&frame[..buffer.len()]);
                Ok(())
            }
            _ => panic!("frame data read without a received frame"),
        }
    }

    fn read_tx_timestamp(&mut self) -> Result<sstwr_initiator::RawTimestamp, Infallible> {
        match &self.current {
            Some(RxEvent::Good { tx_timestamp, .. }) => {
                Ok(sstwr_initiator::RawTimestamp::new(*tx_timestamp))
            }
            _ => panic!("TX timestamp read without a received frame"),
        }
    }

    fn read_rx_timestamp(&mut self) -> Result<sstwr_initiator::RawTimestamp, Infallible> {
        match &self.current {
            Some(RxEvent::Good { rx_timestamp, .. }) => {
                Ok(sstwr_initiator::RawTimestamp::new(*rx_timestamp))
            }
            _ => panic!("RX timestamp read without a received frame"),
        }
    }

    fn reset_receiver(&mut self) -> Result<(), Infallible> {
        self.receiver_resets += 1;
        self.status = SystemStatus::EMPTY;
        Ok(())
    }
}

#[derive(Default)]
struct MockScreen {
    lines: Vec<String>,
}

impl Screen for MockScreen {
    fn show(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

#[derive(Default)]
struct MockDelay {
    sleeps: Vec<u16>,
}

impl DelayMs<u16> for MockDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.sleeps.push(ms);
    }
}

/// A conforming response frame with the given payload fields
fn response(poll_rx: u32, resp_tx: u32, relay_byte: u8) -> Vec<u8> {
    let mut frame = RESPONSE_TEMPLATE.to_vec();
    frame[10..14].copy_from_slice(&poll_rx.to_le_bytes());
    frame[14..18].copy_from_slice(&resp_tx.to_le_bytes());
    frame[20] = relay_byte;
    frame
}

fn good(frame: Vec<u8>, tx_timestamp: u32, rx_timestamp: u32) -> RxEvent {
    let reported_len = frame.len() as u32;
    RxEvent::Good {
        frame,
        reported_len,
        tx_timestamp,
        rx_timestamp,
    }
}

fn session_with(events: Vec<RxEvent>) -> RangingSession<MockRadio> {
    let mut session = RangingSession::new(MockRadio::with_script(events));
    session.init(&RadioConfig::default()).unwrap();
    session
}

#[test]
fn ordinary_leg_computes_distance_from_four_timestamps() {
    let mut session = session_with(vec![good(response(1000, 3800, 0), 0, 3000)]);

    let outcome = session.range(Leg::Anchor1).unwrap();

    let expected = 100.0 * DEVICE_TIME_UNIT_SECONDS * SPEED_OF_LIGHT_M_PER_S;
    match outcome {
        RangeOutcome::Distance(distance) => assert!((distance - expected).abs() < 1e-9),
        RangeOutcome::NoResponse => panic!("expected a distance"),
    }
}

#[test]
fn poll_frames_carry_the_leg_code_and_sequence_number() {
    let mut session = session_with(vec![RxEvent::Timeout, RxEvent::Timeout, RxEvent::Timeout]);

    session.range(Leg::Anchor1).unwrap();
    session.range(Leg::Anchor2).unwrap();
    session.range(Leg::Relay).unwrap();

    let radio = session.free();
    assert_eq!(radio.polls_sent[0], frame::build_poll(0, Leg::Anchor1));
    assert_eq!(radio.polls_sent[1], frame::build_poll(1, Leg::Anchor2));
    assert_eq!(radio.polls_sent[2], frame::build_poll(2, Leg::Relay));
}

#[test]
fn sequence_number_advances_on_failures_too() {
    let mut session = session_with(vec![RxEvent::Timeout, RxEvent::ReceiveError]);

    assert_eq!(session.range(Leg::Anchor1).unwrap(), RangeOutcome::NoResponse);
    assert_eq!(session.range(Leg::Anchor1).unwrap(), RangeOutcome::NoResponse);
    assert_eq!(session.sequence_number(), 2);
}

#[test]
fn oversize_frame_is_dropped_without_reading_a_byte() {
    let event = RxEvent::Good {
        frame: vec![0; 40],
        reported_len: 40,
        tx_timestamp: 0,
        rx_timestamp: 0,
    };
    let mut session = session_with(vec![event]);

    let outcome = session.range(Leg::Anchor1).unwrap();

    assert_eq!(outcome, RangeOutcome::NoResponse);
    let radio = session.free();
    assert!(radio.rx_read_lengths.is_empty());
}

#[test]
fn frame_with_wrong_header_is_silently_ignored() {
    // A poll frame coming back at us has a valid length but the wrong
    // header; it must be treated exactly like a timeout.
    let stray = frame::build_poll(9, Leg::Anchor1).to_vec();
    let mut session = session_with(vec![good(stray, 0, 3000)]);

    assert_eq!(session.range(Leg::Anchor1).unwrap(), RangeOutcome::NoResponse);
}

#[test]
fn relay_leg_reads_the_direct_distance_byte() {
    let mut session = session_with(vec![good(response(0, 0, 100), 0, 0)]);

    match session.range(Leg::Relay).unwrap() {
        RangeOutcome::Distance(distance) => assert_eq!(distance, 2.00),
        RangeOutcome::NoResponse => panic!("expected a distance"),
    }
}

#[test]
fn receiver_is_reset_after_every_exchange() {
    let mut session = session_with(vec![
        good(response(1000, 3800, 0), 0, 3000),
        RxEvent::Timeout,
        RxEvent::ReceiveError,
    ]);

    session.range(Leg::Anchor1).unwrap();
    session.range(Leg::Anchor1).unwrap();
    session.range(Leg::Anchor1).unwrap();

    let radio = session.free();
    assert_eq!(radio.receiver_resets, 3);
}

#[test]
fn init_configures_the_hardware_receive_timeout() {
    // Without a hardware timeout the wait for a terminal status could
    // never end on a lost response.
    let session = session_with(vec![]);
    let radio = session.free();
    assert_eq!(radio.rx_timeout_uus, Some(210));
}

#[test]
fn round_records_successes_and_skips_failures() {
    // Anchor 1 succeeds with known timestamps, anchor 2 times out, the
    // relay reports 50 raw (1.00 m).
    let events = vec![
        good(response(1000, 3800, 0), 0, 3000),
        RxEvent::Timeout,
        good(response(0, 0, 50), 0, 0),
    ];
    let session = session_with(events);
    let mut poller = Poller::new(session, MockScreen::default(), MockDelay::default());

    poller.run_round().unwrap();

    assert_eq!(poller.history(Leg::Anchor1).len(), 1);
    assert!(poller.history(Leg::Anchor2).is_empty());
    assert_eq!(poller.history(Leg::Relay).latest(), Some(1.00));
    assert_eq!(poller.completed_rounds(), 1);
}

#[test]
fn only_the_relay_leg_completes_a_round() {
    let events = vec![
        good(response(1000, 3800, 0), 0, 3000),
        good(response(1000, 3800, 0), 0, 3000),
        RxEvent::Timeout,
    ];
    let session = session_with(events);
    let mut poller = Poller::new(session, MockScreen::default(), MockDelay::default());

    poller.run_round().unwrap();

    assert_eq!(poller.history(Leg::Anchor1).len(), 1);
    assert_eq!(poller.history(Leg::Anchor2).len(), 1);
    assert_eq!(poller.completed_rounds(), 0);
}

#[test]
fn distances_are_shown_in_the_reference_format() {
    let events = vec![
        RxEvent::Timeout,
        RxEvent::Timeout,
        good(response(0, 0, 50), 0, 0),
    ];
    let session = session_with(events);
    let mut poller = Poller::new(session, MockScreen::default(), MockDelay::default());

    poller.run_round().unwrap();

    let (_, screen, _) = poller.free();
    assert_eq!(screen.lines, vec!["DIST to3: 1.00m".to_string()]);
}

#[test]
fn bounded_run_stops_after_the_configured_round_count() {
    // Two rounds: the first relay attempt fails, so only the second round
    // counts as completed.
    let events = vec![
        RxEvent::Timeout,
        RxEvent::Timeout,
        RxEvent::Timeout,
        RxEvent::Timeout,
        RxEvent::Timeout,
        good(response(0, 0, 50), 0, 0),
    ];
    let session = session_with(events);
    let config = PollerConfig {
        round_delay_ms: 1000,
        max_rounds: Some(1),
    };
    let mut poller = Poller::with_config(session, MockScreen::default(), MockDelay::default(), config);

    poller.run().unwrap();

    assert_eq!(poller.completed_rounds(), 1);
    let (_, _, delay) = poller.free();
    // One inter-round sleep, between the incomplete round and the one
    // that completed.
    assert_eq!(delay.sleeps, vec![1000]);
}

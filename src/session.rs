//! The per-exchange ranging state machine
//!
//! One call to [`RangingSession::range`] runs a complete SS-TWR exchange:
//! send a poll, wait for the response or a timeout, validate, extract the
//! timestamps (or the relay leg's direct distance byte), and compute the
//! distance. Every radio-side failure mode short of a driver error is
//! absorbed locally and reported as [`RangeOutcome::NoResponse`]; the
//! session always completes and hands control back to the scheduler.

use core::fmt;
use core::num::Wrapping;

use crate::configs::{
    RadioConfig, POLL_TX_TO_RESP_RX_DELAY_UUS, RESP_RX_TIMEOUT_UUS, RX_ANTENNA_DELAY,
    TX_ANTENNA_DELAY,
};
use crate::frame::{self, Leg, LegKind, ResponseFrame, RX_BUFFER_LEN};
use crate::radio::{SystemStatus, Transceiver, TxMode};
use crate::time::{
    RawTimestamp, DEVICE_TIME_UNIT_SECONDS, RELAY_DISTANCE_LSB_METRES, SPEED_OF_LIGHT_M_PER_S,
};

/// An error that can occur while driving a ranging exchange
///
/// Only driver-level failures surface here. Protocol-level failures
/// (timeouts, bad frames) are not errors; they come back as
/// [`RangeOutcome::NoResponse`].
pub enum Error<R: Transceiver> {
    /// Error reported by the radio transceiver
    Radio(R::Error),
}

// Can't be derived without putting requirements on `R` itself.
impl<R> fmt::Debug for Error<R>
where
    R: Transceiver,
    R::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Radio(error) => write!(f, "Radio({:?})", error),
        }
    }
}

/// The result of one ranging attempt
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeOutcome {
    /// A validated response was received; the measured distance in metres
    Distance(f64),
    /// No usable response this attempt
    ///
    /// Covers receive timeout, receive error, template mismatch and
    /// oversize frames alike. The categories are deliberately not
    /// distinguished; the next scheduled attempt is the retry mechanism.
    NoResponse,
}

/// The measurement material extracted from a validated response
///
/// The distance derivation differs per leg kind, and the two paths use
/// independently calibrated constants. Selecting the path by variant keeps
/// a relay response from ever being fed through the timestamp formula.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Measurement {
    /// Four SS-TWR timestamps of an ordinary leg
    TwoWay {
        /// When the poll left the initiator (local time)
        poll_tx: RawTimestamp,
        /// When the response arrived at the initiator (local time)
        resp_rx: RawTimestamp,
        /// When the poll arrived at the responder (remote time)
        poll_rx: RawTimestamp,
        /// When the response left the responder (remote time)
        resp_tx: RawTimestamp,
    },
    /// The relay leg's pre-computed peer distance
    RelayReport {
        /// Distance in steps of [`RELAY_DISTANCE_LSB_METRES`]
        raw: u8,
    },
}

impl Measurement {
    /// Computes the distance in metres
    ///
    /// For the two-way variant this is the basic SS-TWR formula: half the
    /// difference of the two round-trip delays, converted to seconds and
    /// multiplied by the speed of light in air. No clock-drift compensation
    /// is applied.
    pub fn distance_metres(&self) -> f64 {
        match self {
            Measurement::TwoWay {
                poll_tx,
                resp_rx,
                poll_rx,
                resp_tx,
            } => {
                let rtd_init = resp_rx.wrapping_since(*poll_tx);
                let rtd_resp = resp_tx.wrapping_since(*poll_rx);
                let time_of_flight =
                    (rtd_init as i64 - rtd_resp as i64) as f64 / 2.0 * DEVICE_TIME_UNIT_SECONDS;
                time_of_flight * SPEED_OF_LIGHT_M_PER_S
            }
            Measurement::RelayReport { raw } => *raw as f64 * RELAY_DISTANCE_LSB_METRES,
        }
    }
}

/// The terminal outcome of one receive attempt
///
/// Exactly one of these is observed per attempt; the flags backing them are
/// mutually exclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TerminalStatus {
    FrameGood,
    Timeout,
    ReceiveError,
}

/// A ranging session over a radio transceiver
///
/// Owns the radio, the frame sequence number and the receive buffer for the
/// lifetime of the control loop. The sequence number is incremented after
/// every transmitted poll, successful or not, and wraps modulo 256; it only
/// provides frame variety and plays no role in validation.
pub struct RangingSession<R: Transceiver> {
    radio: R,
    sequence: Wrapping<u8>,
    rx_buffer: [u8; RX_BUFFER_LEN],
}

impl<R: Transceiver> RangingSession<R> {
    /// Creates a session over the given radio
    ///
    /// The radio must still be brought up with [`RangingSession::init`]
    /// before ranging.
    pub fn new(radio: R) -> Self {
        RangingSession {
            radio,
            sequence: Wrapping(0),
            rx_buffer: [0; RX_BUFFER_LEN],
        }
    }

    /// Configures the radio for ranging
    ///
    /// Applies the channel configuration, the antenna delay calibration,
    /// the poll-to-response receiver activation delay and the response
    /// timeout. An error here means radio bring-up failed; there is no
    /// recovery at this layer, and the caller is expected to halt and
    /// signal the failure.
    pub fn init(&mut self, config: &RadioConfig) -> Result<(), Error<R>> {
        self.radio.configure(config).map_err(Error::Radio)?;
        self.radio
            .set_antenna_delay(TX_ANTENNA_DELAY, RX_ANTENNA_DELAY)
            .map_err(Error::Radio)?;
        self.radio
            .set_rx_after_tx_delay(POLL_TX_TO_RESP_RX_DELAY_UUS)
            .map_err(Error::Radio)?;
        self.radio
            .set_rx_timeout(RESP_RX_TIMEOUT_UUS)
            .map_err(Error::Radio)?;
        Ok(())
    }

    /// Runs one complete ranging exchange for the given leg
    ///
    /// Blocks until the exchange terminates, which is bounded by the
    /// radio's configured receive timeout. Regardless of outcome the
    /// sequence number is advanced and the receiver is reset, so a stale
    /// partial receive cannot leak into the next exchange.
    pub fn range(&mut self, leg: Leg) -> Result<RangeOutcome, Error<R>> {
        let poll = frame::build_poll(self.sequence.0, leg);

        self.radio
            .clear_status(SystemStatus::TX_FRAME_SENT)
            .map_err(Error::Radio)?;
        self.radio.write_tx_data(&poll).map_err(Error::Radio)?;
        self.radio
            .start_tx(TxMode::ExpectResponse)
            .map_err(Error::Radio)?;

        let status = nb::block!(self.poll_terminal_status()).map_err(Error::Radio)?;

        self.sequence += Wrapping(1);

        let outcome = match status {
            TerminalStatus::FrameGood => self.handle_frame(leg)?,
            TerminalStatus::Timeout | TerminalStatus::ReceiveError => {
                self.radio
                    .clear_status(SystemStatus::RX_TIMEOUT | SystemStatus::RX_ERROR)
                    .map_err(Error::Radio)?;
                RangeOutcome::NoResponse
            }
        };

        self.radio.reset_receiver().map_err(Error::Radio)?;

        Ok(outcome)
    }

    /// The current frame sequence number
    pub fn sequence_number(&self) -> u8 {
        self.sequence.0
    }

    /// Releases the radio
    pub fn free(self) -> R {
        self.radio
    }

    /// Polls the status register for a terminal receive outcome
    ///
    /// The receive timeout configured during [`RangingSession::init`]
    /// guarantees this terminates.
    fn poll_terminal_status(&mut self) -> nb::Result<TerminalStatus, R::Error> {
        let status = self.radio.read_status().map_err(nb::Error::Other)?;

        if status.contains(SystemStatus::RX_FRAME_GOOD) {
            return Ok(TerminalStatus::FrameGood);
        }
        if status.contains(SystemStatus::RX_TIMEOUT) {
            return Ok(TerminalStatus::Timeout);
        }
        if status.contains(SystemStatus::RX_ERROR) {
            return Ok(TerminalStatus::ReceiveError);
        }

        Err(nb::Error::WouldBlock)
    }

    /// Reads and evaluates a received frame
    fn handle_frame(&mut self, leg: Leg) -> Result<RangeOutcome, Error<R>> {
        self.radio
            .clear_status(SystemStatus::RX_FRAME_GOOD)
            .map_err(Error::Radio)?;

        let frame_len = self.radio.read_frame_length().map_err(Error::Radio)? as usize;
        if frame_len > RX_BUFFER_LEN {
            // The length field can't be trusted. Drop the frame without
            // reading a single byte of it.
            return Ok(RangeOutcome::NoResponse);
        }
        self.radio
            .read_rx_data(&mut self.rx_buffer[..frame_len])
            .map_err(Error::Radio)?;

        let response = match ResponseFrame::parse(&self.rx_buffer) {
            Some(response) => response,
            None => return Ok(RangeOutcome::NoResponse),
        };

        let measurement = match leg.kind() {
            LegKind::TwoWay => {
                let poll_rx = response.poll_rx_timestamp();
                let resp_tx = response.resp_tx_timestamp();
                Measurement::TwoWay {
                    poll_tx: self.radio.read_tx_timestamp().map_err(Error::Radio)?,
                    resp_rx: self.radio.read_rx_timestamp().map_err(Error::Radio)?,
                    poll_rx,
                    resp_tx,
                }
            }
            LegKind::RelayReport => Measurement::RelayReport {
                raw: response.relay_distance_byte(),
            },
        };

        Ok(RangeOutcome::Distance(measurement.distance_metres()))
    }
}

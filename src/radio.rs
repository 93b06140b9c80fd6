//! The radio transceiver interface consumed by the ranging protocol
//!
//! The protocol code never touches radio registers directly. Everything it
//! needs from the hardware is captured by the [`Transceiver`] trait, which a
//! driver crate (or a test mock) implements. The contract deliberately stays
//! close to what DW1000-class transceivers expose: status flags polled from
//! a register, a frame info register for the received length, and latched
//! timestamps for the last transmitted and received frame.

use core::ops::{BitOr, BitOrAssign};

use crate::configs::RadioConfig;
use crate::time::RawTimestamp;

/// Status flags reported by the transceiver
///
/// Thin wrapper around the raw status register bits. Only the flags the
/// ranging exchange cares about are named; a driver is free to report
/// additional bits, they are ignored.
///
/// The three receive flags are mutually exclusive: one receive attempt
/// terminates with exactly one of [`RX_FRAME_GOOD`], [`RX_TIMEOUT`] or
/// [`RX_ERROR`] set.
///
/// [`RX_FRAME_GOOD`]: #associatedconstant.RX_FRAME_GOOD
/// [`RX_TIMEOUT`]: #associatedconstant.RX_TIMEOUT
/// [`RX_ERROR`]: #associatedconstant.RX_ERROR
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemStatus(u32);

impl SystemStatus {
    /// No flags set
    pub const EMPTY: SystemStatus = SystemStatus(0);

    /// A frame was transmitted
    pub const TX_FRAME_SENT: SystemStatus = SystemStatus(1 << 0);

    /// A frame was received with a good FCS
    pub const RX_FRAME_GOOD: SystemStatus = SystemStatus(1 << 1);

    /// The receive operation timed out
    pub const RX_TIMEOUT: SystemStatus = SystemStatus(1 << 2);

    /// The receive operation failed
    pub const RX_ERROR: SystemStatus = SystemStatus(1 << 3);

    /// Creates a status value from raw bits
    pub fn from_bits(bits: u32) -> Self {
        SystemStatus(bits)
    }

    /// Returns the raw bits
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Returns whether all flags in `other` are set in `self`
    pub fn contains(&self, other: SystemStatus) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns whether no flags are set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Sets the given flags
    pub fn insert(&mut self, other: SystemStatus) {
        self.0 |= other.0;
    }

    /// Clears the given flags
    pub fn remove(&mut self, other: SystemStatus) {
        self.0 &= !other.0;
    }
}

impl BitOr for SystemStatus {
    type Output = SystemStatus;

    fn bitor(self, rhs: SystemStatus) -> SystemStatus {
        SystemStatus(self.0 | rhs.0)
    }
}

impl BitOrAssign for SystemStatus {
    fn bitor_assign(&mut self, rhs: SystemStatus) {
        self.0 |= rhs.0;
    }
}

/// How a transmission is started
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxMode {
    /// Transmit immediately
    Immediate,
    /// Transmit immediately and enable the receiver once the frame is out
    ///
    /// The receiver is activated after the configured
    /// [`POLL_TX_TO_RESP_RX_DELAY_UUS`], with the configured receive
    /// timeout in effect.
    ///
    /// [`POLL_TX_TO_RESP_RX_DELAY_UUS`]: ../configs/constant.POLL_TX_TO_RESP_RX_DELAY_UUS.html
    ExpectResponse,
}

/// A UWB transceiver as seen by the ranging protocol
///
/// Implementations are expected to be blocking register-style drivers; none
/// of the operations suspend. The only long wait in the protocol is polling
/// [`read_status`] until a terminal receive flag shows up, which is bounded
/// by the hardware receive timeout configured through [`set_rx_timeout`].
///
/// [`read_status`]: #tymethod.read_status
/// [`set_rx_timeout`]: #tymethod.set_rx_timeout
pub trait Transceiver {
    /// Error type reported by the driver
    type Error;

    /// Applies the given channel and frame configuration
    fn configure(&mut self, config: &RadioConfig) -> Result<(), Self::Error>;

    /// Sets the TX and RX antenna delays, in device time units
    fn set_antenna_delay(&mut self, tx: u16, rx: u16) -> Result<(), Self::Error>;

    /// Sets the delay between frame transmission and receiver activation,
    /// in UWB microseconds
    fn set_rx_after_tx_delay(&mut self, delay_uus: u32) -> Result<(), Self::Error>;

    /// Sets the receive timeout, in UWB microseconds
    ///
    /// A timeout of zero disables the hardware timeout. The ranging session
    /// never does this; see the trait documentation.
    fn set_rx_timeout(&mut self, timeout_uus: u16) -> Result<(), Self::Error>;

    /// Writes frame data into the transmit buffer
    fn write_tx_data(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Starts the transmission of the previously written frame
    fn start_tx(&mut self, mode: TxMode) -> Result<(), Self::Error>;

    /// Reads the current status flags
    fn read_status(&mut self) -> Result<SystemStatus, Self::Error>;

    /// Clears the given status flags
    fn clear_status(&mut self, flags: SystemStatus) -> Result<(), Self::Error>;

    /// Reads the length of the received frame, in bytes
    fn read_frame_length(&mut self) -> Result<u32, Self::Error>;

    /// Copies received frame data into `buffer`
    ///
    /// The caller guarantees that `buffer` is no longer than the received
    /// frame.
    fn read_rx_data(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Reads the adjusted timestamp of the last transmitted frame
    fn read_tx_timestamp(&mut self) -> Result<RawTimestamp, Self::Error>;

    /// Reads the adjusted timestamp of the last received frame
    fn read_rx_timestamp(&mut self) -> Result<RawTimestamp, Self::Error>;

    /// Resets the receiver, discarding any partial receive state
    fn reset_receiver(&mut self) -> Result<(), Self::Error>;
}

/// A bounded-width text surface for measurement output
///
/// The reference hardware is a 16-character LCD line; anything wider may be
/// truncated by the implementation. Output is best-effort and infallible.
pub trait Screen {
    /// Displays the given text, replacing the previous content
    fn show(&mut self, text: &str);
}

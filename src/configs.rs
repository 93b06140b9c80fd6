//! Radio configuration for the ranging exchange
//!
//! This module houses the configuration struct handed to
//! [`Transceiver::configure`] during bring-up, along with the calibration
//! and timing constants of the reference deployment.
//!
//! [`Transceiver::configure`]: ../radio/trait.Transceiver.html#tymethod.configure

/// Default TX antenna delay, calibrated for 64 MHz PRF
pub const TX_ANTENNA_DELAY: u16 = 16436;

/// Default RX antenna delay, calibrated for 64 MHz PRF
pub const RX_ANTENNA_DELAY: u16 = 16436;

/// Delay between poll transmission and receiver activation, in UWB microseconds
pub const POLL_TX_TO_RESP_RX_DELAY_UUS: u32 = 140;

/// Receive timeout while awaiting a response, in UWB microseconds
///
/// This timeout must always be in effect. Without it, a lost response would
/// leave the control loop blocked forever; the radio's hardware timeout is
/// the only way a wait on a terminal status can end.
pub const RESP_RX_TIMEOUT_UUS: u16 = 210;

/// Delay between ranging rounds, in milliseconds
pub const RANGING_INTERVAL_MS: u16 = 1000;

/// Radio configuration for both transmit and receive
///
/// The default configuration is the EVK1000's mode 4, which the reference
/// anchors are configured to match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RadioConfig {
    /// The UWB channel to operate on
    pub channel: UwbChannel,
    /// The pulse repetition frequency
    pub pulse_repetition_frequency: PulseRepetitionFrequency,
    /// The length of the transmitted preamble
    pub preamble_length: PreambleLength,
    /// The preamble acquisition chunk size, used in RX only
    pub preamble_acquisition_chunk: PacSize,
    /// Preamble code used for transmission
    pub tx_preamble_code: u8,
    /// Preamble code expected on reception
    pub rx_preamble_code: u8,
    /// The SFD sequence in use
    pub sfd_sequence: SfdSequence,
    /// The data rate of the exchange
    pub bitrate: BitRate,
    /// The PHY header mode
    pub phy_header_mode: PhyHeaderMode,
    /// SFD detection timeout, in preamble symbols
    ///
    /// Computed as preamble length + 1 + SFD length - PAC size.
    pub sfd_timeout: u16,
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig {
            channel: UwbChannel::Channel2,
            pulse_repetition_frequency: PulseRepetitionFrequency::Mhz64,
            preamble_length: PreambleLength::Symbols128,
            preamble_acquisition_chunk: PreambleLength::Symbols128.recommended_pac_size(),
            tx_preamble_code: 9,
            rx_preamble_code: 9,
            sfd_sequence: SfdSequence::Ieee,
            bitrate: BitRate::Kbps6800,
            phy_header_mode: PhyHeaderMode::Standard,
            sfd_timeout: 129 + 8 - 8,
        }
    }
}

/// All the available UWB channels
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UwbChannel {
    /// Channel 1, centered at 3494.4 MHz
    Channel1 = 1,
    /// Channel 2, centered at 3993.6 MHz
    Channel2 = 2,
    /// Channel 3, centered at 4492.8 MHz
    Channel3 = 3,
    /// Channel 4, centered at 3993.6 MHz (wide)
    Channel4 = 4,
    /// Channel 5, centered at 6489.6 MHz
    Channel5 = 5,
    /// Channel 7, centered at 6489.6 MHz (wide)
    Channel7 = 7,
}

/// The pulse repetition frequency
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseRepetitionFrequency {
    /// 16 megahertz
    Mhz16 = 0b01,
    /// 64 megahertz
    Mhz64 = 0b10,
}

/// The length of the transmitted preamble
///
/// Longer preambles improve reception quality and thus range, at the cost of
/// longer transmissions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PreambleLength {
    /// 64 symbols of preamble, only supported at 6.8 Mbps
    Symbols64 = 0b0100,
    /// 128 symbols of preamble
    Symbols128 = 0b0101,
    /// 256 symbols of preamble
    Symbols256 = 0b0110,
    /// 512 symbols of preamble
    Symbols512 = 0b0111,
    /// 1024 symbols of preamble
    Symbols1024 = 0b1000,
    /// 1536 symbols of preamble, only supported at 110 kbps
    Symbols1536 = 0b1001,
    /// 2048 symbols of preamble, only supported at 110 kbps
    Symbols2048 = 0b1010,
    /// 4096 symbols of preamble, only supported at 110 kbps
    Symbols4096 = 0b1100,
}

impl PreambleLength {
    /// Gets the recommended PAC size for this preamble length
    pub fn recommended_pac_size(&self) -> PacSize {
        // Values taken from the transceiver user manual.
        match self {
            PreambleLength::Symbols64 | PreambleLength::Symbols128 => PacSize::Pac8,
            PreambleLength::Symbols256 | PreambleLength::Symbols512 => PacSize::Pac16,
            PreambleLength::Symbols1024 => PacSize::Pac32,
            PreambleLength::Symbols1536
            | PreambleLength::Symbols2048
            | PreambleLength::Symbols4096 => PacSize::Pac64,
        }
    }
}

/// The preamble acquisition chunk size, used in RX only
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacSize {
    /// 8-symbol chunks
    Pac8 = 8,
    /// 16-symbol chunks
    Pac16 = 16,
    /// 32-symbol chunks
    Pac32 = 32,
    /// 64-symbol chunks
    Pac64 = 64,
}

/// The SFD sequence to transmit and scan for
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SfdSequence {
    /// The standard sequence defined by the IEEE 802.15.4 standard
    Ieee,
    /// The proprietary sequence defined by the chip vendor
    Proprietary,
}

/// The bitrate at which frames are exchanged
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitRate {
    /// 110 kilobits per second
    Kbps110 = 0b00,
    /// 850 kilobits per second
    Kbps850 = 0b01,
    /// 6.8 megabits per second
    Kbps6800 = 0b10,
}

/// The PHY header mode
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyHeaderMode {
    /// Standard frames, up to 127 bytes
    Standard = 0b00,
    /// Extended frames, up to 1023 bytes (proprietary)
    Extended = 0b11,
}

//! Time-related types based on the radio's device time

use serde::{Deserialize, Serialize};

/// Length of one device time unit in seconds
///
/// The radio counts time in units of 1 / (128 * 499.2 MHz), which comes out
/// to roughly 15.65 picoseconds per tick.
pub const DEVICE_TIME_UNIT_SECONDS: f64 = 1.0 / (128.0 * 499.2e6);

/// Speed of light in air, in metres per second
pub const SPEED_OF_LIGHT_M_PER_S: f64 = 299_702_547.0;

/// Scale of the relay leg's direct distance byte, in metres per LSB
///
/// The relay response carries a pre-computed peer-to-peer distance encoded
/// as a single byte in steps of 2 cm, independently calibrated from the
/// timestamp-derived path.
pub const RELAY_DISTANCE_LSB_METRES: f64 = 0.02;

/// A raw 32-bit device timestamp
///
/// The radio's timestamp registers are wider, but ranging only uses the low
/// 32 bits. Timestamps wrap at 2^32; use [`RawTimestamp::wrapping_since`]
/// to compute intervals across the wrap boundary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(C)]
pub struct RawTimestamp(u32);

impl RawTimestamp {
    /// Creates a timestamp from a raw register value
    pub fn new(value: u32) -> Self {
        RawTimestamp(value)
    }

    /// Returns the raw 32-bit value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Decodes a timestamp from its little-endian wire representation
    ///
    /// This is the format used for the timestamp fields embedded in response
    /// frames: least significant byte first.
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        RawTimestamp(u32::from_le_bytes(bytes))
    }

    /// Encodes the timestamp into its little-endian wire representation
    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Returns the interval from `earlier` to `self` in device time units
    ///
    /// The subtraction is wraparound-tolerant: the result is correct modulo
    /// 2^32, so it holds as long as the true elapsed interval is well under
    /// half the wrap period. The microsecond-scale delays used in a ranging
    /// exchange stay far below that.
    pub fn wrapping_since(&self, earlier: RawTimestamp) -> i32 {
        self.0.wrapping_sub(earlier.0) as i32
    }
}

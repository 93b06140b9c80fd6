//! The two frame shapes of the ranging exchange
//!
//! Both frames share a 10-byte header: frame control (2 bytes), sequence
//! number (1 byte), PAN id (2 bytes), addressing (4 bytes) and a function
//! code (1 byte). The poll carries a leg identifier after that; the
//! response carries the responder's poll-RX and response-TX timestamps,
//! plus the relay leg's direct distance byte.
//!
//! The byte layouts are a wire contract shared with the responder firmware
//! and must be reproduced exactly, which is why the templates are spelled
//! out rather than generated through a MAC frame library.

use crate::time::RawTimestamp;

/// Total length of a poll frame
pub const POLL_LEN: usize = 13;

/// Total length of a response frame
pub const RESPONSE_LEN: usize = 27;

/// Size of the receive buffer
///
/// Sized for the longest frame the initiator is supposed to handle, with
/// headroom. Frames reporting a longer length are dropped unread.
pub const RX_BUFFER_LEN: usize = 30;

/// Length of the common header, up to and including the function code
pub const COMMON_LEN: usize = 10;

/// Offset of the sequence number within any frame
pub const SEQUENCE_IDX: usize = 2;

/// Offset of the leg identifier within a poll frame
const POLL_LEG_IDX: usize = 10;

/// Offset of the poll-RX timestamp within a response frame
const POLL_RX_TS_IDX: usize = 10;

/// Offset of the response-TX timestamp within a response frame
const RESP_TX_TS_IDX: usize = 14;

/// Offset of the relay leg's direct distance byte within a response frame
const RELAY_DISTANCE_IDX: usize = 20;

/// Poll code signalling the anchor-to-anchor relay hop
const RELAY_POLL_CODE: u8 = 7;

/// Template for outgoing poll frames
pub const POLL_TEMPLATE: [u8; POLL_LEN] = [
    0x41, 0x88, 0, 0xCA, 0xDE, b'W', b'A', b'V', b'E', 0xE0, 0, 0, 0,
];

/// Template an inbound response frame is validated against
pub const RESPONSE_TEMPLATE: [u8; RESPONSE_LEN] = [
    0x41, 0x88, 0, 0xCA, 0xDE, b'V', b'E', b'W', b'A', 0xE1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0,
];

/// One ranging pair in the fixed rotation
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Leg {
    /// Initiator to anchor 1
    Anchor1,
    /// Initiator to anchor 2
    Anchor2,
    /// Anchor 1 to anchor 2, reported back through anchor 1
    Relay,
}

/// How a leg derives its distance
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LegKind {
    /// Ordinary SS-TWR: distance is computed from four timestamps
    TwoWay,
    /// The response carries a pre-computed distance byte
    RelayReport,
}

impl Leg {
    /// The fixed polling order executed each round
    pub const ROTATION: [Leg; 3] = [Leg::Anchor1, Leg::Anchor2, Leg::Relay];

    /// The leg identifier transmitted in the poll frame
    ///
    /// The relay leg uses a dedicated code to signal the anchor-to-anchor
    /// hop, not its position in the rotation.
    pub fn poll_code(&self) -> u8 {
        match self {
            Leg::Anchor1 => 1,
            Leg::Anchor2 => 2,
            Leg::Relay => RELAY_POLL_CODE,
        }
    }

    /// The leg number used on the display
    pub fn display_number(&self) -> u8 {
        match self {
            Leg::Anchor1 => 1,
            Leg::Anchor2 => 2,
            Leg::Relay => 3,
        }
    }

    /// Index of this leg's sample history
    pub fn index(&self) -> usize {
        match self {
            Leg::Anchor1 => 0,
            Leg::Anchor2 => 1,
            Leg::Relay => 2,
        }
    }

    /// How this leg's distance is derived
    pub fn kind(&self) -> LegKind {
        match self {
            Leg::Anchor1 | Leg::Anchor2 => LegKind::TwoWay,
            Leg::Relay => LegKind::RelayReport,
        }
    }
}

/// Builds a poll frame for the given leg
pub fn build_poll(sequence: u8, leg: Leg) -> [u8; POLL_LEN] {
    let mut frame = POLL_TEMPLATE;
    frame[SEQUENCE_IDX] = sequence;
    frame[POLL_LEG_IDX] = leg.poll_code();
    frame
}

/// Checks a received frame against an expected template
///
/// Compares the common header of both frames with the sequence number byte
/// masked to zero, since the sequence number is the one volatile field.
/// Returns `true` only on exact equality of the remaining 9 bytes; there is
/// no partial-match tolerance. Input shorter than the common header never
/// matches.
///
/// This predicate is the sole admission gate before any field of an inbound
/// frame is trusted.
pub fn matches_template(received: &[u8], template: &[u8]) -> bool {
    if received.len() < COMMON_LEN || template.len() < COMMON_LEN {
        return false;
    }

    let mut header = [0; COMMON_LEN];
    header.copy_from_slice(&received[..COMMON_LEN]);
    header[SEQUENCE_IDX] = 0;

    let mut expected = [0; COMMON_LEN];
    expected.copy_from_slice(&template[..COMMON_LEN]);
    expected[SEQUENCE_IDX] = 0;

    header == expected
}

/// A validated response frame in the receive buffer
///
/// Borrows the full receive buffer rather than the received length, so the
/// fixed-offset field reads are in bounds by construction. Bytes beyond the
/// received frame are whatever the previous exchange left behind; they are
/// only ever read if the responder sent a frame short enough to not cover
/// them, which a conforming responder does not.
#[derive(Debug)]
pub struct ResponseFrame<'a> {
    buffer: &'a [u8; RX_BUFFER_LEN],
}

impl<'a> ResponseFrame<'a> {
    /// Validates the receive buffer against the response template
    ///
    /// Returns `None` if the header does not match. A `None` is not an
    /// error: stray traffic on a shared radio channel is expected, and
    /// non-matching frames are silently discarded.
    pub fn parse(buffer: &'a [u8; RX_BUFFER_LEN]) -> Option<Self> {
        if matches_template(buffer, &RESPONSE_TEMPLATE) {
            Some(ResponseFrame { buffer })
        } else {
            None
        }
    }

    /// The responder's poll reception timestamp
    pub fn poll_rx_timestamp(&self) -> RawTimestamp {
        self.timestamp_at(POLL_RX_TS_IDX)
    }

    /// The responder's response transmission timestamp
    pub fn resp_tx_timestamp(&self) -> RawTimestamp {
        self.timestamp_at(RESP_TX_TS_IDX)
    }

    /// The relay leg's direct distance byte
    pub fn relay_distance_byte(&self) -> u8 {
        self.buffer[RELAY_DISTANCE_IDX]
    }

    fn timestamp_at(&self, idx: usize) -> RawTimestamp {
        let mut field = [0; 4];
        field.copy_from_slice(&self.buffer[idx..idx + 4]);
        RawTimestamp::from_le_bytes(field)
    }
}

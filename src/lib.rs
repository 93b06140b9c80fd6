//! SS-TWR initiator for DW1000-class UWB transceivers
//!
//! This crate implements the initiator side of a single-sided two-way
//! ranging (SS-TWR) exchange: it sends a poll frame, waits for the
//! responder's reply carrying the remote timestamps, and turns the
//! round-trip timing into a time of flight and a distance in metres. A
//! cyclic [`Poller`] extends the single exchange to a fixed rotation of
//! anchors, including a relay leg on which an anchor reports a
//! pre-computed peer-to-peer distance instead of raw timestamps.
//!
//! The radio itself is not part of this crate. Everything the protocol
//! needs from the hardware is expressed by the [`Transceiver`] trait, and
//! measurement output goes to a [`Screen`]; wire up a driver and a display
//! and the loop runs forever:
//!
//! ``` ignore
//! let mut session = RangingSession::new(radio);
//! session.init(&RadioConfig::default())?;
//!
//! let mut poller = Poller::new(session, screen, delay);
//! poller.run()?;
//! ```
//!
//! An `Err` from [`RangingSession::init`] means radio bring-up failed;
//! there is no recovery, and the caller should halt and signal the failure.
//! Once running, protocol-level failures (timeouts, rejected frames) are
//! absorbed silently and the next scheduled exchange doubles as the retry.

#![no_std]
#![deny(missing_docs)]

pub mod configs;
pub mod frame;
pub mod history;
pub mod poller;
pub mod radio;
pub mod session;
pub mod time;

pub use configs::RadioConfig;
pub use frame::{Leg, LegKind};
pub use history::SampleHistory;
pub use poller::{Poller, PollerConfig};
pub use radio::{Screen, SystemStatus, Transceiver, TxMode};
pub use session::{Error, Measurement, RangeOutcome, RangingSession};
pub use time::RawTimestamp;

//! Cyclic multi-anchor polling
//!
//! The poller runs the ranging session across the fixed leg rotation, over
//! and over, with a fixed delay between rounds. There is no jitter and no
//! adaptive scheduling; on the reference hardware the loop only ever ends
//! with a power cycle.

use core::fmt::Write as _;

use embedded_hal::blocking::delay::DelayMs;
use heapless::String;

use crate::configs::RANGING_INTERVAL_MS;
use crate::frame::{Leg, LegKind};
use crate::history::SampleHistory;
use crate::radio::{Screen, Transceiver};
use crate::session::{Error, RangeOutcome, RangingSession};

/// Configuration of the polling loop
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollerConfig {
    /// Delay between full rounds, in milliseconds
    pub round_delay_ms: u16,
    /// Stop after this many completed rounds
    ///
    /// A round counts as completed when its relay leg succeeds. `None`
    /// polls forever, which is the primary mode of operation; the bound
    /// exists for measurement campaigns of a known size.
    pub max_rounds: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig {
            round_delay_ms: RANGING_INTERVAL_MS,
            max_rounds: None,
        }
    }
}

/// The outer polling loop over a fixed anchor rotation
///
/// Owns the ranging session, the output surface, the delay provider and the
/// per-leg sample histories. All mutable protocol state lives here or in
/// the session; nothing is shared, so the loop is single-threaded by
/// construction.
pub struct Poller<R, S, D>
where
    R: Transceiver,
    S: Screen,
    D: DelayMs<u16>,
{
    session: RangingSession<R>,
    screen: S,
    delay: D,
    config: PollerConfig,
    histories: [SampleHistory; 3],
    completed_rounds: u32,
}

impl<R, S, D> Poller<R, S, D>
where
    R: Transceiver,
    S: Screen,
    D: DelayMs<u16>,
{
    /// Creates a poller with the default configuration
    pub fn new(session: RangingSession<R>, screen: S, delay: D) -> Self {
        Self::with_config(session, screen, delay, PollerConfig::default())
    }

    /// Creates a poller with the given configuration
    pub fn with_config(
        session: RangingSession<R>,
        screen: S,
        delay: D,
        config: PollerConfig,
    ) -> Self {
        Poller {
            session,
            screen,
            delay,
            config,
            histories: [SampleHistory::new(), SampleHistory::new(), SampleHistory::new()],
            completed_rounds: 0,
        }
    }

    /// Runs the polling loop
    ///
    /// Without a round bound this never returns `Ok`; it either polls
    /// forever or surfaces a driver error. Protocol failures (timeouts,
    /// rejected frames) never end the loop.
    pub fn run(&mut self) -> Result<(), Error<R>> {
        loop {
            self.run_round()?;

            if let Some(max_rounds) = self.config.max_rounds {
                if self.completed_rounds >= max_rounds {
                    return Ok(());
                }
            }

            self.delay.delay_ms(self.config.round_delay_ms);
        }
    }

    /// Executes one full rotation over all legs
    ///
    /// Successful exchanges are recorded in the leg's history and shown on
    /// the screen; failed ones leave both untouched. A successful relay
    /// exchange marks the round as completed.
    pub fn run_round(&mut self) -> Result<(), Error<R>> {
        for &leg in Leg::ROTATION.iter() {
            match self.session.range(leg)? {
                RangeOutcome::Distance(distance) => {
                    if leg.kind() == LegKind::RelayReport {
                        self.completed_rounds += 1;
                    }
                    self.histories[leg.index()].record(distance);
                    self.show_distance(leg, distance);
                }
                RangeOutcome::NoResponse => {}
            }
        }

        Ok(())
    }

    /// The sample history of the given leg
    pub fn history(&self, leg: Leg) -> &SampleHistory {
        &self.histories[leg.index()]
    }

    /// Number of completed rounds, counted by relay leg successes
    pub fn completed_rounds(&self) -> u32 {
        self.completed_rounds
    }

    /// Releases the session, screen and delay provider
    pub fn free(self) -> (RangingSession<R>, S, D) {
        (self.session, self.screen, self.delay)
    }

    fn show_distance(&mut self, leg: Leg, distance: f64) {
        // Matches the width of the reference LCD line. If the distance is
        // ever wide enough to overflow, the line is truncated.
        let mut line: String<16> = String::new();
        let _ = write!(line, "DIST to{}: {:.2}m", leg.display_number(), distance);
        self.screen.show(&line);
    }
}

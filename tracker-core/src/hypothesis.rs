//! # Note Hypothesis
//!
//! A single acceptance-testing agent. Estimates are offered to it one at a
//! time and it decides whether each one is consistent with a single note in
//! progress. Once it has accepted enough consistent evidence the hypothesis
//! becomes *satisfied*, and once the evidence stops arriving it *expires*.
//!
//! ```text
//! New -> Provisional -> Satisfied -> Expired
//!                   \-> Rejected
//! ```
//!
//! Rejected and Expired are terminal: no further estimates are accepted.

use crate::note::{Estimate, Note};
use crate::tuning::cents_between;
use std::time::Duration;

/// Default tolerated gap between consecutive accepted estimates.
pub const DEFAULT_SLACK: Duration = Duration::from_millis(40);

/// Maximum interval, in cents, from the most recently accepted estimate.
const MAX_CENTS_FROM_LAST: f64 = 60.0;
/// Maximum interval, in cents, from the running mean frequency.
const MAX_CENTS_FROM_MEAN: f64 = 80.0;
/// Length cap used when the mean confidence is not positive.
const UNCONFIDENT_LENGTH_REQUIRED: usize = 10000;

/// Lifecycle state of a [`NoteHypothesis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Just constructed, will provisionally accept any estimate
    New,
    /// Accepted at least one estimate, but not enough evidence to satisfy
    Provisional,
    /// Could not find enough consistency in offered estimates
    Rejected,
    /// Have accepted enough consistent estimates to satisfy hypothesis
    Satisfied,
    /// Have been satisfied, but evidence has now changed: we're done
    Expired,
}

impl State {
    /// Returns true for the states from which there is no way back.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Rejected | State::Expired)
    }

    /// Returns true once the hypothesis has proven itself.
    pub fn is_satisfied(self) -> bool {
        matches!(self, State::Satisfied | State::Expired)
    }
}

/// A candidate single-note track under test.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteHypothesis {
    state: State,
    pending: Vec<Estimate>,
    slack: Duration,
}

impl Default for NoteHypothesis {
    fn default() -> Self {
        NoteHypothesis::new(DEFAULT_SLACK)
    }
}

impl NoteHypothesis {
    /// Constructs an empty hypothesis in the `New` state.
    ///
    /// `slack` is how long the hypothesis tolerates a gap between accepted
    /// estimates before it is rejected (or, once satisfied, expires).
    pub fn new(slack: Duration) -> Self {
        NoteHypothesis {
            state: State::New,
            pending: Vec::new(),
            slack,
        }
    }

    /// Tests the estimate against this hypothesis and updates the state.
    ///
    /// Returns true if the estimate was accepted. A false return may leave
    /// the state untouched (the estimate just did not fit) or move it to
    /// `Rejected`/`Expired`; inspect [`state`](Self::state) to tell which.
    pub fn accept(&mut self, estimate: Estimate) -> bool {
        let accepted = match self.state {
            State::New => {
                self.state = State::Provisional;
                true
            }
            State::Provisional => {
                if self.is_out_of_date_for(&estimate) {
                    self.state = State::Rejected;
                    false
                } else {
                    self.is_within_tolerance(&estimate)
                }
            }
            State::Satisfied => {
                if self.is_out_of_date_for(&estimate) {
                    self.state = State::Expired;
                    false
                } else {
                    self.is_within_tolerance(&estimate)
                }
            }
            State::Rejected | State::Expired => false,
        };

        if accepted {
            self.pending.push(estimate);
            if self.state == State::Provisional && self.is_satisfied() {
                self.state = State::Satisfied;
            }
        }

        accepted
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn slack(&self) -> Duration {
        self.slack
    }

    /// The accepted estimates, but only once the hypothesis has been
    /// satisfied. Before that, an empty slice.
    pub fn accepted_estimates(&self) -> &[Estimate] {
        if self.state.is_satisfied() {
            &self.pending
        } else {
            &[]
        }
    }

    /// Time of the first accepted estimate, if any.
    pub fn start_time(&self) -> Option<Duration> {
        self.pending.first().map(|e| e.timestamp)
    }

    /// Mean frequency of every accepted estimate, or 0 if there are none.
    pub fn mean_frequency(&self) -> f64 {
        if self.pending.is_empty() {
            return 0.0;
        }
        self.pending.iter().map(|e| e.frequency).sum::<f64>() / self.pending.len() as f64
    }

    /// A single note roughly matching this hypothesis. Zeroed unless the
    /// hypothesis has been satisfied.
    pub fn averaged_note(&self) -> Note {
        if !self.state.is_satisfied() {
            return Note::default();
        }
        match (self.pending.first(), self.pending.last()) {
            (Some(first), Some(last)) => Note::new(
                self.mean_frequency(),
                first.timestamp,
                last.timestamp.saturating_sub(first.timestamp),
            ),
            _ => Note::default(),
        }
    }

    fn is_within_tolerance(&self, estimate: &Estimate) -> bool {
        let Some(last) = self.pending.last() else {
            return true;
        };

        // Close to the previous estimate...
        if !rounds_within(
            cents_between(estimate.frequency, last.frequency),
            MAX_CENTS_FROM_LAST,
        ) {
            return false;
        }

        // ...and a little less close to the running mean.
        rounds_within(
            cents_between(estimate.frequency, self.mean_frequency()),
            MAX_CENTS_FROM_MEAN,
        )
    }

    fn is_out_of_date_for(&self, estimate: &Estimate) -> bool {
        match self.pending.last() {
            Some(last) => estimate.timestamp.saturating_sub(last.timestamp) > self.slack,
            None => false,
        }
    }

    fn is_satisfied(&self) -> bool {
        if self.pending.is_empty() {
            return false;
        }

        let mean_confidence =
            self.pending.iter().map(|e| e.confidence).sum::<f64>() / self.pending.len() as f64;

        let length_required = if mean_confidence > 0.0 {
            (2.0 / mean_confidence + 0.5) as usize
        } else {
            UNCONFIDENT_LENGTH_REQUIRED
        };

        self.pending.len() > length_required
    }
}

/// True if `cents`, rounded to the nearest whole cent (halves to even), lies
/// within `[-bound, bound]`. NaN is never within.
fn rounds_within(cents: f64, bound: f64) -> bool {
    (-bound..=bound).contains(&cents.round_ties_even())
}

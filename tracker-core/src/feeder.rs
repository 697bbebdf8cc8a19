//! # Agent Feeder
//!
//! Takes a series of estimates (one at a time) and feeds them to a set of
//! note hypotheses, creating a new candidate hypothesis for each
//! observation nobody else claims and testing every observation against
//! the existing hypotheses.
//!
//! One satisfied hypothesis is "current" at any moment: the earliest
//! contemporary hypothesis to have become satisfied. A live current
//! hypothesis is never displaced by a candidate that satisfies later; the
//! candidate only takes over once the current one has expired. The series
//! of finished hypotheses is available from
//! [`accepted_hypotheses`](AgentFeeder::accepted_hypotheses), which is not
//! complete until [`finish`](AgentFeeder::finish) has been called.

use crate::hypothesis::{NoteHypothesis, State};
use crate::note::Estimate;
use log::{debug, trace};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AgentFeeder {
    slack: Duration,
    current: Option<NoteHypothesis>,
    candidates: Vec<NoteHypothesis>,
    accepted: Vec<NoteHypothesis>,
}

impl Default for AgentFeeder {
    fn default() -> Self {
        AgentFeeder::new(crate::hypothesis::DEFAULT_SLACK)
    }
}

impl AgentFeeder {
    /// Creates an empty feeder whose hypotheses tolerate gaps of `slack`.
    pub fn new(slack: Duration) -> Self {
        AgentFeeder {
            slack,
            current: None,
            candidates: Vec::new(),
            accepted: Vec::new(),
        }
    }

    /// Provides a new observation.
    pub fn feed(&mut self, estimate: Estimate) {
        trace!(
            "feed {:.2} Hz at {:?} (confidence {:.3})",
            estimate.frequency, estimate.timestamp, estimate.confidence
        );

        // The current hypothesis has first claim on every estimate
        if let Some(current) = self.current.as_mut() {
            if current.accept(estimate) {
                return;
            }
            match current.state() {
                State::Expired => {
                    if let Some(expired) = self.current.take() {
                        self.finalize(expired);
                    }
                }
                State::Rejected => {
                    debug!("discarding rejected current hypothesis");
                    self.current = None;
                }
                _ => {}
            }
        }

        // Each observation belongs to at most one hypothesis: stop offering
        // it as soon as a candidate swallows it.
        let mut swallowed = false;
        let mut promoted = None;
        for (index, candidate) in self.candidates.iter_mut().enumerate() {
            if candidate.accept(estimate) {
                swallowed = true;
                if candidate.state() == State::Satisfied && self.current.is_none() {
                    promoted = Some(index);
                }
                break;
            }
        }

        if let Some(index) = promoted {
            let hypothesis = self.candidates.remove(index);
            debug!(
                "promoting candidate started at {:?} to current ({:.2} Hz)",
                hypothesis.start_time(),
                hypothesis.mean_frequency()
            );
            self.current = Some(hypothesis);
        }

        if !swallowed {
            let mut hypothesis = NoteHypothesis::new(self.slack);
            // A new hypothesis always accepts its first estimate
            hypothesis.accept(estimate);
            self.candidates.push(hypothesis);
        }

        self.reap();
    }

    /// Flushes the current hypothesis at the end of the stream.
    ///
    /// Only a still-satisfied current hypothesis is reported here; expired
    /// ones were reported when they expired. Calling this twice does not
    /// duplicate output.
    pub fn finish(&mut self) {
        if self
            .current
            .as_ref()
            .is_some_and(|current| current.state() == State::Satisfied)
        {
            if let Some(current) = self.current.take() {
                self.finalize(current);
            }
        }
    }

    /// Finished hypotheses, in the order they were finalized.
    pub fn accepted_hypotheses(&self) -> &[NoteHypothesis] {
        &self.accepted
    }

    /// The hypothesis presently considered to be the note in progress.
    pub fn current(&self) -> Option<&NoteHypothesis> {
        self.current.as_ref()
    }

    /// Competing hypotheses that are not current, in creation order.
    pub fn candidates(&self) -> &[NoteHypothesis] {
        &self.candidates
    }

    pub fn slack(&self) -> Duration {
        self.slack
    }

    fn finalize(&mut self, hypothesis: NoteHypothesis) {
        debug!(
            "finalizing hypothesis: {} estimates from {:?}, {:.2} Hz",
            hypothesis.accepted_estimates().len(),
            hypothesis.start_time(),
            hypothesis.mean_frequency()
        );
        self.accepted.push(hypothesis);
    }

    fn reap(&mut self) {
        let before = self.candidates.len();
        self.candidates.retain(|h| !h.state().is_terminal());
        let reaped = before - self.candidates.len();
        if reaped > 0 {
            trace!("reaped {} dead candidates, {} remain", reaped, self.candidates.len());
        }
    }
}

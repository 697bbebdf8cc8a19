//! End-to-end behaviour of the feeder over short, hand-built estimate
//! streams: separate, overlapping and contained notes.

use std::time::Duration;
use tracker_core::{AgentFeeder, Estimate, NoteHypothesis, State};

const LOW: f64 = 500.0;
const HIGH: f64 = 700.0;
const DEFAULT_SLACK: Duration = Duration::from_millis(40);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn est(frequency: f64, at_ms: u64) -> Estimate {
    Estimate::new(frequency, ms(at_ms), 1.0)
}

fn run(estimates: &[Estimate]) -> Vec<NoteHypothesis> {
    let mut feeder = AgentFeeder::new(DEFAULT_SLACK);
    for e in estimates {
        feeder.feed(*e);
    }
    feeder.finish();
    feeder.accepted_hypotheses().to_vec()
}

#[test]
fn empty_stream() {
    assert!(run(&[]).is_empty());
}

#[test]
fn single_steady_tone() {
    let estimates: Vec<_> = (0..4).map(|i| est(LOW, i * 10)).collect();
    let accepted = run(&estimates);
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].accepted_estimates(), estimates.as_slice());
    assert_eq!(accepted[0].state(), State::Satisfied);
}

#[test]
fn pair_separate() {
    let estimates = [
        est(LOW, 0),
        est(LOW, 10),
        est(LOW, 20),
        est(LOW, 30),
        est(HIGH, 2000),
        est(HIGH, 2010),
        est(HIGH, 2020),
        est(HIGH, 2030),
    ];
    let accepted = run(&estimates);
    assert_eq!(accepted.len(), 2);
    assert_eq!(accepted[0].start_time(), Some(ms(0)));
    assert_eq!(accepted[0].state(), State::Expired);
    assert_eq!(accepted[1].start_time(), Some(ms(2000)));
    assert_eq!(accepted[1].accepted_estimates().len(), 4);
}

#[test]
fn pair_overlapping() {
    // eeee
    //   fffffff
    // with fffffff stopping before eeee has expired: eeee is still the
    // current hypothesis when fffffff ends, so only eeee is reported.
    let estimates = [
        est(LOW, 0),
        est(LOW, 10),
        est(LOW, 20),
        est(HIGH, 20),
        est(LOW, 30),
        est(HIGH, 30),
        est(HIGH, 40),
        est(HIGH, 41),
        est(HIGH, 42),
        est(HIGH, 43),
        est(HIGH, 44),
    ];
    let accepted = run(&estimates);
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].start_time(), Some(ms(0)));
    assert_eq!(accepted[0].accepted_estimates().len(), 4);
    assert!(accepted[0]
        .accepted_estimates()
        .iter()
        .all(|e| e.frequency == LOW));
}

#[test]
fn pair_overlapping_long() {
    // eeee
    //   fffffff
    // with fffffff continuing until after eeee has expired: eeee is
    // reported at its expiry and fffffff takes over, keeping the
    // estimates it collected while eeee was current.
    let estimates = [
        est(LOW, 0),
        est(LOW, 10),
        est(LOW, 20),
        est(HIGH, 20),
        est(LOW, 30),
        est(HIGH, 30),
        est(HIGH, 40),
        est(HIGH, 50),
        est(HIGH, 60),
        est(HIGH, 70),
        est(HIGH, 80),
    ];
    let accepted = run(&estimates);
    assert_eq!(accepted.len(), 2);

    assert_eq!(accepted[0].start_time(), Some(ms(0)));
    assert_eq!(accepted[0].accepted_estimates().len(), 4);
    assert_eq!(accepted[0].state(), State::Expired);

    assert_eq!(accepted[1].start_time(), Some(ms(20)));
    assert_eq!(accepted[1].accepted_estimates().len(), 7);

    // Every estimate ends up in exactly one accepted hypothesis
    let mut claimed: Vec<Estimate> = accepted
        .iter()
        .flat_map(|h| h.accepted_estimates().iter().copied())
        .collect();
    claimed.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.frequency.total_cmp(&b.frequency))
    });
    assert_eq!(claimed, estimates.to_vec());
}

#[test]
fn pair_containing() {
    // eeeeeeee
    //   ffff
    // ffff satisfies while eeeeeeee is still in progress, so it can never
    // replace it. Only eeeeeeee is reported.
    let estimates = [
        est(LOW, 0),
        est(LOW, 10),
        est(LOW, 20),
        est(HIGH, 20),
        est(LOW, 30),
        est(HIGH, 30),
        est(LOW, 40),
        est(HIGH, 40),
        est(LOW, 50),
        est(HIGH, 50),
        est(LOW, 60),
        est(LOW, 70),
    ];
    let accepted = run(&estimates);
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].start_time(), Some(ms(0)));
    assert_eq!(accepted[0].accepted_estimates().len(), 8);
    let note = accepted[0].averaged_note();
    assert_eq!(note.frequency, LOW);
    assert_eq!(note.duration, ms(70));
}

#[test]
fn live_current_is_not_preempted() {
    let mut feeder = AgentFeeder::new(DEFAULT_SLACK);
    for e in [
        est(LOW, 0),
        est(LOW, 10),
        est(LOW, 20),
        est(HIGH, 20),
        est(HIGH, 30),
        est(HIGH, 40),
        est(HIGH, 50),
    ] {
        feeder.feed(e);
    }
    // HIGH is satisfied, but LOW has not expired yet (last at 20 ms)
    let current = feeder.current().expect("LOW should be current");
    assert_eq!(current.start_time(), Some(ms(0)));
    assert_eq!(feeder.candidates().len(), 1);
    assert_eq!(feeder.candidates()[0].state(), State::Satisfied);
    assert!(feeder.accepted_hypotheses().is_empty());
}

#[test]
fn runs_are_deterministic() {
    let estimates: Vec<_> = (0..300u64)
        .map(|i| {
            let frequency = if (i / 37) % 2 == 0 { LOW } else { HIGH };
            let confidence = 0.2 + (i % 7) as f64 * 0.1;
            Estimate::new(frequency + (i % 5) as f64, ms(i * 6), confidence)
        })
        .collect();
    let first = run(&estimates);
    let second = run(&estimates);
    assert!(!first.is_empty());
    assert_eq!(first, second);

    let starts: Vec<_> = first.iter().map(|h| h.start_time()).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[test]
fn finish_after_expiry_adds_nothing() {
    let mut feeder = AgentFeeder::new(DEFAULT_SLACK);
    for t in [0, 10, 20, 30] {
        feeder.feed(est(LOW, t));
    }
    // A stray estimate much later expires the current hypothesis
    feeder.feed(est(HIGH, 500));
    assert_eq!(feeder.accepted_hypotheses().len(), 1);
    assert!(feeder.current().is_none());
    feeder.finish();
    assert_eq!(feeder.accepted_hypotheses().len(), 1);
}

//! Window segmentation
//!
//! Single left-to-right pass over a game's ordered events. The only state is
//! the currently open window, threaded through a fold:
//!
//! - Outside + qualifying event: open a window at this event.
//! - Inside + qualifying event in the same period: extend the window.
//! - Inside + non-qualifying event, or a period change: close the window at the
//!   previous qualifying event, then evaluate this event from Outside.
//! - End of stream while Inside: close at the last qualifying event.
//!
//! A single non-qualifying instant always closes the window; there is no
//! hysteresis. Events are assumed to arrive in non-decreasing game-time order
//! and are never re-sorted here.
//!
//! Segment boundaries are [`StreamPosition`]s. When the margin swings out of
//! range and back while the clock is stopped, the two resulting segments share
//! a game time but not a position, so they never overlap.

use crate::intensity::{IntensityScorer, IntensityWeights};
use crate::predicate::is_qualifying;
use crate::types::{Criteria, Event, Segment, StreamPosition};

/// Convenience wrapper around [`Segmenter::segment`]
pub fn segment_events(
    events: &[Event],
    criteria: &Criteria,
    weights: IntensityWeights,
) -> Vec<Segment> {
    Segmenter::new(*criteria, weights).segment(events)
}

/// Segmenter bound to one set of criteria
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    criteria: Criteria,
    scorer: IntensityScorer,
}

impl Segmenter {
    pub fn new(criteria: Criteria, weights: IntensityWeights) -> Self {
        Self {
            criteria,
            scorer: IntensityScorer::new(&criteria, weights),
        }
    }

    /// Split `events` into closed, scored segments ordered by start time.
    pub fn segment(&self, events: &[Event]) -> Vec<Segment> {
        let state = events
            .iter()
            .enumerate()
            .fold(ScanState::default(), |state, (sequence, event)| {
                self.step(state, StreamPosition::new(event.timestamp(), sequence), event)
            });

        let ScanState { open, mut closed } = state;
        if let Some(window) = open {
            let id = closed.len();
            closed.push(window.close(id, &self.scorer));
        }
        closed
    }

    fn step(&self, mut state: ScanState, position: StreamPosition, event: &Event) -> ScanState {
        let qualifies = is_qualifying(event, &self.criteria);

        state.open = match state.open.take() {
            Some(window) if qualifies && window.period == event.period => {
                Some(window.extend(position, event))
            }
            Some(window) => {
                let id = state.closed.len();
                state.closed.push(window.close(id, &self.scorer));
                qualifies.then(|| OpenWindow::open(position, event))
            }
            None => qualifies.then(|| OpenWindow::open(position, event)),
        };

        state
    }
}

#[derive(Debug, Default)]
struct ScanState {
    open: Option<OpenWindow>,
    closed: Vec<Segment>,
}

/// Accumulator for the window currently being tracked
#[derive(Debug, Clone, Copy)]
struct OpenWindow {
    period: u8,
    start: StreamPosition,
    end: StreamPosition,
    margin_at_open: i32,
    margin_at_close: i32,
    event_count: usize,
}

impl OpenWindow {
    fn open(position: StreamPosition, event: &Event) -> Self {
        Self {
            period: event.period,
            start: position,
            end: position,
            margin_at_open: event.score_margin,
            margin_at_close: event.score_margin,
            event_count: 1,
        }
    }

    fn extend(self, position: StreamPosition, event: &Event) -> Self {
        Self {
            end: position,
            margin_at_close: event.score_margin,
            event_count: self.event_count + 1,
            ..self
        }
    }

    fn close(self, id: usize, scorer: &IntensityScorer) -> Segment {
        let mut segment = Segment {
            id,
            period: self.period,
            start: self.start,
            end: self.end,
            margin_at_open: self.margin_at_open,
            margin_at_close: self.margin_at_close,
            score_margin_absolute: self.margin_at_close.unsigned_abs(),
            event_count: self.event_count,
            intensity: 0.0,
        };
        segment.intensity = scorer.score_segment(&segment);

        log::debug!(
            "closed segment {id}: {} - {} ({} events, intensity {:.2})",
            segment.start,
            segment.end,
            segment.event_count,
            segment.intensity
        );
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameTime;
    use pretty_assertions::assert_eq;

    fn at(period: u8, clock: u32, sequence: usize) -> StreamPosition {
        StreamPosition::new(GameTime::new(period, clock), sequence)
    }

    fn run(events: &[Event]) -> Vec<Segment> {
        segment_events(events, &Criteria::default(), IntensityWeights::default())
    }

    /// Small deterministic generator so property checks need no extra crates
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: u32) -> u32 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 33) % bound as u64) as u32
        }
    }

    fn random_game(seed: u64) -> Vec<Event> {
        let mut rng = Lcg(seed);
        let mut events = Vec::new();
        let periods = 4 + rng.next(3) as u8;
        for period in 1..=periods {
            let mut clock = if period > 4 { 300 } else { 720 };
            let mut margin = rng.next(21) as i32 - 10;
            while clock > 0 {
                events.push(Event::new(period, clock, margin));
                // Roughly one in three plays leaves the clock stopped
                if rng.next(3) > 0 {
                    clock = clock.saturating_sub(1 + rng.next(40));
                }
                margin += rng.next(7) as i32 - 3;
            }
            events.push(Event::new(period, 0, margin));
        }
        events
    }

    #[test]
    fn test_single_window_late_in_fourth() {
        let events = vec![
            Event::new(4, 360, 10),
            Event::new(4, 270, 4),
            Event::new(4, 130, 3),
            Event::new(4, 0, 3),
        ];

        let segments = run(&events);

        assert_eq!(
            segments,
            vec![Segment {
                id: 0,
                period: 4,
                start: at(4, 270, 1),
                end: at(4, 0, 3),
                margin_at_open: 4,
                margin_at_close: 3,
                score_margin_absolute: 3,
                event_count: 3,
                intensity: 0.19,
            }]
        );
    }

    #[test]
    fn test_disqualifying_event_splits_windows() {
        let events = vec![
            Event::new(4, 240, 2),
            Event::new(4, 180, 8),
            Event::new(4, 60, 1),
        ];

        let segments = run(&events);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, at(4, 240, 0));
        assert_eq!(segments[0].end, at(4, 240, 0));
        assert_eq!(segments[0].event_count, 1);
        assert_eq!(segments[1].start, at(4, 60, 2));
        assert_eq!(segments[1].end, at(4, 60, 2));
        assert_eq!(segments[1].id, 1);
    }

    #[test]
    fn test_period_change_forces_close() {
        let events = vec![Event::new(4, 5, 0), Event::new(5, 300, 0)];

        let segments = run(&events);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].period, 4);
        assert_eq!(segments[1].period, 5);
        assert_eq!(segments[1].start, at(5, 300, 1));
    }

    #[test]
    fn test_overtime_reopens_after_non_qualifying_regulation_end() {
        let events = vec![
            Event::new(4, 30, 9),
            Event::new(5, 300, 0),
            Event::new(5, 120, -2),
        ];

        let segments = run(&events);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].period, 5);
        assert_eq!(segments[0].margin_at_close, -2);
        assert_eq!(segments[0].score_margin_absolute, 2);
    }

    #[test]
    fn test_empty_and_non_qualifying_streams() {
        assert!(run(&[]).is_empty());

        let blowout = vec![Event::new(4, 200, 25), Event::new(4, 100, 22)];
        assert!(run(&blowout).is_empty());

        let early = vec![Event::new(2, 10, 0), Event::new(3, 5, 1)];
        assert!(run(&early).is_empty());
    }

    #[test]
    fn test_stream_ending_inside_window_is_closed() {
        let events = vec![Event::new(4, 200, 1), Event::new(4, 150, 2)];

        let segments = run(&events);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end, at(4, 150, 1));
        assert_eq!(segments[0].margin_at_close, 2);
    }

    #[test]
    fn test_swing_at_stopped_clock_yields_disjoint_segments() {
        let events = vec![
            Event::new(4, 30, 5),
            Event::new(4, 30, 6),
            Event::new(4, 30, 4),
        ];

        let segments = run(&events);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, at(4, 30, 0));
        assert_eq!(segments[0].end, at(4, 30, 0));
        assert_eq!(segments[1].start, at(4, 30, 2));
        assert_eq!(segments[1].end, at(4, 30, 2));
        assert!(segments[0].end < segments[1].start);
        assert!(!segments[0].contains(at(4, 30, 1)));
        assert!(!segments[1].contains(at(4, 30, 1)));
    }

    #[test]
    fn test_intensity_is_scored_from_closed_segment() {
        let events = vec![Event::new(4, 130, 1), Event::new(4, 20, -3)];
        let scorer = IntensityScorer::new(&Criteria::default(), IntensityWeights::default());

        let segments = run(&events);

        assert_eq!(segments[0].intensity, scorer.score_segment(&segments[0]));
        assert_eq!(segments[0].intensity, scorer.score(130, -3));
    }

    #[test]
    fn test_margin_fluctuation_within_bound_keeps_window_open() {
        let events = vec![
            Event::new(4, 290, 0),
            Event::new(4, 250, 5),
            Event::new(4, 200, -5),
            Event::new(4, 100, 3),
        ];

        let segments = run(&events);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].event_count, 4);
        assert_eq!(segments[0].margin_at_open, 0);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        for seed in 0..20 {
            let events = random_game(seed);
            let first = run(&events);
            let second = run(&events);
            assert_eq!(first, second);
            let first_bits: Vec<u64> = first.iter().map(|s| s.intensity.to_bits()).collect();
            let second_bits: Vec<u64> = second.iter().map(|s| s.intensity.to_bits()).collect();
            assert_eq!(first_bits, second_bits);
        }
    }

    #[test]
    fn test_segments_are_ordered_disjoint_and_single_period() {
        for seed in 0..200 {
            let events = random_game(seed);
            let segments = run(&events);

            for (index, segment) in segments.iter().enumerate() {
                assert_eq!(segment.id, index);
                assert!(segment.start <= segment.end);
                assert_eq!(segment.start.time.period, segment.period);
                assert_eq!(segment.end.time.period, segment.period);
                assert!((0.0..=1.0).contains(&segment.intensity));
            }
            for pair in segments.windows(2) {
                assert!(pair[0].end < pair[1].start, "seed {seed}: {pair:?}");
            }
        }
    }

    #[test]
    fn test_every_qualifying_event_is_covered() {
        let criteria = Criteria::default();
        for seed in 0..100 {
            let events = random_game(seed);
            let segments = run(&events);
            for (sequence, event) in events.iter().enumerate() {
                let position = StreamPosition::new(event.timestamp(), sequence);
                let covering = segments.iter().filter(|s| s.contains(position)).count();
                if is_qualifying(event, &criteria) {
                    assert_eq!(covering, 1, "seed {seed}: {event:?}");
                } else {
                    assert_eq!(covering, 0, "seed {seed}: {event:?}");
                }
            }
        }
    }

    #[test]
    fn test_parallel_games_match_sequential() {
        let games: Vec<Vec<Event>> = (0..8).map(random_game).collect();
        let sequential: Vec<Vec<Segment>> = games.iter().map(|g| run(g)).collect();

        let parallel: Vec<Vec<Segment>> = std::thread::scope(|scope| {
            let handles: Vec<_> = games
                .iter()
                .map(|game| scope.spawn(move || run(game)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("segmentation thread panicked"))
                .collect()
        });

        assert_eq!(sequential, parallel);
    }
}

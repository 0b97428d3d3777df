//! Action classification and segment attribution
//!
//! Classification maps a canonical [`EventMessageType`] (plus the vendor
//! sub-code) to an [`Action`] through a fixed table. Plays that are not
//! attributable actions, or whose result is unknown, are dropped rather than
//! defaulted.
//!
//! Attribution assigns each action to the segment whose inclusive
//! `[start, end]` range contains it. Actions stamped by the normalizer are
//! matched on their stream position, so same-instant plays on either side of
//! a segment boundary land correctly; unstamped actions fall back to game
//! time. Segment order is re-checked here instead of being trusted: the
//! segments are indexed by start position, and when two of them overlap every
//! candidate is collected, the earliest wins, and a [`ConsistencyWarning`] is
//! raised.

use crate::types::{
    Action, ActionSubtype, ActionType, ConsistencyWarning, EventMessageType, RawAction, Segment,
};
use serde::{Deserialize, Serialize};

/// Attributed actions plus any inconsistencies found on the way
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub actions: Vec<Action>,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Classify a raw play. Returns `None` for plays that are not attributable.
pub fn classify(raw: &RawAction) -> Option<Action> {
    let (action_type, action_subtype, is_successful, points_scored) = match raw.message_type {
        EventMessageType::FieldGoalMade | EventMessageType::FieldGoalMissed => {
            let made = raw.message_type == EventMessageType::FieldGoalMade;
            let three = raw.shot_value == Some(3);
            let subtype = if three {
                ActionSubtype::ThreePointer
            } else {
                ActionSubtype::TwoPointer
            };
            let points = match (made, three) {
                (false, _) => 0,
                (true, true) => 3,
                (true, false) => 2,
            };
            (ActionType::Shot, subtype, made, points)
        }
        EventMessageType::FreeThrow => {
            let made = raw.made?;
            (
                ActionType::FreeThrow,
                free_throw_subtype(raw.action_code),
                made,
                u8::from(made),
            )
        }
        EventMessageType::Rebound => {
            let subtype = match &raw.actor {
                Some(actor) if actor.is_player() => ActionSubtype::Player,
                _ => ActionSubtype::Team,
            };
            (ActionType::Rebound, subtype, true, 0)
        }
        EventMessageType::Turnover => (
            ActionType::Turnover,
            turnover_subtype(raw.action_code),
            false,
            0,
        ),
        EventMessageType::Foul => (ActionType::Foul, foul_subtype(raw.action_code), false, 0),
        EventMessageType::Violation
        | EventMessageType::Substitution
        | EventMessageType::Timeout
        | EventMessageType::JumpBall
        | EventMessageType::Ejection
        | EventMessageType::PeriodStart
        | EventMessageType::PeriodEnd
        | EventMessageType::Unknown(_) => return None,
    };

    Some(Action {
        time: raw.time,
        action_type,
        action_subtype,
        is_successful,
        points_scored,
        actor: raw.actor.clone(),
        segment_ref: None,
        source_id: raw.source_id,
        sequence: raw.sequence,
    })
}

fn free_throw_subtype(code: u16) -> ActionSubtype {
    match code {
        16 => ActionSubtype::Technical,
        18..=22 => ActionSubtype::Flagrant,
        _ => ActionSubtype::Regular,
    }
}

fn turnover_subtype(code: u16) -> ActionSubtype {
    match code {
        1 => ActionSubtype::BadPass,
        2 => ActionSubtype::LostBall,
        4 => ActionSubtype::Traveling,
        11 => ActionSubtype::ShotClock,
        37 => ActionSubtype::OffensiveFoul,
        _ => ActionSubtype::Other,
    }
}

fn foul_subtype(code: u16) -> ActionSubtype {
    match code {
        1 => ActionSubtype::Personal,
        2 => ActionSubtype::Shooting,
        3 => ActionSubtype::LooseBall,
        4 => ActionSubtype::Offensive,
        11 => ActionSubtype::Technical,
        14 | 15 => ActionSubtype::Flagrant,
        _ => ActionSubtype::Other,
    }
}

/// Return annotated copies of `actions` with `segment_ref` filled in.
pub fn attribute(actions: &[Action], segments: &[Segment]) -> Attribution {
    let mut warnings = Vec::new();
    let index = SegmentIndex::build(segments, &mut warnings);

    let actions = actions
        .iter()
        .enumerate()
        .map(|(action_index, action)| {
            let matches = index.lookup(action);
            if let [chosen, _, ..] = matches.as_slice() {
                let warning = ConsistencyWarning::AmbiguousAttribution {
                    action_index,
                    time: action.time,
                    segment_ids: matches.clone(),
                    chosen: *chosen,
                };
                log::warn!("{warning}");
                warnings.push(warning);
            }

            Action {
                segment_ref: matches.first().copied(),
                ..action.clone()
            }
        })
        .collect();

    Attribution { actions, warnings }
}

/// Classify raw plays, then attribute the survivors.
pub fn attribute_raw(raw_actions: &[RawAction], segments: &[Segment]) -> Attribution {
    let classified: Vec<Action> = raw_actions
        .iter()
        .filter_map(|raw| {
            let action = classify(raw);
            if action.is_none() {
                log::trace!(
                    "dropping non-attributable play {:?} at {}",
                    raw.message_type,
                    raw.time
                );
            }
            action
        })
        .collect();

    attribute(&classified, segments)
}

/// Segments sorted by start, with a flag recording whether they are disjoint
struct SegmentIndex<'a> {
    sorted: Vec<&'a Segment>,
    disjoint: bool,
}

impl<'a> SegmentIndex<'a> {
    fn build(segments: &'a [Segment], warnings: &mut Vec<ConsistencyWarning>) -> Self {
        let mut sorted: Vec<&Segment> = segments.iter().collect();
        sorted.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));

        let mut disjoint = true;
        for pair in sorted.windows(2) {
            if pair[1].start <= pair[0].end {
                disjoint = false;
                let warning = ConsistencyWarning::OverlappingSegments {
                    first: pair[0].id,
                    second: pair[1].id,
                };
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }

        Self { sorted, disjoint }
    }

    /// Ids of every segment containing `action`, earliest start first
    fn lookup(&self, action: &Action) -> Vec<usize> {
        let Some(position) = action.position() else {
            return self
                .sorted
                .iter()
                .filter(|s| s.spans(action.time))
                .map(|s| s.id)
                .collect();
        };

        let candidates = &self.sorted[..self.sorted.partition_point(|s| s.start <= position)];

        if self.disjoint {
            // Only the latest-starting candidate can still be open at `position`
            return candidates
                .last()
                .filter(|s| s.end >= position)
                .map(|s| vec![s.id])
                .unwrap_or_default();
        }

        candidates
            .iter()
            .filter(|s| s.end >= position)
            .map(|s| s.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Actor, GameTime, StreamPosition};
    use pretty_assertions::assert_eq;

    fn at(period: u8, clock: u32, sequence: usize) -> StreamPosition {
        StreamPosition::new(GameTime::new(period, clock), sequence)
    }

    fn segment(id: usize, start: StreamPosition, end: StreamPosition) -> Segment {
        Segment {
            id,
            period: start.time.period,
            start,
            end,
            margin_at_open: 0,
            margin_at_close: 0,
            score_margin_absolute: 0,
            event_count: 2,
            intensity: 0.5,
        }
    }

    fn shot_at(time: GameTime) -> Action {
        classify(&RawAction::new(time, EventMessageType::FieldGoalMade)).unwrap()
    }

    fn sequenced_shot(position: StreamPosition) -> Action {
        let mut raw = RawAction::new(position.time, EventMessageType::FieldGoalMade);
        raw.sequence = Some(position.sequence);
        classify(&raw).unwrap()
    }

    fn player(id: u64) -> Actor {
        Actor {
            player_id: Some(id),
            name: None,
            team: Some("BOS".to_string()),
        }
    }

    #[test]
    fn test_classify_field_goals() {
        let mut raw = RawAction::new(GameTime::new(4, 30), EventMessageType::FieldGoalMade);
        raw.shot_value = Some(3);
        let action = classify(&raw).unwrap();
        assert_eq!(action.action_type, ActionType::Shot);
        assert_eq!(action.action_subtype, ActionSubtype::ThreePointer);
        assert!(action.is_successful);
        assert_eq!(action.points_scored, 3);

        let raw = RawAction::new(GameTime::new(4, 30), EventMessageType::FieldGoalMissed);
        let action = classify(&raw).unwrap();
        assert_eq!(action.action_subtype, ActionSubtype::TwoPointer);
        assert!(!action.is_successful);
        assert_eq!(action.points_scored, 0);
    }

    #[test]
    fn test_classify_free_throws() {
        let mut raw = RawAction::new(GameTime::new(4, 10), EventMessageType::FreeThrow);
        raw.action_code = 11;
        raw.made = Some(true);
        let action = classify(&raw).unwrap();
        assert_eq!(action.action_type, ActionType::FreeThrow);
        assert_eq!(action.action_subtype, ActionSubtype::Regular);
        assert_eq!(action.points_scored, 1);

        raw.action_code = 16;
        raw.made = Some(false);
        let action = classify(&raw).unwrap();
        assert_eq!(action.action_subtype, ActionSubtype::Technical);
        assert_eq!(action.points_scored, 0);

        // Unknown result is dropped, not defaulted
        raw.made = None;
        assert!(classify(&raw).is_none());
    }

    #[test]
    fn test_classify_rebounds_turnovers_fouls() {
        let mut raw = RawAction::new(GameTime::new(4, 10), EventMessageType::Rebound);
        raw.actor = Some(player(1628369));
        assert_eq!(classify(&raw).unwrap().action_subtype, ActionSubtype::Player);
        raw.actor = Some(Actor {
            team: Some("BOS".to_string()),
            ..Default::default()
        });
        assert_eq!(classify(&raw).unwrap().action_subtype, ActionSubtype::Team);

        let mut raw = RawAction::new(GameTime::new(4, 10), EventMessageType::Turnover);
        raw.action_code = 1;
        let action = classify(&raw).unwrap();
        assert_eq!(action.action_type, ActionType::Turnover);
        assert_eq!(action.action_subtype, ActionSubtype::BadPass);

        let mut raw = RawAction::new(GameTime::new(4, 10), EventMessageType::Foul);
        raw.action_code = 2;
        assert_eq!(classify(&raw).unwrap().action_subtype, ActionSubtype::Shooting);
        raw.action_code = 99;
        assert_eq!(classify(&raw).unwrap().action_subtype, ActionSubtype::Other);
    }

    #[test]
    fn test_non_actions_are_dropped() {
        for message_type in [
            EventMessageType::Substitution,
            EventMessageType::Timeout,
            EventMessageType::PeriodEnd,
            EventMessageType::Unknown(18),
        ] {
            assert!(classify(&RawAction::new(GameTime::new(4, 0), message_type)).is_none());
        }
    }

    #[test]
    fn test_attribution_inside_and_outside() {
        let segments = vec![segment(0, at(4, 270, 1), at(4, 0, 3))];
        let actions = vec![
            shot_at(GameTime::new(4, 270)),
            shot_at(GameTime::new(4, 390)),
        ];

        let result = attribute(&actions, &segments);

        assert_eq!(result.actions[0].segment_ref, Some(0));
        assert_eq!(result.actions[1].segment_ref, None);
        assert!(result.warnings.is_empty());
        // Inputs are left untouched
        assert_eq!(actions[0].segment_ref, None);
    }

    #[test]
    fn test_attribution_does_not_trust_segment_order() {
        let segments = vec![
            segment(1, at(4, 60, 6), at(4, 10, 8)),
            segment(0, at(4, 240, 1), at(4, 200, 3)),
        ];
        let actions = vec![
            shot_at(GameTime::new(4, 220)),
            shot_at(GameTime::new(4, 100)),
            shot_at(GameTime::new(4, 10)),
        ];

        let result = attribute(&actions, &segments);

        let refs: Vec<Option<usize>> = result.actions.iter().map(|a| a.segment_ref).collect();
        assert_eq!(refs, vec![Some(0), None, Some(1)]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_overlap_picks_earliest_and_warns() {
        let segments = vec![
            segment(0, at(4, 120, 0), at(4, 60, 3)),
            segment(1, at(4, 60, 3), at(4, 0, 6)),
        ];
        let actions = vec![sequenced_shot(at(4, 60, 3)), sequenced_shot(at(4, 30, 5))];

        let result = attribute(&actions, &segments);

        assert_eq!(result.actions[0].segment_ref, Some(0));
        assert_eq!(result.actions[1].segment_ref, Some(1));
        assert_eq!(
            result.warnings,
            vec![
                ConsistencyWarning::OverlappingSegments {
                    first: 0,
                    second: 1
                },
                ConsistencyWarning::AmbiguousAttribution {
                    action_index: 0,
                    time: GameTime::new(4, 60),
                    segment_ids: vec![0, 1],
                    chosen: 0,
                },
            ]
        );
    }

    #[test]
    fn test_same_instant_actions_split_by_stream_position() {
        // Clock stopped at 0:30 while the margin left the bound and came back
        let segments = vec![
            segment(0, at(4, 45, 0), at(4, 30, 1)),
            segment(1, at(4, 30, 3), at(4, 10, 4)),
        ];
        let actions = vec![
            sequenced_shot(at(4, 30, 1)),
            sequenced_shot(at(4, 30, 2)),
            sequenced_shot(at(4, 30, 3)),
        ];

        let result = attribute(&actions, &segments);

        let refs: Vec<Option<usize>> = result.actions.iter().map(|a| a.segment_ref).collect();
        assert_eq!(refs, vec![Some(0), None, Some(1)]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unsequenced_action_at_shared_instant_is_ambiguous() {
        let segments = vec![
            segment(0, at(4, 45, 0), at(4, 30, 1)),
            segment(1, at(4, 30, 3), at(4, 10, 4)),
        ];

        let result = attribute(&[shot_at(GameTime::new(4, 30))], &segments);

        assert_eq!(result.actions[0].segment_ref, Some(0));
        assert_eq!(
            result.warnings,
            vec![ConsistencyWarning::AmbiguousAttribution {
                action_index: 0,
                time: GameTime::new(4, 30),
                segment_ids: vec![0, 1],
                chosen: 0,
            }]
        );
    }

    #[test]
    fn test_attribute_raw_drops_unclassified() {
        let segments = vec![segment(0, at(4, 300, 0), at(4, 0, 9))];
        let raw = vec![
            RawAction::new(GameTime::new(4, 200), EventMessageType::Timeout),
            RawAction::new(GameTime::new(4, 150), EventMessageType::FieldGoalMissed),
            RawAction::new(GameTime::new(4, 100), EventMessageType::Unknown(42)),
        ];

        let result = attribute_raw(&raw, &segments);

        assert_eq!(result.actions.len(), 1);
        assert_eq!(result.actions[0].segment_ref, Some(0));
    }

    #[test]
    fn test_no_segments_means_no_attribution() {
        let result = attribute(&[shot_at(GameTime::new(4, 10))], &[]);
        assert_eq!(result.actions[0].segment_ref, None);
        assert!(attribute(&[], &[]).actions.is_empty());
    }
}

//! Per-player clutch lines
//!
//! Splits every player's attributed actions into clutch (inside a segment)
//! and non-clutch shooting lines and compares true shooting across the two.
//! A positive `clutch_factor` means the player shot better under pressure.

use crate::types::{Action, ActionSubtype, ActionType, Actor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Free-throw attempt weight in the true-shooting denominator
const FREE_THROW_WEIGHT: f64 = 0.44;

/// Scoring totals for one split
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShootingLine {
    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub three_pointers_made: u32,
    pub three_pointers_attempted: u32,
    pub free_throws_made: u32,
    pub free_throws_attempted: u32,
    pub points: u32,
}

impl ShootingLine {
    fn record(&mut self, action: &Action) {
        let three = action.action_subtype == ActionSubtype::ThreePointer;
        match action.action_type {
            ActionType::Shot => {
                self.field_goals_attempted += 1;
                if three {
                    self.three_pointers_attempted += 1;
                }
                if action.is_successful {
                    self.field_goals_made += 1;
                    if three {
                        self.three_pointers_made += 1;
                    }
                }
            }
            ActionType::FreeThrow => {
                self.free_throws_attempted += 1;
                if action.is_successful {
                    self.free_throws_made += 1;
                }
            }
            ActionType::Rebound | ActionType::Turnover | ActionType::Foul => return,
        }
        self.points += u32::from(action.points_scored);
    }

    /// `points / (2 * (FGA + 0.44 * FTA))`, or `None` with no attempts
    pub fn true_shooting(&self) -> Option<f64> {
        let attempts = 2.0
            * (self.field_goals_attempted as f64
                + FREE_THROW_WEIGHT * self.free_throws_attempted as f64);
        if attempts <= 0.0 {
            return None;
        }
        Some(round3(self.points as f64 / attempts))
    }
}

/// Clutch vs. non-clutch production for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerClutchLine {
    pub key: String,
    pub actor: Actor,
    pub clutch: ShootingLine,
    pub non_clutch: ShootingLine,
    pub clutch_rebounds: u32,
    pub clutch_turnovers: u32,
    pub clutch_fouls: u32,
    /// Ids of the segments this player recorded an action in
    pub segments: Vec<usize>,
    /// Clutch minus non-clutch true shooting, when both are defined
    pub clutch_factor: Option<f64>,
}

impl PlayerClutchLine {
    fn new(key: String, actor: Actor) -> Self {
        Self {
            key,
            actor,
            clutch: ShootingLine::default(),
            non_clutch: ShootingLine::default(),
            clutch_rebounds: 0,
            clutch_turnovers: 0,
            clutch_fouls: 0,
            segments: Vec::new(),
            clutch_factor: None,
        }
    }
}

/// Build one line per player, ordered by player key.
///
/// Team-only actions (team rebounds, team turnovers) are skipped.
pub fn summarize(actions: &[Action]) -> Vec<PlayerClutchLine> {
    let mut lines: BTreeMap<String, (PlayerClutchLine, BTreeSet<usize>)> = BTreeMap::new();

    for action in actions {
        let Some(actor) = action.actor.as_ref().filter(|a| a.is_player()) else {
            continue;
        };
        let Some(key) = actor.key() else {
            continue;
        };

        let (line, segments) = lines
            .entry(key.clone())
            .or_insert_with(|| (PlayerClutchLine::new(key, actor.clone()), BTreeSet::new()));

        match action.segment_ref {
            Some(segment) => {
                segments.insert(segment);
                line.clutch.record(action);
                match action.action_type {
                    ActionType::Rebound => line.clutch_rebounds += 1,
                    ActionType::Turnover => line.clutch_turnovers += 1,
                    ActionType::Foul => line.clutch_fouls += 1,
                    ActionType::Shot | ActionType::FreeThrow => {}
                }
            }
            None => line.non_clutch.record(action),
        }
    }

    lines
        .into_values()
        .map(|(mut line, segments)| {
            line.segments = segments.into_iter().collect();
            line.clutch_factor = match (line.clutch.true_shooting(), line.non_clutch.true_shooting())
            {
                (Some(clutch), Some(normal)) => Some(round3(clutch - normal)),
                _ => None,
            };
            line
        })
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameTime;
    use pretty_assertions::assert_eq;

    fn action(
        player: Option<u64>,
        action_type: ActionType,
        subtype: ActionSubtype,
        made: bool,
        points: u8,
        segment: Option<usize>,
    ) -> Action {
        Action {
            time: GameTime::new(4, 100),
            action_type,
            action_subtype: subtype,
            is_successful: made,
            points_scored: points,
            actor: Some(Actor {
                player_id: player,
                name: None,
                team: Some("BOS".to_string()),
            }),
            segment_ref: segment,
            source_id: None,
            sequence: None,
        }
    }

    #[test]
    fn test_true_shooting() {
        let line = ShootingLine {
            field_goals_made: 5,
            field_goals_attempted: 10,
            free_throws_made: 4,
            free_throws_attempted: 5,
            points: 16,
            ..Default::default()
        };
        // 16 / (2 * (10 + 2.2)) = 0.6557
        assert_eq!(line.true_shooting(), Some(0.656));
        assert_eq!(ShootingLine::default().true_shooting(), None);
    }

    #[test]
    fn test_summarize_splits_clutch_and_non_clutch() {
        let actions = vec![
            action(Some(7), ActionType::Shot, ActionSubtype::ThreePointer, true, 3, Some(0)),
            action(Some(7), ActionType::Shot, ActionSubtype::TwoPointer, false, 0, Some(0)),
            action(Some(7), ActionType::Shot, ActionSubtype::TwoPointer, true, 2, None),
            action(Some(7), ActionType::Shot, ActionSubtype::TwoPointer, false, 0, None),
            action(Some(7), ActionType::Turnover, ActionSubtype::BadPass, false, 0, Some(1)),
            action(Some(3), ActionType::FreeThrow, ActionSubtype::Regular, true, 1, Some(1)),
            action(None, ActionType::Rebound, ActionSubtype::Team, true, 0, Some(1)),
        ];

        let lines = summarize(&actions);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].key, "player:3");
        assert_eq!(lines[0].clutch.points, 1);
        assert_eq!(lines[0].clutch_factor, None);

        let player = &lines[1];
        assert_eq!(player.key, "player:7");
        assert_eq!(
            player.clutch,
            ShootingLine {
                field_goals_made: 1,
                field_goals_attempted: 2,
                three_pointers_made: 1,
                three_pointers_attempted: 1,
                points: 3,
                ..Default::default()
            }
        );
        assert_eq!(player.non_clutch.points, 2);
        assert_eq!(player.clutch_turnovers, 1);
        assert_eq!(player.segments, vec![0, 1]);
        // 3/4 - 2/4
        assert_eq!(player.clutch_factor, Some(0.25));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_empty());
    }
}

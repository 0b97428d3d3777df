//! Live data play-by-play adapter
//!
//! Parses `game.actions` feeds where clocks are ISO-8601 durations
//! (`PT04M30.00S`), scores are strings, and plays are described by
//! `actionType` / `subType` / `shotResult` strings. Those strings are mapped
//! onto the canonical stats API message and sub-codes.

use crate::error::ComputeError;
use crate::normalizer::{parse_clock, parse_period, parse_score, FeedBuilder};
use crate::types::{Actor, Event, EventMessageType, GameFeed, GameTime, RawAction, Vendor};
use serde::Deserialize;
use serde_json::Value;

use super::VendorPayloadAdapter;

/// Live data payload adapter
pub struct NbaLiveAdapter;

impl VendorPayloadAdapter for NbaLiveAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::NbaLive
    }

    fn parse(&self, raw_json: &str) -> Result<GameFeed, ComputeError> {
        let payload: LivePayload = serde_json::from_str(raw_json)?;
        let mut builder = FeedBuilder::new(payload.game.game_id);

        for (position, raw) in payload.game.actions.into_iter().enumerate() {
            let parsed = serde_json::from_value::<LiveAction>(raw)
                .map_err(ComputeError::from)
                .and_then(|action| convert_action(&action, &mut builder));
            match parsed {
                Ok((event, action)) => builder.push(event, action),
                Err(e) => builder.reject(position, &e),
            }
        }

        Ok(builder.finish())
    }
}

#[derive(Debug, Deserialize)]
struct LivePayload {
    game: LiveGame,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveGame {
    #[serde(default)]
    game_id: Option<String>,
    actions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveAction {
    #[serde(default)]
    action_number: Option<u64>,
    clock: String,
    period: i64,
    #[serde(default)]
    action_type: String,
    #[serde(default)]
    sub_type: Option<String>,
    #[serde(default)]
    shot_result: Option<String>,
    #[serde(default)]
    score_home: Option<String>,
    #[serde(default)]
    score_away: Option<String>,
    #[serde(default)]
    person_id: Option<u64>,
    #[serde(default)]
    player_name: Option<String>,
    #[serde(default)]
    team_tricode: Option<String>,
    #[serde(default)]
    qualifiers: Vec<String>,
}

fn convert_action(
    live: &LiveAction,
    builder: &mut FeedBuilder,
) -> Result<(Event, RawAction), ComputeError> {
    let period = parse_period(live.period)?;
    let clock = parse_clock(&live.clock)?;

    let margin = match (&live.score_home, &live.score_away) {
        (Some(home), Some(away)) => {
            Some(parse_score(home)? as i64 - parse_score(away)? as i64)
        }
        _ => None,
    };
    let margin = margin
        .map(|m| i32::try_from(m).map_err(|_| ComputeError::InvalidScore(m.to_string())))
        .transpose()?;
    let margin = builder.observe_margin(margin);

    let sub_type = live.sub_type.as_deref().unwrap_or("").to_ascii_lowercase();
    let made = live.shot_result.as_deref().map(|r| r.eq_ignore_ascii_case("made"));
    let has_qualifier = |q: &str| live.qualifiers.iter().any(|x| x.eq_ignore_ascii_case(q));

    let message_type = match live.action_type.to_ascii_lowercase().as_str() {
        "2pt" | "3pt" => match made {
            Some(true) => EventMessageType::FieldGoalMade,
            Some(false) => EventMessageType::FieldGoalMissed,
            None => EventMessageType::Unknown(0),
        },
        "freethrow" => EventMessageType::FreeThrow,
        "rebound" => EventMessageType::Rebound,
        "turnover" => EventMessageType::Turnover,
        "foul" => EventMessageType::Foul,
        "violation" => EventMessageType::Violation,
        "substitution" => EventMessageType::Substitution,
        "timeout" => EventMessageType::Timeout,
        "jumpball" => EventMessageType::JumpBall,
        "ejection" => EventMessageType::Ejection,
        "period" if sub_type == "start" => EventMessageType::PeriodStart,
        "period" if sub_type == "end" => EventMessageType::PeriodEnd,
        _ => EventMessageType::Unknown(0),
    };

    let action_code = match message_type {
        EventMessageType::FreeThrow => {
            if sub_type.contains("technical") || has_qualifier("technical") {
                16
            } else if sub_type.contains("flagrant") || has_qualifier("flagrant") {
                18
            } else {
                free_throw_code(&sub_type)
            }
        }
        EventMessageType::Turnover => turnover_code(&sub_type),
        EventMessageType::Foul => foul_code(&sub_type),
        _ => 0,
    };

    let is_team_play = has_qualifier("team") || live.person_id == Some(0);
    let actor = build_actor(live, is_team_play);
    let time = GameTime::new(period, clock);

    let mut action = RawAction::new(time, message_type);
    action.action_code = action_code;
    action.actor = actor.clone();
    action.source_id = live.action_number;
    match message_type {
        EventMessageType::FieldGoalMade | EventMessageType::FieldGoalMissed => {
            action.shot_value = Some(if live.action_type.eq_ignore_ascii_case("3pt") {
                3
            } else {
                2
            });
        }
        EventMessageType::FreeThrow => action.made = made,
        _ => {}
    }

    let event = Event {
        period,
        clock_remaining_seconds: clock,
        score_margin: margin,
        actor,
        source_id: live.action_number,
    };

    Ok((event, action))
}

fn build_actor(live: &LiveAction, is_team_play: bool) -> Option<Actor> {
    let player_id = live.person_id.filter(|id| *id > 0 && !is_team_play);
    let name = live
        .player_name
        .clone()
        .filter(|n| !n.trim().is_empty() && !is_team_play);
    let team = live.team_tricode.clone().filter(|t| !t.trim().is_empty());

    if player_id.is_none() && name.is_none() && team.is_none() {
        return None;
    }

    Some(Actor {
        player_id,
        name,
        team,
    })
}

fn free_throw_code(sub_type: &str) -> u16 {
    match sub_type {
        "1 of 1" => 10,
        "1 of 2" => 11,
        "2 of 2" => 12,
        "1 of 3" => 13,
        "2 of 3" => 14,
        "3 of 3" => 15,
        _ => 0,
    }
}

fn turnover_code(sub_type: &str) -> u16 {
    match sub_type {
        "bad pass" => 1,
        "lost ball" => 2,
        "traveling" => 4,
        "shot clock" => 11,
        "offensive foul" => 37,
        _ => 0,
    }
}

fn foul_code(sub_type: &str) -> u16 {
    match sub_type {
        "personal" => 1,
        "shooting" => 2,
        "loose ball" => 3,
        "offensive" => 4,
        "technical" => 11,
        "flagrant-type-1" => 14,
        "flagrant-type-2" => 15,
        _ => 0,
    }
}

//! Stats API play-by-play adapter
//!
//! Parses `playbyplayv2` responses: a `resultSets` array whose `PlayByPlay`
//! entry carries a header row and positional `rowSet` records.

use crate::error::ComputeError;
use crate::normalizer::{parse_clock, parse_margin, parse_period, FeedBuilder};
use crate::types::{Actor, Event, EventMessageType, GameFeed, GameTime, RawAction, Vendor};
use serde::Deserialize;
use serde_json::Value;

use super::VendorPayloadAdapter;

const PLAY_BY_PLAY_SET: &str = "PlayByPlay";

/// `PERSON1TYPE` values that denote a team rather than a player
const TEAM_PERSON_TYPES: [i64; 2] = [2, 3];

/// Stats API payload adapter
pub struct NbaStatsAdapter;

impl VendorPayloadAdapter for NbaStatsAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::NbaStats
    }

    fn parse(&self, raw_json: &str) -> Result<GameFeed, ComputeError> {
        let payload: StatsPayload = serde_json::from_str(raw_json)?;

        let result_set = payload
            .result_sets
            .iter()
            .find(|set| set.name == PLAY_BY_PLAY_SET)
            .or_else(|| payload.result_sets.first())
            .ok_or_else(|| ComputeError::ParseError("response has no result sets".to_string()))?;

        let columns = Columns::locate(&result_set.headers)?;
        let mut builder = FeedBuilder::new(
            payload
                .parameters
                .as_ref()
                .and_then(|p| p.get("GameID"))
                .and_then(Value::as_str)
                .map(str::to_string),
        );

        for (position, row) in result_set.row_set.iter().enumerate() {
            match parse_row(row, &columns, &mut builder) {
                Ok((event, action)) => builder.push(event, action),
                Err(e) => builder.reject(position, &e),
            }
        }

        Ok(builder.finish())
    }
}

#[derive(Debug, Deserialize)]
struct StatsPayload {
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(rename = "resultSets")]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    name: String,
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

/// Positions of the columns this adapter reads
struct Columns {
    game_id: Option<usize>,
    event_num: Option<usize>,
    message_type: usize,
    action_type: Option<usize>,
    period: usize,
    clock: usize,
    home_description: Option<usize>,
    neutral_description: Option<usize>,
    visitor_description: Option<usize>,
    score_margin: Option<usize>,
    person_type: Option<usize>,
    player_id: Option<usize>,
    player_name: Option<usize>,
    team: Option<usize>,
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self, ComputeError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require =
            |name: &str| find(name).ok_or_else(|| ComputeError::MissingField(name.to_string()));

        Ok(Self {
            game_id: find("GAME_ID"),
            event_num: find("EVENTNUM"),
            message_type: require("EVENTMSGTYPE")?,
            action_type: find("EVENTMSGACTIONTYPE"),
            period: require("PERIOD")?,
            clock: require("PCTIMESTRING")?,
            home_description: find("HOMEDESCRIPTION"),
            neutral_description: find("NEUTRALDESCRIPTION"),
            visitor_description: find("VISITORDESCRIPTION"),
            score_margin: find("SCOREMARGIN"),
            person_type: find("PERSON1TYPE"),
            player_id: find("PLAYER1_ID"),
            player_name: find("PLAYER1_NAME"),
            team: find("PLAYER1_TEAM_ABBREVIATION"),
        })
    }
}

fn parse_row(
    row: &[Value],
    columns: &Columns,
    builder: &mut FeedBuilder,
) -> Result<(Event, RawAction), ComputeError> {
    let cell = |index: Option<usize>| index.and_then(|i| row.get(i)).filter(|v| !v.is_null());

    let period = cell_i64(cell(Some(columns.period)))
        .ok_or_else(|| ComputeError::MissingField("PERIOD".to_string()))?;
    let period = parse_period(period)?;

    let clock = cell_str(cell(Some(columns.clock)))
        .ok_or_else(|| ComputeError::MissingField("PCTIMESTRING".to_string()))?;
    let clock = parse_clock(&clock)?;

    let code = cell_i64(cell(Some(columns.message_type)))
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| ComputeError::MissingField("EVENTMSGTYPE".to_string()))?;
    let message_type = EventMessageType::from_code(code);

    // Margin is validated before it is folded into the running score
    let margin = parse_margin(cell_str(cell(columns.score_margin)).as_deref())?;
    let margin = builder.observe_margin(margin);

    if let Some(game_id) = cell_str(cell(columns.game_id)) {
        builder.set_game_id(game_id);
    }

    let source_id = cell_i64(cell(columns.event_num)).and_then(|n| u64::try_from(n).ok());
    let actor = parse_actor(&cell, columns);

    let description = [
        columns.home_description,
        columns.neutral_description,
        columns.visitor_description,
    ]
    .into_iter()
    .filter_map(|index| cell_str(cell(index)))
    .collect::<Vec<_>>()
    .join(" ");

    let time = GameTime::new(period, clock);
    let mut action = RawAction::new(time, message_type);
    action.action_code = cell_i64(cell(columns.action_type))
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(0);
    action.actor = actor.clone();
    action.source_id = source_id;

    match message_type {
        EventMessageType::FieldGoalMade | EventMessageType::FieldGoalMissed => {
            action.shot_value = Some(if description.contains("3PT") { 3 } else { 2 });
        }
        EventMessageType::FreeThrow if !description.is_empty() => {
            action.made = Some(!description.to_ascii_uppercase().contains("MISS"));
        }
        _ => {}
    }

    let event = Event {
        period,
        clock_remaining_seconds: clock,
        score_margin: margin,
        actor,
        source_id,
    };

    Ok((event, action))
}

fn parse_actor<'a>(
    cell: &impl Fn(Option<usize>) -> Option<&'a Value>,
    columns: &Columns,
) -> Option<Actor> {
    let is_team = cell_i64(cell(columns.person_type))
        .map(|t| TEAM_PERSON_TYPES.contains(&t))
        .unwrap_or(false);

    let player_id = if is_team {
        None
    } else {
        cell_i64(cell(columns.player_id))
            .filter(|id| *id > 0)
            .and_then(|id| u64::try_from(id).ok())
    };
    let name = if is_team {
        None
    } else {
        cell_str(cell(columns.player_name))
    };
    let team = cell_str(cell(columns.team));

    if player_id.is_none() && name.is_none() && team.is_none() {
        return None;
    }

    Some(Actor {
        player_id,
        name,
        team,
    })
}

/// Integer from a numeric or numeric-string cell
fn cell_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-empty string from a string or numeric cell
fn cell_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

//! Raw-to-model normalization.
//!
//! Maps an arbitrary, partial decoded payload into a complete, internally
//! consistent [`CardData`]: absent fields get their documented defaults
//! (empty string, empty sequence, empty mapping - never null), stringified
//! character books are parsed, and date-like values are coerced to epoch
//! seconds.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::card::model::{CardData, CharacterBook};
use crate::card::raw::{RawBook, RawCard};
use crate::error::{CardError, Result};

/// Normalizes a raw payload against the current wall clock.
///
/// # Errors
///
/// Returns [`CardError::BookParse`] when the character book arrived as a
/// string that is not valid JSON. No partial model is produced in that case.
pub fn normalize(raw: RawCard) -> Result<CardData> {
    normalize_at(raw, Utc::now())
}

/// Normalizes a raw payload against an explicit `now`.
///
/// Pure: the same input and the same `now` always yield structurally equal
/// output. `normalize` delegates here; tests pin `now` for determinism.
pub fn normalize_at(raw: RawCard, now: DateTime<Utc>) -> Result<CardData> {
    let character_book = match raw.character_book {
        None => CharacterBook::default(),
        Some(RawBook::Parsed(book)) => book,
        Some(RawBook::Raw(text)) => serde_json::from_str(&text).map_err(|e| {
            CardError::book_parse(format!("embedded character_book is not valid JSON: {e}"))
        })?,
    };

    Ok(CardData {
        name: raw.name.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        tags: raw.tags.unwrap_or_default(),
        creator: raw.creator.unwrap_or_default(),
        character_version: raw.character_version.unwrap_or_default(),
        mes_example: raw.mes_example.unwrap_or_default(),
        system_prompt: raw.system_prompt.unwrap_or_default(),
        post_history_instructions: raw.post_history_instructions.unwrap_or_default(),
        first_mes: raw.first_mes.unwrap_or_default(),
        alternate_greetings: raw.alternate_greetings.unwrap_or_default(),
        personality: raw.personality.unwrap_or_default(),
        scenario: raw.scenario.unwrap_or_default(),
        creator_notes: raw.creator_notes.unwrap_or_default(),
        nickname: raw.nickname.unwrap_or_default(),
        source: raw.source.unwrap_or_default(),
        group_only_greetings: raw.group_only_greetings.unwrap_or_default(),
        character_book,
        assets: raw.assets.unwrap_or_default(),
        extensions: raw.extensions.unwrap_or_default(),
        creator_notes_multilingual: raw.creator_notes_multilingual.unwrap_or_default(),
        creation_date: coerce_timestamp(raw.creation_date.as_ref(), now),
        modification_date: coerce_timestamp(raw.modification_date.as_ref(), now),
    })
}

/// Millisecond timestamps are unambiguously larger than any plausible
/// second-resolution card date.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Coerces a date-like raw value to epoch seconds.
///
/// Accepts integer/float epoch values (seconds or milliseconds), RFC 3339
/// strings, and plain `YYYY-MM-DD` dates. Anything absent or unrecognized
/// defaults to `now`.
fn coerce_timestamp(value: Option<&Value>, now: DateTime<Utc>) -> i64 {
    match value {
        Some(Value::Number(n)) => {
            let epoch = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_else(|| now.timestamp());
            if epoch.abs() >= MILLIS_THRESHOLD {
                epoch / 1000
            } else {
                epoch
            }
        }
        Some(Value::String(text)) => parse_date_string(text).unwrap_or_else(|| now.timestamp()),
        _ => now.timestamp(),
    }
}

fn parse_date_string(text: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }
    // Numbers that arrived as strings
    text.parse::<i64>().ok().map(|epoch| {
        if epoch.abs() >= MILLIS_THRESHOLD {
            epoch / 1000
        } else {
            epoch
        }
    })
}

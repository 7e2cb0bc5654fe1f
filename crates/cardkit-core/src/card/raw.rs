//! Decode-boundary card payload types.
//!
//! Payloads extracted from image metadata are arbitrary and partial: any
//! field may be missing, dates arrive in several shapes, and the character
//! book may be embedded as a JSON string instead of an object. These types
//! capture that looseness so the normalizer can resolve it in one place.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::card::model::CharacterBook;
use crate::error::Result;

/// A partial, untrusted card payload as it comes out of a decoder.
///
/// Every field is optional; defaults are filled in by
/// [`normalize`](crate::card::normalize).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCard {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub creator: Option<String>,
    pub character_version: Option<String>,
    pub mes_example: Option<String>,
    pub system_prompt: Option<String>,
    pub post_history_instructions: Option<String>,
    pub first_mes: Option<String>,
    pub alternate_greetings: Option<Vec<String>>,
    pub personality: Option<String>,
    pub scenario: Option<String>,
    pub creator_notes: Option<String>,
    pub nickname: Option<String>,
    pub source: Option<Vec<String>>,
    pub group_only_greetings: Option<Vec<String>>,
    pub character_book: Option<RawBook>,
    pub assets: Option<Vec<Value>>,
    pub extensions: Option<Map<String, Value>>,
    pub creator_notes_multilingual: Option<Map<String, Value>>,
    pub creation_date: Option<Value>,
    pub modification_date: Option<Value>,
}

/// The character-book field at the decode boundary.
///
/// Legacy cards embed the book as a JSON string; current cards embed it as
/// an object. The ambiguity stops at the normalizer, which always resolves
/// to a parsed book and fails the load on malformed strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBook {
    Raw(String),
    Parsed(CharacterBook),
}

/// The outer wrapper as found in embedded metadata.
///
/// Modern payloads are `{spec, spec_version, data}`; very old ones are the
/// bare card object with no wrapper at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEnvelope {
    pub spec: Option<String>,
    pub spec_version: Option<String>,
    pub data: Option<RawCard>,
}

impl RawEnvelope {
    /// Parses a metadata payload, accepting both the enveloped and the bare
    /// legacy layout.
    pub fn parse(payload: &str) -> Result<Self> {
        let envelope: RawEnvelope = serde_json::from_str(payload)?;
        if envelope.data.is_some() {
            return Ok(envelope);
        }
        // Bare legacy payload: the whole object is the card data.
        let card: RawCard = serde_json::from_str(payload)?;
        Ok(RawEnvelope {
            spec: None,
            spec_version: None,
            data: Some(card),
        })
    }
}

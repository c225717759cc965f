//! Text encoding of bridge messages.
//!
//! Decoding is two-step: the tag is read first, and a well-formed object
//! carrying a tag this side does not know decodes to `Ok(None)` so newer peers
//! can add messages. A known tag with a bad payload is an error.

use lull_core::{PlaybackCommand, PlaybackEvent};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};

const COMMAND_TAG: &str = "command";
const EVENT_TAG: &str = "type";

pub fn encode_command(command: &PlaybackCommand) -> BridgeResult<String> {
    Ok(serde_json::to_string(command)?)
}

pub fn encode_event(event: &PlaybackEvent) -> BridgeResult<String> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_command(text: &str) -> BridgeResult<Option<PlaybackCommand>> {
    decode_tagged(text, COMMAND_TAG, PlaybackCommand::TAGS)
}

pub fn decode_event(text: &str) -> BridgeResult<Option<PlaybackEvent>> {
    decode_tagged(text, EVENT_TAG, PlaybackEvent::TAGS)
}

fn decode_tagged<T: DeserializeOwned>(
    text: &str,
    field: &'static str,
    known: &[&str],
) -> BridgeResult<Option<T>> {
    let value: Value = serde_json::from_str(text)?;
    let tag = value
        .get(field)
        .and_then(Value::as_str)
        .ok_or(BridgeError::MissingTag(field))?;

    if !known.contains(&tag) {
        debug!(field, tag, "ignoring unknown message");
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

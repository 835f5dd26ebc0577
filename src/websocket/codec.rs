//! Message Codec
//!
//! JSON text encoding of outbound envelopes and decoding of inbound client
//! frames into [`Command`]s.

use serde_json::{Map, Value};
use thiserror::Error;

use super::messages::{Command, Envelope};

/// An inbound frame could not be turned into a command
///
/// Recoverable: the connection stays open and the sender gets an `error`
/// envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing or non-string `type` field")]
    MissingType,

    #[error("Field `{0}` must be a string")]
    InvalidField(&'static str),
}

/// An outbound envelope could not be serialized
#[derive(Debug, Error)]
#[error("Failed to encode {kind} envelope: {source}")]
pub struct CodecError {
    kind: &'static str,
    #[source]
    source: serde_json::Error,
}

/// Serialize an envelope to its wire text
pub fn encode(envelope: &Envelope) -> Result<String, CodecError> {
    serde_json::to_string(envelope).map_err(|source| CodecError {
        kind: envelope.kind(),
        source,
    })
}

/// Parse a client text frame
///
/// Fails on anything that is not a JSON object with a string `type`.
/// Other fields are only inspected by the commands that use them.
pub fn decode(text: &str) -> Result<Command, DecodeError> {
    let mut fields: Map<String, Value> = serde_json::from_str(text)?;
    let kind = match fields.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(DecodeError::MissingType),
    };

    let command = match kind.as_str() {
        "ping" => Command::Ping,
        "subscribe" => Command::Subscribe {
            user_id: user_id(&mut fields)?,
        },
        "unsubscribe" => Command::Unsubscribe {
            user_id: user_id(&mut fields)?,
        },
        _ => Command::Unknown { kind },
    };

    Ok(command)
}

/// Optional string `userId`; `null` reads as absent
fn user_id(fields: &mut Map<String, Value>) -> Result<Option<String>, DecodeError> {
    match fields.remove("userId") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(_) => Err(DecodeError::InvalidField("userId")),
    }
}

//! The ticket-extraction protocol.
//!
//! The conversational script lives entirely in [`system_policy`]; the model
//! drives the dialogue and, once every field is known, embeds
//! [`TICKET_MARKER`] followed by a one-line JSON object in its reply.
//! [`extract`] is the client half of that contract.

mod policy;
mod types;

pub use policy::system_policy;
pub use types::{Category, Priority, TicketDraft, UnknownVariant};

use thiserror::Error;

/// Literal token that introduces the ticket payload in a completion.
pub const TICKET_MARKER: &str = "TICKET_CREATED:";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("marker is not followed by a JSON object on the same line")]
    MissingPayload,
    #[error("ticket payload does not decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("ticket payload field `{0}` is blank")]
    BlankField(&'static str),
}

/// Outcome of scanning one completion for a ticket payload.
#[derive(Debug)]
pub enum Extraction {
    Found(TicketDraft),
    NotFound,
    Malformed(ExtractionError),
}

impl Extraction {
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }
}

/// Scans `completion` for the first marker and decodes the payload after it.
///
/// Only the remainder of the marker's line is considered. The first JSON
/// value on that line is decoded; any prose following the closing brace is
/// ignored, as are later markers.
pub fn extract(completion: &str) -> Extraction {
    let Some(start) = completion.find(TICKET_MARKER) else {
        return Extraction::NotFound;
    };

    let rest = &completion[start + TICKET_MARKER.len()..];
    let line = rest.split(['\n', '\r']).next().unwrap_or_default().trim_start();
    if !line.starts_with('{') {
        return Extraction::Malformed(ExtractionError::MissingPayload);
    }

    let mut values = serde_json::Deserializer::from_str(line).into_iter::<TicketDraft>();
    match values.next() {
        Some(Ok(draft)) => match draft.first_blank_field() {
            Some(field) => Extraction::Malformed(ExtractionError::BlankField(field)),
            None => Extraction::Found(draft),
        },
        Some(Err(e)) => Extraction::Malformed(ExtractionError::Decode(e)),
        None => Extraction::Malformed(ExtractionError::MissingPayload),
    }
}

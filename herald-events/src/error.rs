//! Error codes shared by events, connections and the registry

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure an event operation can report.
///
/// Success is `Ok(..)`; there is no `Ok` variant. The set is part of the
/// public contract, so it serializes to stable snake_case codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventError {
    #[error("An event is already declared for this identifier")]
    EventAlreadyDefined,

    #[error("Failed to match event type")]
    FailedToMatchEventType,

    #[error("Cannot modify the listener list during a broadcast")]
    ModifyingCallbackListDuringBroadcast,

    #[error("Callback was already added")]
    CallbackAlreadyAdded,

    #[error("Events are blocked")]
    EventsBlocked,

    #[error("Identifier index {0} is out of range")]
    InvalidIdentifier(usize),
}

impl EventError {
    /// Stable code string, matching the serialized form.
    pub fn code(&self) -> &'static str {
        match self {
            EventError::EventAlreadyDefined => "event_already_defined",
            EventError::FailedToMatchEventType => "failed_to_match_event_type",
            EventError::ModifyingCallbackListDuringBroadcast => {
                "modifying_callback_list_during_broadcast"
            }
            EventError::CallbackAlreadyAdded => "callback_already_added",
            EventError::EventsBlocked => "events_blocked",
            EventError::InvalidIdentifier(_) => "invalid_identifier",
        }
    }
}

pub type Result<T> = std::result::Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_matches_serialized_form() {
        let errors = [
            EventError::EventAlreadyDefined,
            EventError::FailedToMatchEventType,
            EventError::ModifyingCallbackListDuringBroadcast,
            EventError::CallbackAlreadyAdded,
            EventError::EventsBlocked,
        ];

        for error in errors {
            let json = serde_json::to_string(&error).unwrap();
            assert_eq!(json, format!("\"{}\"", error.code()));
        }
    }

    #[test]
    fn test_invalid_identifier_carries_index() {
        let error = EventError::InvalidIdentifier(7);
        assert_eq!(error.code(), "invalid_identifier");
        assert_eq!(error.to_string(), "Identifier index 7 is out of range");

        let json = serde_json::to_value(error).unwrap();
        assert_eq!(json, serde_json::json!({ "invalid_identifier": 7 }));
    }

    #[test]
    fn test_display() {
        assert_eq!(EventError::EventsBlocked.to_string(), "Events are blocked");
        assert_eq!(
            EventError::FailedToMatchEventType.to_string(),
            "Failed to match event type"
        );
    }
}

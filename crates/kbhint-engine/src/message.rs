//! Cross-context messages
//!
//! Sent by the popup to the page when a toggle flips.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Message {
    /// `{action: "updateHint", hostname, hintId, enabled}`
    #[serde(rename = "updateHint", rename_all = "camelCase")]
    UpdateHint {
        hostname: String,
        hint_id: String,
        enabled: bool,
    },
}

impl Message {
    pub fn update_hint(hostname: impl Into<String>, hint_id: impl Into<String>, enabled: bool) -> Self {
        Message::UpdateHint {
            hostname: hostname.into(),
            hint_id: hint_id.into(),
            enabled,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Reply sent back to the popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
}

impl Response {
    pub const SUCCESS: Response = Response { success: true };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let msg = Message::from_json(
            r#"{"action":"updateHint","hostname":"www.youtube.com","hintId":"search-input","enabled":false}"#,
        )
        .unwrap();
        assert_eq!(msg, Message::update_hint("www.youtube.com", "search-input", false));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["action"], "updateHint");
        assert_eq!(json["hintId"], "search-input");
        assert_eq!(serde_json::to_string(&Response::SUCCESS).unwrap(), r#"{"success":true}"#);
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(Message::from_json(r#"{"action":"reload"}"#).is_err());
        assert!(Message::from_json(r#"{"action":"updateHint","hostname":"x"}"#).is_err());
    }
}

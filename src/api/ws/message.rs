// src/api/ws/message.rs
// Outbound WebSocket frames. Synthesized audio goes out as a raw binary
// message; everything else is a small structured notice.

use serde::{Deserialize, Serialize};

/// Structured text messages sent from the server to the client.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    Status { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_type_tag() {
        let msg = WsServerMessage::Status {
            message: "try again".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["message"], "try again");
    }
}

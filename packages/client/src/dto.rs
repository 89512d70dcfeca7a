//! Data Transfer Objects exchanged with the chat server.

use serde::{Deserialize, Serialize};

/// A chat message as delivered by the room event stream.
///
/// ```json
/// {"name": "alice", "message": "hello", "timestamp": 1672498800000}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub name: String,
    pub message: String,
    /// Unix timestamp in milliseconds, assigned by the server
    pub timestamp: i64,
}

/// Form-encoded body of `POST /{room}/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendForm {
    pub name: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_deserialize() {
        // テスト項目: サーバーの JSON ペイロードが ChatMessage に変換される
        // given (前提条件):
        let json = r#"{"name":"Bob","message":"hi","timestamp":1000}"#;

        // when (操作):
        let result: ChatMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(result.name, "Bob");
        assert_eq!(result.message, "hi");
        assert_eq!(result.timestamp, 1000);
    }

    #[test]
    fn test_chat_message_missing_field_is_rejected() {
        // テスト項目: timestamp が欠けたペイロードはエラーになる
        // given (前提条件):
        let json = r#"{"name":"Bob","message":"hi"}"#;

        // when (操作):
        let result = serde_json::from_str::<ChatMessage>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }
}

use crate::verse::VerseRecord;
use serde::{Deserialize, Serialize};

/// Request from a UI shell to the server.
///
/// The shell sends the raw user question; prompt templating happens
/// server-side so the marker coupling stays in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub question: String,
}

/// Streaming response chunk sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(rename = "type")]
    pub chunk_type: String,
    pub content: String,

    /// Parsed verse records, present on the final `done` chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verses: Option<Vec<VerseRecord>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamChunk {
    pub fn chunk(content: impl Into<String>) -> Self {
        Self {
            chunk_type: "chunk".to_string(),
            content: content.into(),
            verses: None,
            error: None,
        }
    }

    pub fn done(content: impl Into<String>, verses: Vec<VerseRecord>) -> Self {
        Self {
            chunk_type: "done".to_string(),
            content: content.into(),
            verses: Some(verses),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            chunk_type: "error".to_string(),
            content: String::new(),
            verses: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_wire_shape() {
        let json = serde_json::to_value(StreamChunk::chunk("text")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "chunk", "content": "text" })
        );
    }

    #[test]
    fn test_error_wire_shape() {
        let json = serde_json::to_value(StreamChunk::error("boom")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"], "boom");
    }
}

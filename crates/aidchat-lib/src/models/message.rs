// Transcript message models
// A Message is immutable once it has been appended to a Transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header text carried by every assistant message produced by document analysis
pub const ANALYSIS_HEADER: &str = "Document Analysis Result";

// ============================================================================
// Core Entities
// ============================================================================

/// A single entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Message author role
    pub role: MessageRole,
    /// Display text
    pub content: String,
    /// Structured analysis, present only on document-analysis replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<DocumentAnalysis>,
    /// When the message was created locally
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a user message from raw input (not trimmed)
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into(), None)
    }

    /// Create a plain assistant chat reply
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content.into(), None)
    }

    /// Create an assistant message carrying a document analysis record
    pub fn analysis(analysis: DocumentAnalysis) -> Self {
        Self::new(
            MessageRole::Assistant,
            ANALYSIS_HEADER.to_string(),
            Some(analysis),
        )
    }

    fn new(role: MessageRole, content: String, analysis: Option<DocumentAnalysis>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            analysis,
            created_at: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

/// Structured result of a document analysis.
///
/// Every field is required on the wire; a response missing any of them is
/// rejected instead of being rendered partially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub document_type: String,
    pub sender: String,
    pub recipient: String,
    pub date: String,
    pub key_items: Vec<String>,
    pub summary: String,
    pub suggested_actions: Vec<String>,
}

// ============================================================================
// Enums
// ============================================================================

/// Message author role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            _ => Err(format!("Unknown message role: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis() -> DocumentAnalysis {
        DocumentAnalysis {
            document_type: "official_letter".to_string(),
            sender: "Social Welfare Department".to_string(),
            recipient: "Applicant".to_string(),
            date: "2024-05-01".to_string(),
            key_items: vec!["Deadline".to_string()],
            summary: "Submit documents".to_string(),
            suggested_actions: vec!["Fill out application form".to_string()],
        }
    }

    #[test]
    fn test_user_message_keeps_raw_content() {
        let msg = Message::user("  hello  ");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "  hello  ");
        assert!(msg.analysis.is_none());
    }

    #[test]
    fn test_analysis_message_uses_fixed_header() {
        let msg = Message::analysis(sample_analysis());
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, ANALYSIS_HEADER);
        assert!(msg.analysis.is_some());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::assistant("x");
        let b = Message::assistant("x");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_role_round_trip_through_str() {
        assert_eq!("USER".parse::<MessageRole>(), Ok(MessageRole::User));
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_analysis_rejects_missing_field() {
        let json = r#"{
            "document_type": "letter",
            "sender": "a",
            "recipient": "b",
            "date": "today",
            "key_items": [],
            "summary": "s"
        }"#;
        let parsed: Result<DocumentAnalysis, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }
}

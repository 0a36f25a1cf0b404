//! Data model for notes, topics, and retrieval results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Kind of note, which decides how it is classified and embedded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoteType {
    /// Plain text note; `content` is the user's text.
    #[default]
    Text,
    /// Uploaded image; `content` is a model-generated visual description.
    Image,
    /// Uploaded document (PDF); `content` is a model-generated rewrite.
    Document,
}

impl NoteType {
    /// Whether the note is backed by an uploaded file.
    pub fn is_file_backed(&self) -> bool {
        matches!(self, Self::Image | Self::Document)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Document => "DOCUMENT",
        }
    }
}

impl std::fmt::Display for NoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "IMAGE" => Ok(Self::Image),
            "DOCUMENT" => Ok(Self::Document),
            _ => Err(format!("Invalid note type: {}", s)),
        }
    }
}

/// Current state of a note row, without the embedding column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub topic_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub ai_summary: Option<String>,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub content: Option<String>,
    /// Path relative to the upload root. Set for IMAGE and DOCUMENT notes.
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Content if present and not blank.
    pub fn non_blank_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Final path component of `file_url`, used in prompt metadata.
    pub fn file_name(&self) -> Option<&str> {
        self.file_url
            .as_deref()
            .map(|url| url.rsplit(['/', '\\']).next().unwrap_or(url))
    }
}

// =============================================================================
// TOPIC / USER TYPES
// =============================================================================

/// A user-owned category that notes are classified into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub ai_summary: Option<String>,
    pub is_default: bool,
}

/// The topic a classifier falls back to: the owner's default topic, or the
/// first topic when no default is flagged.
pub fn fallback_topic(topics: &[Topic]) -> Option<&Topic> {
    topics.iter().find(|t| t.is_default).or_else(|| topics.first())
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Validated classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Always one of the topic ids offered to the classifier.
    pub topic_id: Uuid,
    pub ai_summary: String,
    /// Extracted or described content. Only set for IMAGE and DOCUMENT notes.
    pub content: Option<String>,
}

// =============================================================================
// RETRIEVAL TYPES
// =============================================================================

/// Raw row returned by vector search, in ascending distance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarNote {
    pub note: Note,
    pub topic_name: Option<String>,
    pub owner_display_name: Option<String>,
    /// Cosine distance to the query vector, in `[0, 2]`.
    pub distance: f64,
}

/// Public note shape returned from retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub owner_id: Uuid,
    pub owner_display_name: Option<String>,
    pub topic_id: Uuid,
    pub topic_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set for TEXT notes only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Public link for IMAGE and DOCUMENT notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl NoteSummary {
    /// Project a search hit to the public shape.
    ///
    /// `deployment_url` prefixes the `/file/` link built for file-backed notes.
    pub fn from_similar(hit: &SimilarNote, deployment_url: &str) -> Self {
        let note = &hit.note;
        let (content, file_url) = match note.note_type {
            NoteType::Text => (note.content.clone(), None),
            NoteType::Image | NoteType::Document => (
                None,
                note.file_url.as_deref().map(|path| {
                    format!(
                        "{}/file/{}",
                        deployment_url.trim_end_matches('/'),
                        path.trim_start_matches('/')
                    )
                }),
            ),
        };

        Self {
            id: note.id,
            title: note.title.clone(),
            description: note.description.clone(),
            note_type: note.note_type,
            owner_id: note.owner_id,
            owner_display_name: hit.owner_display_name.clone(),
            topic_id: note.topic_id,
            topic_name: hit.topic_name.clone(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            content,
            file_url,
        }
    }
}

/// Retrieval query from an authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRequest {
    pub query: String,
    #[serde(default)]
    pub topic_id: Option<Uuid>,
}

/// Synthesized answer plus the notes it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    pub answer: String,
    pub relevant_notes: Vec<NoteSummary>,
    pub notes_found: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(note_type: NoteType) -> Note {
        Note {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            topic_id: Uuid::new_v4(),
            title: "Chart".to_string(),
            description: Some("Monthly sales".to_string()),
            ai_summary: None,
            note_type,
            content: Some("buy milk eggs bread".to_string()),
            file_url: Some("u1/abc.png".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn topic(name: &str, is_default: bool) -> Topic {
        Topic {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: name.to_string(),
            description: None,
            ai_summary: None,
            is_default,
        }
    }

    #[test]
    fn test_note_type_round_trip_strings() {
        for t in [NoteType::Text, NoteType::Image, NoteType::Document] {
            assert_eq!(t.to_string().parse::<NoteType>().unwrap(), t);
        }
        assert_eq!("image".parse::<NoteType>().unwrap(), NoteType::Image);
        assert!("VIDEO".parse::<NoteType>().is_err());
    }

    #[test]
    fn test_note_type_serializes_uppercase() {
        let json = serde_json::to_string(&NoteType::Document).unwrap();
        assert_eq!(json, "\"DOCUMENT\"");
    }

    #[test]
    fn test_file_backed() {
        assert!(!NoteType::Text.is_file_backed());
        assert!(NoteType::Image.is_file_backed());
        assert!(NoteType::Document.is_file_backed());
    }

    #[test]
    fn test_note_file_name() {
        let n = note(NoteType::Image);
        assert_eq!(n.file_name(), Some("abc.png"));

        let mut bare = note(NoteType::Image);
        bare.file_url = Some("scan.pdf".to_string());
        assert_eq!(bare.file_name(), Some("scan.pdf"));
    }

    #[test]
    fn test_non_blank_content() {
        let mut n = note(NoteType::Text);
        assert_eq!(n.non_blank_content(), Some("buy milk eggs bread"));
        n.content = Some("   \n".to_string());
        assert_eq!(n.non_blank_content(), None);
        n.content = None;
        assert_eq!(n.non_blank_content(), None);
    }

    #[test]
    fn test_fallback_topic_prefers_default() {
        let topics = vec![topic("Shopping", false), topic("General", true)];
        assert_eq!(fallback_topic(&topics).unwrap().name, "General");
    }

    #[test]
    fn test_fallback_topic_uses_first_without_default() {
        let topics = vec![topic("Shopping", false), topic("Work", false)];
        assert_eq!(fallback_topic(&topics).unwrap().name, "Shopping");
        assert!(fallback_topic(&[]).is_none());
    }

    #[test]
    fn test_summary_for_text_note_carries_content() {
        let hit = SimilarNote {
            note: note(NoteType::Text),
            topic_name: Some("Shopping".to_string()),
            owner_display_name: Some("Ada".to_string()),
            distance: 0.1,
        };
        let summary = NoteSummary::from_similar(&hit, "https://notes.example.com");
        assert_eq!(summary.content.as_deref(), Some("buy milk eggs bread"));
        assert!(summary.file_url.is_none());
        assert_eq!(summary.topic_name.as_deref(), Some("Shopping"));
        assert_eq!(summary.owner_display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_summary_for_file_note_builds_link() {
        let hit = SimilarNote {
            note: note(NoteType::Image),
            topic_name: None,
            owner_display_name: None,
            distance: 0.2,
        };
        let summary = NoteSummary::from_similar(&hit, "https://notes.example.com/");
        assert!(summary.content.is_none());
        assert_eq!(
            summary.file_url.as_deref(),
            Some("https://notes.example.com/file/u1/abc.png")
        );
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let hit = SimilarNote {
            note: note(NoteType::Text),
            topic_name: None,
            owner_display_name: None,
            distance: 0.1,
        };
        let json = serde_json::to_value(NoteSummary::from_similar(&hit, "")).unwrap();
        assert!(json.get("ownerId").is_some());
        assert!(json.get("topicId").is_some());
        assert_eq!(json["type"], "TEXT");
        assert!(json.get("fileUrl").is_none());
    }

    #[test]
    fn test_retrieve_request_topic_optional() {
        let req: RetrieveRequest = serde_json::from_str(r#"{"query":"milk"}"#).unwrap();
        assert_eq!(req.query, "milk");
        assert!(req.topic_id.is_none());
    }
}

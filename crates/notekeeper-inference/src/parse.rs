//! Parsing of classifier model output.

use serde::Deserialize;
use uuid::Uuid;

use notekeeper_core::{Classification, Error, NoteType, Result, Topic};

/// Raw classification object as returned by the model.
///
/// Every field is optional so that a partially filled object still parses;
/// [`resolve`] fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResponse {
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Strip surrounding whitespace and a leading ```` ```json ```` / ```` ``` ````
/// plus a trailing ```` ``` ```` fence. The language tag matches in any case.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unfenced = match trimmed.strip_prefix("```") {
        Some(rest) => match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        },
        None => trimmed,
    };
    unfenced.trim_end().trim_end_matches("```").trim()
}

/// Parse model output into a [`ClassificationResponse`].
pub fn parse_classification(raw: &str) -> Result<ClassificationResponse> {
    let body = strip_code_fences(raw);
    serde_json::from_str(body)
        .map_err(|e| Error::Classification(format!("Unparseable classifier output: {}", e)))
}

/// Turn model output into a [`Classification`] that references one of
/// `topics`.
///
/// A missing, malformed, or foreign `topicId` becomes `fallback_topic_id`.
/// A missing `aiSummary` becomes `""`. `content` is kept only for file
/// notes and only when not blank.
pub fn resolve(
    response: ClassificationResponse,
    topics: &[Topic],
    note_type: NoteType,
    fallback_topic_id: Uuid,
) -> Classification {
    let topic_id = response
        .topic_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
        .filter(|id| topics.iter().any(|t| t.id == *id))
        .unwrap_or(fallback_topic_id);

    let content = if note_type.is_file_backed() {
        response.content.filter(|c| !c.trim().is_empty())
    } else {
        None
    };

    Classification {
        topic_id,
        ai_summary: response.ai_summary.unwrap_or_default(),
        content,
    }
}

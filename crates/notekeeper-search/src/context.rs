//! Context block handed to the answer-synthesis prompt.

use notekeeper_core::SimilarNote;

/// Format search hits as numbered notes, in the order given.
///
/// Topic is omitted when the note has no resolvable topic name; summary and
/// content are omitted when empty.
pub fn build_notes_context(hits: &[SimilarNote]) -> String {
    let mut context = String::from("RELEVANT NOTES:\n===============\n\n");

    for (i, hit) in hits.iter().enumerate() {
        let note = &hit.note;
        context.push_str(&format!("Note {}:\n", i + 1));
        context.push_str(&format!("Title: {}\n", note.title));

        if let Some(topic) = hit.topic_name.as_deref().filter(|t| !t.is_empty()) {
            context.push_str(&format!("Topic: {}\n", topic));
        }
        if let Some(summary) = note.ai_summary.as_deref().filter(|s| !s.trim().is_empty()) {
            context.push_str(&format!("Summary: {}\n", summary));
        }
        if let Some(content) = note.non_blank_content() {
            context.push_str(&format!("Content: {}\n", content));
        }
        context.push('\n');
    }

    context
}

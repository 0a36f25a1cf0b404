//! Prompt templates for note classification and answer synthesis.
//!
//! Every classification prompt asks for a bare JSON object with `topicId`,
//! `aiSummary` and (for files) `content`. Models still wrap the object in
//! code fences now and then; [`crate::parse`] strips those.

use notekeeper_core::{Note, NoteType, Topic};

// =============================================================================
// SYSTEM PROMPTS
// =============================================================================

/// System prompt for text-modality classification.
pub const TEXT_SYSTEM_PROMPT: &str = r#"You are an intelligent note classification assistant specialized in categorizing user notes.
Your task is to analyze note content and classify it into the most appropriate topic from a provided list.

CLASSIFICATION RULES:
1. Carefully analyze the note content and understand its main theme
2. Match the note to ONE topic that best fits its content
3. Consider topic name, description, and AI summary when making your decision
4. If no topic clearly matches the content, choose the DEFAULT topic
5. ALWAYS return a valid topic ID from the provided list
6. For TEXT notes: analyze the full text content
7. For IMAGE and DOCUMENT notes: rely on filename, title, and description
8. Prioritize exact matches over partial matches
9. When uncertain between two topics, choose the more general one

SUMMARY REQUIREMENTS:
Create a concise summary (2-3 sentences, max 200 characters) describing:
- The main idea or theme of the note
- Key points or information
- Context or purpose

OUTPUT FORMAT:
You must respond with a JSON object containing topicId and aiSummary fields.
CRITICAL: Return ONLY the raw JSON object without any markdown code blocks or formatting.
Do NOT wrap the response in ```json or ``` tags.
The response must start directly with { and end with }.

Example format (return exactly like this without any extra characters):
{
  "topicId": "d290f1ee-6c54-4b01-90e6-d701748f0851",
  "aiSummary": "Meeting notes discussing Q4 project deliverables and team assignments."
}
"#;

/// System prompt for image-modality classification.
pub const IMAGE_SYSTEM_PROMPT: &str = r#"You are an intelligent note classification assistant with vision capabilities.
Analyze both the image content and metadata to classify notes accurately.

CLASSIFICATION RULES:
1. Carefully analyze the image visual content to understand its main theme
2. Consider the image context along with title and description
3. Match the note to ONE topic that best fits its content
4. Consider topic name, description, and AI summary when making your decision
5. If no topic clearly matches, choose the DEFAULT topic
6. ALWAYS return a valid topic ID from the provided list
7. Prioritize visual content over text metadata when there's a clear match
8. For ambiguous images, use metadata to help decide

SUMMARY REQUIREMENTS:
Create a concise summary (2-3 sentences, max 200 characters) describing:
- What you see in the image
- The main subject or theme
- Key visual elements

CONTENT EXTRACTION:
Provide a detailed description of the image (3-5 sentences) that captures:
- All visible elements and objects in the image
- Colors, composition, and layout
- Text or labels if present
- Context and setting
- Any notable details or patterns

OUTPUT FORMAT:
You must respond with a JSON object containing topicId, aiSummary, and content fields.
CRITICAL: Return ONLY the raw JSON object without any markdown code blocks or formatting.
Do NOT wrap the response in ```json or ``` tags.
The response must start directly with { and end with }.

Example format (return exactly like this without any extra characters):
{
  "topicId": "d290f1ee-6c54-4b01-90e6-d701748f0851",
  "aiSummary": "An image showing a sunset over mountains with vibrant orange and purple colors.",
  "content": "The image depicts a sunset over a mountain range. The sky shows gradients of orange, purple, and pink. Dark mountain silhouettes fill the foreground. A few thin clouds catch the warm light."
}
"#;

/// System prompt for document-modality classification.
pub const DOCUMENT_SYSTEM_PROMPT: &str = r##"You are an intelligent note classification assistant with document analysis capabilities.
Analyze both the document content and metadata to classify notes accurately.

CLASSIFICATION RULES:
1. Carefully read and analyze the document content to understand its main theme and purpose
2. Consider document structure, headings, key terms, and overall context
3. Match the note to ONE topic that best fits its content
4. Consider topic name, description, and AI summary when making your decision
5. If no topic clearly matches, choose the DEFAULT topic
6. ALWAYS return a valid topic ID from the provided list
7. Prioritize document content over filename and metadata
8. For technical documents, look for specific terminology and domain-specific language
9. Consider the document type (report, presentation, form, etc.) in your analysis

SUMMARY REQUIREMENTS:
Create a concise summary (2-3 sentences, max 200 characters) describing:
- The main topic or purpose of the document
- Key points or findings
- Document type and context

CONTENT EXTRACTION:
Extract and rewrite the entire document content in a clear, structured format:
- Preserve all headings, sections, and structure
- Include all key information and data points
- Maintain the logical flow and organization
- Convert visual elements (tables, charts) to text descriptions
- Keep important details, numbers, and terminology

OUTPUT FORMAT:
You must respond with a JSON object containing topicId, aiSummary, and content fields.
CRITICAL: Return ONLY the raw JSON object without any markdown code blocks or formatting.
Do NOT wrap the response in ```json or ``` tags.
The response must start directly with { and end with }.

Example format (return exactly like this without any extra characters):
{
  "topicId": "d290f1ee-6c54-4b01-90e6-d701748f0851",
  "aiSummary": "Technical report on cloud migration strategies, covering cost analysis and implementation timeline.",
  "content": "# Cloud Migration Strategy Report\n\n## Executive Summary\nThis report outlines the proposed migration approach...\n\n## Cost Analysis\n- Infrastructure costs: $50,000\n- Migration effort: 6 months"
}
"##;

/// System prompt for answering a question from retrieved notes.
pub const ANSWER_SYSTEM_PROMPT: &str = r#"You are an intelligent assistant helping users find information from their personal notes.
Your task is to answer the user's question based ONLY on the provided notes context.

IMPORTANT RULES:
1. Use ONLY information from the provided notes
2. If the notes don't contain enough information to answer, say so clearly
3. Be concise and direct in your answer (2-4 sentences)
4. Cite specific notes when referencing information
5. If multiple notes have relevant info, synthesize them into a coherent answer
6. Do NOT make up or infer information not present in the notes
7. Maintain a helpful and professional tone

RESPONSE FORMAT:
- Start with a direct answer to the question
- Support with specific details from the notes
- If information is incomplete, mention what's missing
"#;

/// System prompt for a classification modality.
pub fn system_prompt(modality: Modality) -> &'static str {
    match modality {
        Modality::Text => TEXT_SYSTEM_PROMPT,
        Modality::Image => IMAGE_SYSTEM_PROMPT,
        Modality::Document => DOCUMENT_SYSTEM_PROMPT,
    }
}

/// How the classifier presents a note to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Metadata plus text content.
    Text,
    /// Metadata plus the image bytes.
    Image,
    /// Metadata plus the document bytes.
    Document,
}

impl Modality {
    /// File modality matching a note type, `None` for TEXT.
    pub fn for_file(note_type: NoteType) -> Option<Self> {
        match note_type {
            NoteType::Text => None,
            NoteType::Image => Some(Self::Image),
            NoteType::Document => Some(Self::Document),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Document => "document",
        }
    }
}

// =============================================================================
// PROMPT BLOCKS
// =============================================================================

/// `NOTE METADATA` block: type, then title, description and filename when set.
pub fn note_metadata(note: &Note) -> String {
    let mut metadata = String::from("NOTE METADATA:\n=============\n");
    metadata.push_str(&format!("Type: {}\n", note.note_type));

    if !note.title.is_empty() {
        metadata.push_str(&format!("Title: {}\n", note.title));
    }
    if let Some(description) = note.description.as_deref().filter(|d| !d.is_empty()) {
        metadata.push_str(&format!("Description: {}\n", description));
    }
    if let Some(file_url) = note.file_url.as_deref() {
        metadata.push_str(&format!("Filename: {}\n", file_url));
    }
    metadata
}

/// `CONTENT` block. Empty unless the note is TEXT with content.
pub fn content_block(note: &Note) -> String {
    match (note.note_type, note.content.as_deref()) {
        (NoteType::Text, Some(content)) => format!("\nCONTENT:\n========\n{}", content),
        _ => String::new(),
    }
}

/// `AVAILABLE TOPICS` block followed by the selection task.
pub fn topics_block(topics: &[Topic]) -> String {
    let mut block = String::from("\nAVAILABLE TOPICS:\n=================\n\n");

    for topic in topics {
        block.push_str(&format!("ID: {}\n", topic.id));
        block.push_str(&format!("Name: {}\n", topic.name));
        if let Some(description) = topic.description.as_deref().filter(|d| !d.is_empty()) {
            block.push_str(&format!("Description: {}\n", description));
        }
        if let Some(summary) = topic.ai_summary.as_deref().filter(|s| !s.is_empty()) {
            block.push_str(&format!("AI Summary: {}\n", summary));
        }
        block.push_str(&format!(
            "Default: {}\n\n",
            if topic.is_default { "YES" } else { "NO" }
        ));
    }

    block.push_str("TASK:\n");
    block.push_str("Select the most appropriate topic ID from the list above.\n");
    block.push_str("If no topic clearly matches, choose the DEFAULT topic.\n");
    block
}

// =============================================================================
// USER PROMPTS
// =============================================================================

/// User prompt for text-modality classification.
pub fn text_user_prompt(metadata: &str, content: &str, topics: &str) -> String {
    format!(
        "Analyze the following note information and classify it into one of the available topics.\n\
         Also create a brief summary of the note content.\n\
         \n\
         IMPORTANT: Return ONLY a valid JSON object without markdown formatting.\n\
         Do not use ```json or ``` code blocks.\n\
         Start your response with {{ and end with }}.\n\
         \n\
         {metadata}\n\
         \n\
         {content}\n\
         \n\
         {topics}\n"
    )
}

/// User prompt sent alongside an attached image or document.
pub fn file_user_prompt(note_type: NoteType, metadata: &str, topics: &str) -> String {
    format!(
        "Analyze this {kind} and classify it into the most appropriate topic.\n\
         Also create a brief summary and extract the content.\n\
         \n\
         {metadata}\n\
         \n\
         {topics}\n\
         \n\
         IMPORTANT: Return ONLY a valid JSON object without any markdown formatting or code blocks.\n\
         Do not wrap the JSON in ```json or ``` tags.\n\
         The response must start with {{ and end with }}.\n",
        kind = note_type.as_str().to_lowercase(),
    )
}

/// User prompt for answer synthesis.
pub fn answer_user_prompt(query: &str, notes_context: &str) -> String {
    format!(
        "User Question: {query}\n\
         \n\
         {notes_context}\n\
         \n\
         Please answer the user's question based on the notes provided above.\n\
         Return ONLY the answer text without any additional formatting.\n"
    )
}

//! Prompt construction for the verse generation endpoint.

/// Marker token the model is instructed to prefix each verse with.
///
/// The parser in [`crate::verse`] scans for this exact token, so the template
/// below and the parser cannot drift apart.
pub const VERSE_MARKER: &str = "Krishna:";

/// Builds the generation prompt embedding the user's question.
pub fn build_prompt(context: &str) -> String {
    format!(
        "Krishna, can you generate a verse from Bhagavad Gita on this context of {context}. Clearly label with \"{VERSE_MARKER}\"."
    )
}

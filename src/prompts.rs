//! Prompt template for the per-entry cleanup pass.
//!
//! The template is kept here, away from the call site in
//! [`crate::pipeline::llm`], so it can be inspected in unit tests without a
//! live model.

/// Build the cleanup instruction for one entry.
///
/// The model is asked to repair OCR damage, put each sentence on its own
/// line, keep the listed proper nouns as written, and reply with the
/// corrected text only.
pub fn cleanup_prompt(entry: &str, language_hint: &str, proper_nouns: &[String]) -> String {
    let nouns = proper_nouns.join(", ");
    format!(
        "Here is the output from an OCR software, scanning journal entries.\n\
It's messy. Fix it as best as you can: make it well formatted pure text, and restore broken\n\
sentences and words. Answer with the final corrected text only. If a sentence is nonsensical,\n\
ignore it (or make it sensible if you can). Make sure each sentence is on a single line.\n\
\n\
Language Hint: {language_hint}\n\
\n\
Some personal words to keep exactly as written: {nouns}\n\
\n\
{entry}\n\
\n\
PLEASE ONLY RESPOND WITH THE CORRECTED TEXT. NO OTHER TEXT.\n"
    )
}

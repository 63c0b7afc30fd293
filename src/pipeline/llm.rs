//! Completion call for a single journal entry.
//!
//! The template lives in [`crate::prompts`] and the
//! provider behind [`CompletionService`]. One user message goes out, the
//! first choice comes back verbatim. There is no retry and no validation of
//! the reply; errors propagate to the orchestrator.

use crate::config::CleanupConfig;
use crate::error::Result;
use crate::pipeline::segment::Entry;
use crate::prompts::cleanup_prompt;
use crate::services::{Completion, CompletionService, Message};
use std::time::Instant;
use tracing::debug;

/// Build the message list sent for one entry.
pub fn build_messages(entry: &Entry, config: &CleanupConfig) -> Vec<Message> {
    vec![Message::user(cleanup_prompt(
        &entry.text,
        &config.language_hint,
        &config.proper_nouns,
    ))]
}

/// Ask the completion service to repair one entry.
pub async fn clean_entry(
    service: &dyn CompletionService,
    entry: &Entry,
    config: &CleanupConfig,
) -> Result<Completion> {
    let start = Instant::now();
    let messages = build_messages(entry, config);
    let completion = service.complete(&messages, config.max_tokens).await?;
    debug!(
        "Entry {}: {} words in, {} chars out, {:?}",
        entry.index,
        entry.word_count(),
        completion.text.len(),
        start.elapsed()
    );
    Ok(completion)
}

use std::sync::Arc;

use fixchain_core::TextCompletion;

pub const DEFAULT_TITLE: &str = "New Chat";
pub const MAX_TITLE_CHARS: usize = 50;

const MAX_TITLE_WORDS: usize = 6;
const FILLER_WORDS: &[&str] = &[
    "my", "the", "a", "an", "is", "are", "was", "were", "have", "has", "had", "help", "me", "with",
];

const TITLE_PROMPT: &str = "Generate a concise 3-5 word title for this repair request. \
Only return the title, nothing else. \
Examples: 'iPhone 12 Screen Repair', 'MacBook Battery Issue', 'Samsung Galaxy Display'";

/// Names a session after its first message.
#[derive(Clone, Default)]
pub struct TitleGenerator {
    completion: Option<Arc<dyn TextCompletion>>,
}

impl TitleGenerator {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self {
            completion: Some(completion),
        }
    }

    /// Generator that only ever uses [`heuristic_title`].
    pub fn heuristic() -> Self {
        Self { completion: None }
    }

    pub async fn generate(&self, first_message: &str) -> String {
        if let Some(completion) = &self.completion {
            let prompt = format!("{TITLE_PROMPT}\n\nRequest: {}", first_message.trim());
            match completion.complete(&prompt).await {
                Ok(text) => {
                    if let Some(title) = clean_title(&text) {
                        return title;
                    }
                    tracing::warn!("completion returned an empty title, using heuristic");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "could not generate a title, using heuristic");
                }
            }
        }
        heuristic_title(first_message)
    }
}

fn clean_title(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let title = line.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace());
    if title.is_empty() {
        return None;
    }
    Some(truncate(title))
}

/// Title built from the message itself: filler words dropped (unless the
/// message is three words or fewer), at most six words, each capitalized.
pub fn heuristic_title(message: &str) -> String {
    let words: Vec<&str> = message.split_whitespace().collect();
    let short = words.len() <= 3;
    let important: Vec<&str> = words
        .iter()
        .copied()
        .filter(|word| short || !FILLER_WORDS.contains(&word.to_lowercase().as_str()))
        .collect();
    let chosen = if important.is_empty() { &words } else { &important };

    let title = chosen
        .iter()
        .take(MAX_TITLE_WORDS)
        .map(|word| capitalize(word))
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    truncate(&title)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let head: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_output_is_unquoted() {
        assert_eq!(
            clean_title("\"PS5 Fan Noise\"\n"),
            Some("PS5 Fan Noise".to_string())
        );
        assert_eq!(clean_title("  ''  "), None);
    }

    #[test]
    fn long_titles_are_cut_to_fifty_chars() {
        let title = truncate(&"x".repeat(80));
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.ends_with("..."));
    }
}

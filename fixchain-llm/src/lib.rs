mod gemini;

pub use gemini::{GeminiClient, DEFAULT_GEMINI_MODEL, GEMINI_BASE_URL};

// LinguaVox proxy - a Gemini-shaped front for Groq chat completions

pub mod api;
pub mod config;
pub mod ratelimit;

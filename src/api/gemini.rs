// Gemini-shaped client contract
//
// Extraction is deliberately permissive: a missing field at any level
// degrades to its default instead of failing the request.

use serde_json::{json, Value};

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// What the proxy actually needs from an inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f64,
}

/// Pull prompt and generation settings out of the Gemini envelope.
pub fn extract_input(raw: &Value) -> GenerationInput {
    let prompt = raw
        .get("contents")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("parts"))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let generation_config = raw.get("generationConfig");

    let max_output_tokens = generation_config
        .and_then(|c| c.get("maxOutputTokens"))
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS);

    // An explicit temperature of 0 is meaningful and must survive.
    let temperature = generation_config
        .and_then(|c| c.get("temperature"))
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_TEMPERATURE);

    GenerationInput {
        prompt,
        max_output_tokens,
        temperature,
    }
}

/// Wrap completion text as a single Gemini candidate.
pub fn success_envelope(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [{ "text": text }],
                "role": "model"
            },
            "finishReason": "STOP"
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_request_extracts_all_fields() {
        let raw = json!({
            "contents": [{ "parts": [{ "text": "Translate bonjour" }] }],
            "generationConfig": { "maxOutputTokens": 256, "temperature": 0.7 }
        });
        let input = extract_input(&raw);
        assert_eq!(input.prompt, "Translate bonjour");
        assert_eq!(input.max_output_tokens, 256);
        assert_eq!(input.temperature, 0.7);
    }

    #[test]
    fn missing_generation_config_falls_back_to_defaults() {
        let raw = json!({ "contents": [{ "parts": [{ "text": "hi" }] }] });
        let input = extract_input(&raw);
        assert_eq!(input.max_output_tokens, DEFAULT_MAX_OUTPUT_TOKENS);
        assert_eq!(input.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn out_of_range_max_output_tokens_degrades_to_default() {
        let raw = json!({
            "contents": [{ "parts": [{ "text": "hi" }] }],
            "generationConfig": { "maxOutputTokens": 4_294_968_320u64 }
        });
        assert_eq!(
            extract_input(&raw).max_output_tokens,
            DEFAULT_MAX_OUTPUT_TOKENS
        );
    }

    #[test]
    fn explicit_zero_temperature_is_preserved() {
        let raw = json!({
            "contents": [{ "parts": [{ "text": "hi" }] }],
            "generationConfig": { "temperature": 0.0 }
        });
        assert_eq!(extract_input(&raw).temperature, 0.0);
    }

    #[test]
    fn absent_prompt_degrades_to_empty_string() {
        assert_eq!(extract_input(&json!({})).prompt, "");
        assert_eq!(extract_input(&json!({ "contents": [] })).prompt, "");
        assert_eq!(
            extract_input(&json!({ "contents": [{ "parts": [] }] })).prompt,
            ""
        );
    }

    #[test]
    fn success_envelope_has_fixed_finish_reason() {
        let envelope = success_envelope("Bonjour");
        assert_eq!(
            envelope["candidates"][0]["content"]["parts"][0]["text"],
            "Bonjour"
        );
        assert_eq!(envelope["candidates"][0]["finishReason"], "STOP");
    }
}

//! Cost and duration heuristics for audio processing.
//!
//! These are estimates for side-by-side comparison, not billed amounts.
//! Duration is derived from byte size under a 1 MiB ≈ 60 seconds rule of
//! thumb for compressed speech audio.

/// Bytes assumed to hold one minute of compressed speech.
const BYTES_PER_MINUTE: f64 = 1024.0 * 1024.0;

/// Per-minute transcription rates in USD, keyed by provider id.
const WHISPER_RATE_PER_MINUTE: f64 = 0.006;
const SPEECH_RATE_PER_MINUTE: f64 = 0.006;
const DEFAULT_RATE_PER_MINUTE: f64 = 0.006;

/// Estimate audio duration in minutes from byte size.
pub fn estimate_duration_minutes(byte_len: usize) -> f64 {
    byte_len as f64 / BYTES_PER_MINUTE
}

/// Estimate transcription cost in USD for a provider and byte size.
pub fn estimate_cost_usd(provider_id: &str, byte_len: usize) -> f64 {
    let rate = match provider_id {
        "whisper" => WHISPER_RATE_PER_MINUTE,
        "speech" => SPEECH_RATE_PER_MINUTE,
        _ => DEFAULT_RATE_PER_MINUTE,
    };
    estimate_duration_minutes(byte_len) * rate
}

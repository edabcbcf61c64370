//! Speech-to-text transcription.
//!
//! Recordings longer than the provider's per-call ceiling are cut into
//! overlapping segments first (see [`crate::audio`]); per-segment transcripts
//! are stitched back together in segment order.

mod openai;

pub use openai::OpenAiTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Hook applied to a stitched transcript before it is returned.
///
/// Adjacent segments overlap in time, so their transcripts repeat roughly the
/// overlap window's worth of words at each internal boundary. That
/// duplication is deliberately left in place; callers that want to
/// deduplicate (or otherwise clean the text) plug in here.
pub type TranscriptPostProcessor = Box<dyn Fn(String) -> String + Send + Sync>;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file to plain text, segmenting it first when it
    /// exceeds the provider's duration ceiling.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Join per-segment transcripts in segment order with a separating line break.
pub fn stitch_transcripts(parts: &[String]) -> String {
    parts
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stitch_joins_in_order() {
        let parts = vec![
            "first segment".to_string(),
            "second segment".to_string(),
            "third".to_string(),
        ];
        assert_eq!(
            stitch_transcripts(&parts),
            "first segment\nsecond segment\nthird"
        );
    }

    #[test]
    fn test_stitch_skips_blank_segments() {
        let parts = vec!["a".to_string(), "  ".to_string(), "b".to_string()];
        assert_eq!(stitch_transcripts(&parts), "a\nb");
    }

    #[test]
    fn test_boundary_overlap_is_kept() {
        // Known limitation: the tail of one segment and the head of the next
        // cover the same audio, so the stitched text repeats those words.
        // The duplication is bounded by the overlap window per boundary.
        let parts = vec![
            "the quick brown fox jumps".to_string(),
            "fox jumps over the lazy dog".to_string(),
        ];
        let stitched = stitch_transcripts(&parts);
        assert_eq!(stitched.matches("fox jumps").count(), 2);
    }
}

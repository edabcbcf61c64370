//! OpenAI speech-to-text transcription implementation.

use super::{stitch_transcripts, Transcriber, TranscriptPostProcessor};
use crate::audio::{probe_duration, segmentation_available, split_audio};
use crate::error::{KorpusError, Result};
use async_openai::error::OpenAIError;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// OpenAI-backed transcriber with proactive and reactive segmentation.
pub struct OpenAiTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_segment_seconds: f64,
    overlap_seconds: f64,
    post_processor: Option<TranscriptPostProcessor>,
}

impl OpenAiTranscriber {
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        max_segment_seconds: f64,
        overlap_seconds: f64,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            max_segment_seconds,
            overlap_seconds,
            post_processor: None,
        }
    }

    /// Install a hook applied to the stitched transcript. Segment-boundary
    /// duplication is left alone by default; dedup belongs here if wanted.
    pub fn with_post_processor(mut self, hook: TranscriptPostProcessor) -> Self {
        self.post_processor = Some(hook);
        self
    }

    /// Transcribe a single file in one provider call (no segmentation).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<String> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| KorpusError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(classify_api_error)?;

        Ok(response.text)
    }

    /// Cut the recording into overlapping segments and transcribe them
    /// sequentially. Segments are stitched in order, so out-of-order
    /// completion would corrupt the transcript; sequential execution avoids
    /// needing a reordering buffer.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_segmented(&self, audio_path: &Path) -> Result<String> {
        let temp_dir = tempfile::tempdir()?;
        let segments = split_audio(
            audio_path,
            temp_dir.path(),
            self.max_segment_seconds,
            self.overlap_seconds,
        )
        .await?;

        if segments.len() == 1 {
            return self.transcribe_single(audio_path).await;
        }

        info!("Transcribing {} segments with {}", segments.len(), self.model);

        let pb = ProgressBar::new(segments.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Transcribe [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        let mut parts = Vec::with_capacity(segments.len());
        for segment in &segments {
            match self.transcribe_single(&segment.path).await {
                Ok(text) => {
                    pb.inc(1);
                    parts.push(text);
                }
                Err(e) => {
                    pb.finish_and_clear();
                    drop(temp_dir);
                    return Err(KorpusError::Transcription(format!(
                        "Segment at {:.0}s of {} failed: {}",
                        segment.start_seconds,
                        audio_path.display(),
                        e
                    )));
                }
            }
        }
        pb.finish_and_clear();

        // Segment files are removed here on every path, success or error.
        drop(temp_dir);

        Ok(stitch_transcripts(&parts))
    }
}

/// The calls the segmentation trigger policy dispatches between, split from
/// the provider client so the policy is testable without ffmpeg or the
/// network.
#[async_trait]
trait TranscribeOps: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<f64>;
    async fn whole_file(&self, path: &Path) -> Result<String>;
    async fn segmented(&self, path: &Path) -> Result<String>;
    fn segment_ceiling(&self) -> f64;
    fn can_segment(&self) -> bool;
}

/// Decide between whole-file and segmented transcription.
///
/// A known duration over the ceiling segments proactively. When the duration
/// cannot be determined the file goes out whole, and a provider rejection
/// earns exactly one forced segmented retry, provided the cutting toolchain
/// is present. Any other error propagates unchanged.
async fn transcribe_with_policy(ops: &dyn TranscribeOps, path: &Path) -> Result<String> {
    match ops.probe(path).await {
        Ok(duration) if duration > ops.segment_ceiling() => {
            info!(
                "Duration {:.0}s exceeds ceiling {:.0}s, segmenting",
                duration,
                ops.segment_ceiling()
            );
            ops.segmented(path).await
        }
        Ok(_) => ops.whole_file(path).await,
        Err(probe_err) => {
            warn!("Duration probe failed ({}), attempting unsegmented", probe_err);
            match ops.whole_file(path).await {
                Err(KorpusError::TranscriptionRejected(msg)) if ops.can_segment() => {
                    warn!("Provider rejected file ({}), retrying segmented", msg);
                    ops.segmented(path).await
                }
                other => other,
            }
        }
    }
}

#[async_trait]
impl TranscribeOps for OpenAiTranscriber {
    async fn probe(&self, path: &Path) -> Result<f64> {
        probe_duration(path).await
    }

    async fn whole_file(&self, path: &Path) -> Result<String> {
        self.transcribe_single(path).await
    }

    async fn segmented(&self, path: &Path) -> Result<String> {
        self.transcribe_segmented(path).await
    }

    fn segment_ceiling(&self) -> f64 {
        self.max_segment_seconds
    }

    fn can_segment(&self) -> bool {
        segmentation_available()
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let transcript = transcribe_with_policy(self, audio_path).await?;

        Ok(match &self.post_processor {
            Some(hook) => hook(transcript),
            None => transcript,
        })
    }
}

/// Map a provider error, distinguishing a duration/size rejection (which is
/// recoverable by segmenting) from everything else.
fn classify_api_error(err: OpenAIError) -> KorpusError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    let rejected = lower.contains("longer than")
        || lower.contains("audio duration")
        || lower.contains("maximum content size")
        || lower.contains("too large");
    if rejected {
        KorpusError::TranscriptionRejected(msg)
    } else {
        KorpusError::OpenAI(format!("Transcription API error: {}", msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeOps {
        duration: Option<f64>,
        reject_whole: bool,
        reject_segmented: bool,
        segmentation: bool,
        whole_calls: AtomicUsize,
        segmented_calls: AtomicUsize,
    }

    impl FakeOps {
        fn new(duration: Option<f64>) -> Self {
            Self {
                duration,
                reject_whole: false,
                reject_segmented: false,
                segmentation: true,
                whole_calls: AtomicUsize::new(0),
                segmented_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscribeOps for FakeOps {
        async fn probe(&self, _path: &Path) -> Result<f64> {
            self.duration
                .ok_or_else(|| KorpusError::ToolNotFound("ffprobe".to_string()))
        }

        async fn whole_file(&self, _path: &Path) -> Result<String> {
            self.whole_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_whole {
                Err(KorpusError::TranscriptionRejected("too long".to_string()))
            } else {
                Ok("whole transcript".to_string())
            }
        }

        async fn segmented(&self, _path: &Path) -> Result<String> {
            self.segmented_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_segmented {
                Err(KorpusError::TranscriptionRejected("still too long".to_string()))
            } else {
                Ok("stitched transcript".to_string())
            }
        }

        fn segment_ceiling(&self) -> f64 {
            1250.0
        }

        fn can_segment(&self) -> bool {
            self.segmentation
        }
    }

    #[tokio::test]
    async fn test_long_known_duration_segments_proactively() {
        let ops = FakeOps::new(Some(1300.0));
        let text = transcribe_with_policy(&ops, Path::new("a.mp3")).await.unwrap();
        assert_eq!(text, "stitched transcript");
        assert_eq!(ops.whole_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ops.segmented_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_known_duration_goes_whole() {
        let ops = FakeOps::new(Some(600.0));
        let text = transcribe_with_policy(&ops, Path::new("a.mp3")).await.unwrap();
        assert_eq!(text, "whole transcript");
        assert_eq!(ops.segmented_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejection_after_failed_probe_retries_segmented_once() {
        let mut ops = FakeOps::new(None);
        ops.reject_whole = true;

        let text = transcribe_with_policy(&ops, Path::new("a.mp3")).await.unwrap();
        assert_eq!(text, "stitched transcript");
        assert_eq!(ops.whole_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ops.segmented_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_without_toolchain_propagates() {
        let mut ops = FakeOps::new(None);
        ops.reject_whole = true;
        ops.segmentation = false;

        let result = transcribe_with_policy(&ops, Path::new("a.mp3")).await;
        assert!(matches!(result, Err(KorpusError::TranscriptionRejected(_))));
        assert_eq!(ops.segmented_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_segmented_rejection_is_not_retried_again() {
        let mut ops = FakeOps::new(None);
        ops.reject_whole = true;
        ops.reject_segmented = true;

        let result = transcribe_with_policy(&ops, Path::new("a.mp3")).await;
        assert!(matches!(result, Err(KorpusError::TranscriptionRejected(_))));
        assert_eq!(ops.whole_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ops.segmented_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejection_classification() {
        let err = OpenAIError::InvalidArgument(
            "Audio duration is longer than 1500 seconds".to_string(),
        );
        assert!(matches!(
            classify_api_error(err),
            KorpusError::TranscriptionRejected(_)
        ));

        let err = OpenAIError::InvalidArgument("model not found".to_string());
        assert!(matches!(classify_api_error(err), KorpusError::OpenAI(_)));
    }
}

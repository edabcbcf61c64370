//! Audio duration probing and segmentation.
//!
//! Long recordings are cut into overlapping time segments so each piece stays
//! under the transcription provider's per-call duration ceiling. This module
//! decides how many segments there are and where the cut points go; cutting
//! itself is delegated to ffmpeg with a stream copy (no re-encode).

use crate::error::{KorpusError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// A planned time window within a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    /// Offset of the segment start from the beginning of the file, seconds.
    pub start_seconds: f64,
    /// Length of the segment, seconds.
    pub duration_seconds: f64,
}

/// A materialized segment file. The file lives inside a directory owned by
/// the caller (typically a `tempfile::TempDir`), which removes it on drop.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    pub path: PathBuf,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Compute segment windows for a recording of `duration` seconds.
///
/// A recording at or under the ceiling yields a single whole-file window.
/// Otherwise a window of `max_segment_seconds` slides in steps of
/// `max - overlap` (overlap clamped below the window), the final window is
/// clipped to the remaining duration, and the slide stops once a window
/// would start at or past the end.
pub fn plan_segments(
    duration: f64,
    max_segment_seconds: f64,
    overlap_seconds: f64,
) -> Vec<SegmentPlan> {
    if duration <= max_segment_seconds {
        return vec![SegmentPlan {
            start_seconds: 0.0,
            duration_seconds: duration,
        }];
    }

    let overlap = overlap_seconds.min(max_segment_seconds - 1.0).max(0.0);
    let step = max_segment_seconds - overlap;

    let mut plans = Vec::new();
    let mut start = 0.0;
    while start < duration {
        let len = max_segment_seconds.min(duration - start);
        plans.push(SegmentPlan {
            start_seconds: start,
            duration_seconds: len,
        });
        start += step;
    }
    plans
}

/// Check whether the segmentation toolchain (ffmpeg + ffprobe) is present.
///
/// Callers use this as an explicit capability flag instead of probing at
/// every call site.
pub fn segmentation_available() -> bool {
    tool_works("ffmpeg") && tool_works("ffprobe")
}

fn tool_works(name: &str) -> bool {
    std::process::Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Query the duration of an audio file using ffprobe with JSON output.
///
/// A missing tool is `ToolNotFound`; output without a parsable duration is
/// `DurationUnknown`.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KorpusError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(KorpusError::ToolFailed(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(KorpusError::DurationUnknown(format!(
            "ffprobe returned error for {}",
            path.display()
        )));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str).map_err(|_| {
        KorpusError::DurationUnknown(format!("invalid ffprobe output for {}", path.display()))
    })?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            KorpusError::DurationUnknown(format!("no duration field for {}", path.display()))
        })
}

/// Cut a recording into overlapping segment files inside `output_dir`.
///
/// The caller owns `output_dir` and is responsible for removing it (and the
/// segments in it) on every exit path; a `tempfile::TempDir` does exactly
/// that.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    max_segment_seconds: f64,
    overlap_seconds: f64,
) -> Result<Vec<AudioSegment>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let plans = plan_segments(total_duration, max_segment_seconds, overlap_seconds);
    if plans.len() == 1 {
        return Ok(vec![AudioSegment {
            path: source.to_path_buf(),
            start_seconds: 0.0,
            duration_seconds: total_duration,
        }]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let extension = source
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("mp3");

    let mut segments = Vec::with_capacity(plans.len());
    for (idx, plan) in plans.iter().enumerate() {
        let segment_path = output_dir.join(format!("{}_{:04}.{}", base_name, idx, extension));
        extract_segment(source, &segment_path, plan.start_seconds, plan.duration_seconds).await?;
        debug!(
            "Created segment {} at offset {:.1}s ({:.1}s long)",
            idx, plan.start_seconds, plan.duration_seconds
        );
        segments.push(AudioSegment {
            path: segment_path,
            start_seconds: plan.start_seconds,
            duration_seconds: plan.duration_seconds,
        });
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Base ffmpeg invocation for one cut window. Output options and the
/// destination path come from the caller, in that order.
fn ffmpeg_cut(source: &Path, start: f64, length: f64) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-ss").arg(format!("{start:.3}"))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{length:.3}"))
        .arg("-y");
    cmd
}

/// Cut one time window out of the source file.
///
/// A stream copy keeps the original codec; sources whose packets cannot be
/// cut at the requested offset get re-encoded to MP3 instead.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let copied = ffmpeg_cut(source, start, length)
        .arg("-c").arg("copy")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if matches!(copied, Ok(status) if status.success()) && dest.exists() {
        return Ok(());
    }

    warn!("Stream copy failed at {:.1}s, re-encoding segment", start);

    let encoded = ffmpeg_cut(source, start, length)
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encoded {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => Err(KorpusError::ToolFailed(format!(
            "re-encode of segment at {:.1}s of {} failed: {}",
            start,
            source.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(KorpusError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(KorpusError::ToolFailed(format!(
            "ffmpeg failed on segment at {:.1}s: {}",
            start, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_recording_single_segment() {
        let plans = plan_segments(600.0, 1250.0, 10.0);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].start_seconds, 0.0);
        assert_eq!(plans[0].duration_seconds, 600.0);
    }

    #[test]
    fn test_exact_ceiling_single_segment() {
        let plans = plan_segments(1250.0, 1250.0, 10.0);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].duration_seconds, 1250.0);
    }

    #[test]
    fn test_one_second_over_no_overlap() {
        let plans = plan_segments(1251.0, 1250.0, 0.0);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].duration_seconds, 1250.0);
        assert_eq!(plans[1].start_seconds, 1250.0);
        assert_eq!(plans[1].duration_seconds, 1.0);
        let total: f64 = plans.iter().map(|p| p.duration_seconds).sum();
        assert_eq!(total, 1251.0);
    }

    #[test]
    fn test_1300s_recording_with_overlap() {
        let plans = plan_segments(1300.0, 1250.0, 10.0);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].start_seconds, 0.0);
        assert_eq!(plans[0].duration_seconds, 1250.0);
        assert_eq!(plans[1].start_seconds, 1240.0);
        assert_eq!(plans[1].duration_seconds, 60.0);
    }

    #[test]
    fn test_overlap_clamped_below_window() {
        // An overlap >= the window would make the slide stand still.
        let plans = plan_segments(300.0, 100.0, 500.0);
        assert!(plans.len() >= 2);
        for pair in plans.windows(2) {
            assert!(pair[1].start_seconds > pair[0].start_seconds);
        }
    }

    #[test]
    fn test_windows_cover_whole_duration() {
        let plans = plan_segments(5000.0, 1250.0, 10.0);
        assert_eq!(plans[0].start_seconds, 0.0);
        for pair in plans.windows(2) {
            // Next window starts before the previous one ends.
            assert!(
                pair[1].start_seconds < pair[0].start_seconds + pair[0].duration_seconds
            );
        }
        let last = plans.last().unwrap();
        assert_eq!(last.start_seconds + last.duration_seconds, 5000.0);
    }
}

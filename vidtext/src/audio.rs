use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Sample rate whisper.cpp expects.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// 8 hours at 16kHz mono f32 is already ~1.8 GB.
const MAX_AUDIO_DURATION_SECS: f64 = 8.0 * 3600.0;

/// Decode an audio/video file into 16kHz mono f32 samples via ffmpeg.
pub fn load_audio(path: &Path) -> Result<Vec<f32>> {
    info!(path = %path.display(), "loading audio");

    if !path.exists() {
        return Err(Error::AudioNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new("ffmpeg")
        .args(["-nostdin", "-threads", "0", "-i"])
        .arg(path)
        .args(["-f", "s16le", "-ac", "1", "-acodec", "pcm_s16le", "-ar"])
        .arg(WHISPER_SAMPLE_RATE.to_string())
        .arg("-")
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::AudioDecode("ffmpeg not found — install with: apt install ffmpeg".into())
            } else {
                Error::AudioDecode(format!("failed to run ffmpeg: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // ffmpeg prints the actual failure last
        let start = stderr.char_indices().rev().nth(499).map_or(0, |(i, _)| i);
        return Err(Error::AudioDecode(format!(
            "unsupported or corrupt audio, ffmpeg failed: {}",
            &stderr[start..]
        )));
    }

    let samples = pcm_s16le_to_f32(&output.stdout);
    if samples.is_empty() {
        return Err(Error::AudioDecode("ffmpeg produced no audio samples".into()));
    }

    let duration = samples.len() as f64 / WHISPER_SAMPLE_RATE as f64;
    debug!(samples = samples.len(), duration_secs = format!("{duration:.1}"), "decoded audio");

    if duration > MAX_AUDIO_DURATION_SECS {
        return Err(Error::AudioDecode(format!(
            "audio too long ({duration:.0}s) — maximum supported duration is {MAX_AUDIO_DURATION_SECS:.0}s"
        )));
    }

    Ok(samples)
}

/// Raw signed 16-bit little-endian PCM to f32 in [-1.0, 1.0). A trailing odd byte is ignored.
fn pcm_s16le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_pcm_conversion() {
        let bytes = [0x00, 0x00, 0xff, 0x7f, 0x00, 0x80, 0x01];
        let samples = pcm_s16le_to_f32(&bytes);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 32767.0 / 32768.0).abs() < 1e-6);
        assert_eq!(samples[2], -1.0);
    }

    #[test]
    fn test_pcm_conversion_empty() {
        assert!(pcm_s16le_to_f32(&[]).is_empty());
        assert!(pcm_s16le_to_f32(&[0x01]).is_empty());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_audio(&PathBuf::from("/nonexistent/../../etc/audio.wav"));
        assert!(matches!(result.unwrap_err(), Error::AudioNotFound { .. }));
    }

    #[test]
    fn test_load_rejects_non_audio_file() {
        let tmp = std::env::temp_dir().join("vidtext_test_not_audio.txt");
        std::fs::write(&tmp, "this is not audio").unwrap();
        let result = load_audio(&tmp);
        assert!(matches!(result.unwrap_err(), Error::AudioDecode(_)));
        std::fs::remove_file(&tmp).ok();
    }
}

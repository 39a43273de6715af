//! Media acquisition through yt-dlp.
//!
//! URLs are checked to be http(s), arguments are passed without a shell,
//! `--no-exec` disables yt-dlp post-processing commands, and every file
//! yt-dlp reports must lie inside the requested output directory.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Subtitle languages requested from yt-dlp, in preference order.
const CAPTION_LANGS: &str = "en,en-US,en.*";

const AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "ogg", "m4a", "opus", "flac"];

/// Result of downloading audio from a URL.
#[derive(Debug)]
pub struct DownloadResult {
    pub audio_path: PathBuf,
    pub title: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
}

/// Only http:// and https:// are accepted.
pub fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else if trimmed.is_empty() {
        Err(Error::InvalidOption("no video URL provided".into()))
    } else {
        Err(Error::InvalidOption(format!(
            "invalid URL (must start with http:// or https://): {trimmed}"
        )))
    }
}

async fn ensure_ytdlp() -> Result<()> {
    Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await
        .map(|_| ())
        .map_err(|_| Error::YtDlpNotFound)
}

fn output_template(output_dir: &Path, name: &str) -> Result<String> {
    output_dir
        .join(name)
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Download("output directory path contains invalid UTF-8".into()))
}

fn stderr_excerpt(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).chars().take(1000).collect()
}

/// Download the English captions of a video as raw WebVTT text.
///
/// Manual subtitles are preferred; auto-generated ones are used when no
/// manual track exists. Fails with [`Error::CaptionsNotFound`] when yt-dlp
/// writes no subtitle file.
pub async fn fetch_captions(url: &str, output_dir: &Path) -> Result<String> {
    validate_url(url)?;
    ensure_ytdlp().await?;
    info!(%url, "fetching captions");

    std::fs::create_dir_all(output_dir)?;
    let template = output_template(output_dir, "captions.%(ext)s")?;

    let output = Command::new("yt-dlp")
        .args([
            "--skip-download",
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            CAPTION_LANGS,
            "--sub-format",
            "vtt",
            "--no-playlist",
            "--no-exec",
            "--no-warnings",
            "--output",
            &template,
        ])
        .arg(url)
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::Download(format!(
            "yt-dlp failed: {}",
            stderr_excerpt(&output.stderr)
        )));
    }

    let Some(path) = find_file_with_extension(output_dir, &["vtt"])? else {
        return Err(Error::CaptionsNotFound { url: url.to_string() });
    };
    validate_path_in_dir(&path, output_dir)?;

    let captions = tokio::fs::read_to_string(&path).await?;
    debug!(path = %path.display(), bytes = captions.len(), "captions downloaded");
    Ok(captions)
}

/// Download the best audio stream of a video as WAV.
pub async fn download_audio(url: &str, output_dir: &Path) -> Result<DownloadResult> {
    validate_url(url)?;
    ensure_ytdlp().await?;
    info!(%url, "downloading audio");

    std::fs::create_dir_all(output_dir)?;
    let template = output_template(output_dir, "%(id)s.%(ext)s")?;

    let info_output = Command::new("yt-dlp")
        .args(["--dump-json", "--no-download", "--no-exec", "--no-playlist"])
        .arg(url)
        .output()
        .await?;
    let info: Option<YtDlpInfo> = if info_output.status.success() {
        serde_json::from_slice(&info_output.stdout).ok()
    } else {
        None
    };

    let output = Command::new("yt-dlp")
        .args([
            "--extract-audio",
            "--audio-format",
            "wav",
            "--audio-quality",
            "0",
            "--no-playlist",
            "--no-exec",
            "--output",
            &template,
            "--print",
            "after_move:filepath",
        ])
        .arg(url)
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::Download(format!(
            "yt-dlp failed: {}",
            stderr_excerpt(&output.stderr)
        )));
    }

    let printed = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let audio_path = if printed.is_empty() {
        find_file_with_extension(output_dir, &AUDIO_EXTENSIONS)?
            .ok_or_else(|| Error::Download("no audio file found after download".into()))?
    } else {
        PathBuf::from(printed)
    };
    validate_path_in_dir(&audio_path, output_dir)?;

    if !audio_path.exists() {
        return Err(Error::Download(format!(
            "downloaded file not found at {}",
            audio_path.display()
        )));
    }
    debug!(path = %audio_path.display(), "audio downloaded");

    let (title, duration) = info.map_or((None, None), |i| (i.title, i.duration));
    Ok(DownloadResult {
        audio_path,
        title,
        duration,
    })
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir => {}
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

fn validate_path_in_dir(path: &Path, expected_dir: &Path) -> Result<()> {
    let canonical_dir = expected_dir
        .canonicalize()
        .unwrap_or_else(|_| normalize_path(expected_dir));
    let canonical_path = path.canonicalize().unwrap_or_else(|_| normalize_path(path));

    if canonical_path.starts_with(&canonical_dir) {
        Ok(())
    } else {
        warn!(
            path = %path.display(),
            expected_dir = %expected_dir.display(),
            "downloaded file path outside expected directory"
        );
        Err(Error::Download(
            "downloaded file path is outside the expected output directory".into(),
        ))
    }
}

/// Most recently modified file in `dir` with one of `extensions`.
fn find_file_with_extension(dir: &Path, extensions: &[&str]) -> Result<Option<PathBuf>> {
    let mut best: Option<(PathBuf, SystemTime)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if !matches {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if best.as_ref().is_none_or(|(_, t)| modified > *t) {
            best = Some((path, modified));
        }
    }

    Ok(best.map(|(p, _)| p))
}

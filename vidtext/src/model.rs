//! Local cache of whisper.cpp ggml models.

use std::io::Write;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::config::Model;
use crate::error::{Error, Result};

const HUGGINGFACE_BASE: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Anything smaller is an error page, not a ggml model.
const MIN_MODEL_BYTES: u64 = 1_000_000;

/// A model file found in the cache directory.
#[derive(Debug, Clone)]
pub struct CachedModel {
    pub path: PathBuf,
    pub size: u64,
    /// Catalog entry the file belongs to, if it is one of the downloadable models.
    pub model: Option<Model>,
}

impl CachedModel {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Directory holding downloaded models, one `ggml-<name>.bin` per model.
#[derive(Debug, Clone)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `model` lives; custom models are used in place.
    pub fn path_for(&self, model: &Model) -> PathBuf {
        match model {
            Model::Custom(path) => path.clone(),
            _ => self.dir.join(model.filename()),
        }
    }

    /// Path to a usable copy of `model`, downloading it first if it is not cached.
    pub async fn ensure(&self, model: &Model) -> Result<PathBuf> {
        let path = self.path_for(model);
        if path.exists() {
            debug!(path = %path.display(), "model already cached");
            return Ok(path);
        }
        if let Model::Custom(_) = model {
            return Err(Error::ModelNotFound { path });
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Model(format!("failed to create cache dir {}: {e}", self.dir.display()))
        })?;

        let url = format!("{HUGGINGFACE_BASE}/{}", model.filename());
        info!(%url, "downloading model");
        fetch(&url, &path).await?;
        Ok(path)
    }

    /// Completed model files (`*.bin`), sorted by name. A missing directory is an empty cache.
    pub fn list(&self) -> Vec<CachedModel> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut models: Vec<CachedModel> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "bin"))
            .map(|e| {
                let path = e.path();
                CachedModel {
                    size: e.metadata().map(|m| m.len()).unwrap_or(0),
                    model: catalog_entry(&path),
                    path,
                }
            })
            .collect();
        models.sort_by(|a, b| a.path.cmp(&b.path));
        models
    }
}

/// Ensure `model` is available in `cache_dir`, downloading it if necessary.
pub async fn ensure_model(model: &Model, cache_dir: &Path) -> Result<PathBuf> {
    ModelCache::new(cache_dir).ensure(model).await
}

fn catalog_entry(path: &Path) -> Option<Model> {
    let name = path
        .file_name()?
        .to_str()?
        .strip_prefix("ggml-")?
        .strip_suffix(".bin")?;
    Model::parse_name(name)
}

/// Stream `url` into `<dest>.part`, then move it into place.
async fn fetch(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await?
        .error_for_status()
        .map_err(|e| Error::ModelDownload(format!("HTTP error: {e}")))?;
    let expected = response.content_length().unwrap_or(0);

    let bar = ProgressBar::new(expected);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    bar.set_message(format!("Downloading {}", url.rsplit('/').next().unwrap_or(url)));

    let part = dest.with_extension("bin.part");
    let written = match write_stream(response, &part, &bar).await {
        Ok(n) => n,
        Err(e) => {
            std::fs::remove_file(&part).ok();
            bar.abandon_with_message("Download failed");
            return Err(e);
        }
    };

    if written < MIN_MODEL_BYTES {
        std::fs::remove_file(&part).ok();
        bar.abandon_with_message("Download failed");
        return Err(Error::ModelDownload(format!(
            "downloaded file too small ({written} bytes), likely an error page"
        )));
    }
    if expected > 0 && written != expected {
        warn!(expected, actual = written, "model size differs from Content-Length");
    }

    std::fs::rename(&part, dest)?;
    bar.finish_with_message("Download complete");
    info!(path = %dest.display(), size = written, "model saved");
    Ok(())
}

async fn write_stream(response: reqwest::Response, path: &Path, bar: &ProgressBar) -> Result<u64> {
    let mut file = std::fs::File::create(path)?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        written += chunk.len() as u64;
        bar.set_position(written);
    }
    file.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_cache(name: &str) -> ModelCache {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        ModelCache::new(dir)
    }

    #[test]
    fn test_list_missing_dir() {
        assert!(ModelCache::new("/nonexistent/path").list().is_empty());
    }

    #[test]
    fn test_list_finds_completed_models() {
        let cache = scratch_cache("vidtext_test_list_cache");
        fs::write(cache.dir().join("ggml-tiny.bin"), b"fake model").unwrap();
        fs::write(cache.dir().join("ggml-base.bin"), b"fake").unwrap();
        fs::write(cache.dir().join("ggml-small.bin.part"), b"partial").unwrap();
        fs::write(cache.dir().join("my-finetune.bin"), b"custom").unwrap();
        fs::write(cache.dir().join("readme.txt"), b"not a model").unwrap();

        let models = cache.list();
        let names: Vec<String> = models.iter().map(CachedModel::file_name).collect();
        assert_eq!(names, vec!["ggml-base.bin", "ggml-tiny.bin", "my-finetune.bin"]);
        assert_eq!(models[0].size, 4);
        assert_eq!(models[0].model, Some(Model::Base));
        assert_eq!(models[2].model, None);

        fs::remove_dir_all(cache.dir()).ok();
    }

    #[test]
    fn test_path_for() {
        let cache = ModelCache::new("/models");
        assert_eq!(cache.path_for(&Model::SmallEn), PathBuf::from("/models/ggml-small.en.bin"));
        let custom = PathBuf::from("/elsewhere/tuned.bin");
        assert_eq!(cache.path_for(&Model::Custom(custom.clone())), custom);
    }

    #[tokio::test]
    async fn test_ensure_custom_not_found() {
        let model = Model::Custom(PathBuf::from("/nonexistent/model.bin"));
        let err = ensure_model(&model, Path::new("/unused")).await.unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
    }

    #[tokio::test]
    async fn test_ensure_uses_cache() {
        let cache = scratch_cache("vidtext_test_model_cache");
        let path = cache.dir().join("ggml-tiny.bin");
        fs::write(&path, b"fake cached model").unwrap();

        assert_eq!(cache.ensure(&Model::Tiny).await.unwrap(), path);

        fs::remove_dir_all(cache.dir()).ok();
    }
}

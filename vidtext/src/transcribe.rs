use std::path::Path;

use tracing::{debug, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::WHISPER_SAMPLE_RATE;
use crate::config::{Language, TranscribeOptions};
use crate::error::{Error, Result};
use crate::types::{Segment, Transcript, Word};

/// Whisper timestamps are in centiseconds.
fn centis_to_secs(t: i64) -> f64 {
    t as f64 / 100.0
}

/// Control tokens such as `[_BEG_]` or `<|en|>` carry no speech.
fn is_special_token(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.starts_with('[') || trimmed.starts_with('<')
}

fn load_context(model_path: &Path, options: &TranscribeOptions) -> Result<WhisperContext> {
    info!(model = %model_path.display(), "loading whisper model");
    let model_path = model_path
        .to_str()
        .ok_or_else(|| Error::Model("model path contains invalid UTF-8".into()))?;

    let mut ctx_params = WhisperContextParameters::new();
    ctx_params.use_gpu(options.gpu);
    ctx_params.gpu_device(options.gpu_device as i32);
    Ok(WhisperContext::new_with_params(model_path, ctx_params)?)
}

/// Decoding parameters; whisper's own console output stays off.
fn decode_params(options: &TranscribeOptions) -> FullParams<'_, '_> {
    let strategy = options.beam_size.map_or(
        SamplingStrategy::Greedy { best_of: 5 },
        |beam_size| SamplingStrategy::BeamSearch {
            beam_size: beam_size as i32,
            patience: -1.0,
        },
    );
    let mut params = FullParams::new(strategy);

    if let Language::Code { code, .. } = &options.language {
        params.set_language(Some(code.as_str()));
    } else {
        params.set_detect_language(true);
    }
    params.set_translate(options.translate);
    params.set_token_timestamps(options.word_timestamps);
    params.set_temperature(options.temperature);
    if let Some(n) = options.n_threads {
        params.set_n_threads(n as i32);
    }
    if options.vad {
        params.enable_vad(true);
    }
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    params
}

/// Run whisper.cpp over 16kHz mono f32 samples.
///
/// Segments whose text is empty after trimming are left out, so the
/// transcript's [`Transcript::text`] is exactly the spoken text.
pub fn transcribe_samples(
    samples: &[f32],
    model_path: &Path,
    options: &TranscribeOptions,
) -> Result<Transcript> {
    let ctx = load_context(model_path, options)?;
    let mut state = ctx.create_state()?;
    let params = decode_params(options);

    info!(samples = samples.len(), "running transcription");
    state.full(params, samples)?;

    let num_segments = state.full_n_segments();
    debug!(num_segments, "transcription complete");

    let mut segments = Vec::with_capacity(num_segments.max(0) as usize);
    for i in 0..num_segments {
        let segment = state
            .get_segment(i)
            .ok_or_else(|| Error::Transcription(format!("segment {i} not found")))?;

        let text = segment
            .to_str_lossy()
            .map_err(|e| Error::Transcription(format!("segment text error: {e}")))?
            .trim()
            .to_string();
        if text.is_empty() {
            continue;
        }

        let words = options.word_timestamps.then(|| {
            (0..segment.n_tokens())
                .filter_map(|t| segment.get_token(t))
                .filter_map(|token| {
                    let text = token.to_str_lossy().ok()?.into_owned();
                    if is_special_token(&text) {
                        return None;
                    }
                    let data = token.token_data();
                    Some(Word {
                        text,
                        start: centis_to_secs(data.t0),
                        end: centis_to_secs(data.t1),
                        probability: data.p,
                    })
                })
                .collect::<Vec<_>>()
        });

        segments.push(Segment {
            start: centis_to_secs(segment.start_timestamp()),
            end: centis_to_secs(segment.end_timestamp()),
            text,
            speaker_turn: segment.next_segment_speaker_turn(),
            no_speech_probability: segment.no_speech_probability(),
            words,
        });
    }

    if segments.is_empty() {
        warn!(num_segments, "whisper produced no speech");
    }

    let language = whisper_rs::get_lang_str(state.full_lang_id_from_state())
        .unwrap_or("unknown")
        .to_string();

    Ok(Transcript {
        segments,
        language,
        duration: samples.len() as f64 / WHISPER_SAMPLE_RATE as f64,
        model: options.model.name().to_string(),
        source_url: None,
        source_title: None,
    })
}

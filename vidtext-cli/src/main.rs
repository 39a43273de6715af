use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vidtext::model::ModelCache;
use vidtext::{
    GoogleTranslator, HuggingFaceSummarizer, Language, Model, SummarizeOptions, TranscribeOptions,
    TranslateOptions,
};

#[derive(Parser)]
#[command(
    name = "vidtext",
    version,
    about = "Fetch, transcribe, summarize and translate video text"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a video's captions.
    Subtitle {
        url: String,

        #[arg(short, long, default_value = "text")]
        format: SubtitleFormat,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Transcribe audio/video from a URL or local file.
    Transcribe(TranscribeArgs),

    /// Summarize text from a file or stdin.
    Summarize {
        /// Input file, `-` or omitted for stdin.
        file: Option<PathBuf>,

        /// The text is known to be too long to cover in full.
        #[arg(long)]
        long: bool,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,

        /// Hugging Face inference endpoint.
        #[arg(long, default_value = vidtext::backend::DEFAULT_SUMMARIZER_URL)]
        api_url: String,

        /// Hugging Face API token.
        #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
        hf_token: Option<String>,

        /// Per-request timeout in seconds.
        #[arg(long, default_value = "120")]
        timeout: u64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Translate text from a file or stdin.
    Translate {
        /// Input file, `-` or omitted for stdin.
        file: Option<PathBuf>,

        /// Target language code (e.g. "de", "es").
        #[arg(long)]
        to: String,

        /// Source language code.
        #[arg(long, default_value = "auto")]
        from: String,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,

        /// Per-request timeout in seconds.
        #[arg(long, default_value = "120")]
        timeout: u64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List whisper models, or download one.
    Models {
        /// Download a model without transcribing.
        #[arg(long, value_name = "NAME")]
        download: Option<String>,

        /// Model cache directory.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// List languages supported for transcription.
    Languages,
}

#[derive(Args)]
struct OutputArgs {
    /// Write output to file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct TranscribeArgs {
    /// URL or local file path to transcribe.
    input: String,

    #[arg(short, long, default_value = "text")]
    format: TranscriptFormat,

    /// Whisper model name or path to a .ggml file.
    #[arg(short, long, default_value = "base")]
    model: String,

    /// Language code (e.g. "en", "de") or "auto" for detection.
    #[arg(short, long, default_value = "auto")]
    language: String,

    /// Translate speech to English.
    #[arg(long)]
    translate: bool,

    /// Enable word-level timestamps.
    #[arg(long)]
    word_timestamps: bool,

    /// Disable GPU acceleration.
    #[arg(long)]
    no_gpu: bool,

    /// Number of threads (default: auto).
    #[arg(long)]
    threads: Option<u32>,

    /// Beam search size (default: greedy).
    #[arg(long)]
    beam_size: Option<u32>,

    /// Model cache directory.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Clone, ValueEnum)]
enum SubtitleFormat {
    /// WebVTT as downloaded.
    Raw,
    Srt,
    /// Cleaned paragraphs.
    Text,
}

#[derive(Clone, ValueEnum)]
enum TranscriptFormat {
    Text,
    Srt,
    Vtt,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vidtext=info".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e}");
        if matches!(e, vidtext::Error::UnsupportedLanguage(_)) {
            eprintln!("Use `vidtext languages` to see supported languages");
        }
        std::process::exit(1);
    }
}

async fn run(command: Command) -> vidtext::Result<()> {
    match command {
        Command::Subtitle { url, format, output } => {
            let raw = vidtext::fetch_subtitles(&url).await?;
            let text = match format {
                SubtitleFormat::Raw => raw,
                SubtitleFormat::Srt => vidtext::to_indexed_format(&raw),
                SubtitleFormat::Text => vidtext::normalize(&raw).text() + "\n",
            };
            write_output(&output, &text)
        }

        Command::Transcribe(args) => transcribe(args).await,

        Command::Summarize {
            file,
            long,
            json,
            api_url,
            hf_token,
            timeout,
            output,
        } => {
            let text = read_input(file.as_ref())?;
            let mut summarizer =
                HuggingFaceSummarizer::new(api_url).timeout(Duration::from_secs(timeout));
            if let Some(token) = hf_token {
                summarizer = summarizer.token(token);
            }

            let result =
                vidtext::summarize(&summarizer, &text, long, &SummarizeOptions::default()).await?;
            if result.is_fallback {
                eprintln!("Summarizer unavailable, produced an extractive summary instead");
            }
            let rendered = if json {
                serde_json::to_string_pretty(&result)? + "\n"
            } else {
                result.text() + "\n"
            };
            write_output(&output, &rendered)
        }

        Command::Translate {
            file,
            to,
            from,
            json,
            timeout,
            output,
        } => {
            let text = read_input(file.as_ref())?;
            let translator = GoogleTranslator::new()
                .source(from)
                .timeout(Duration::from_secs(timeout));

            let result =
                vidtext::translate(&translator, &text, &to, &TranslateOptions::default()).await?;
            if result.is_partial() {
                eprintln!(
                    "Translated {} of {} chunks; the rest were left out",
                    result.chunks_translated, result.chunks_total
                );
            }
            let rendered = if json {
                serde_json::to_string_pretty(&result)? + "\n"
            } else {
                result.translated_text + "\n"
            };
            write_output(&output, &rendered)
        }

        Command::Models {
            download,
            cache_dir,
        } => {
            let cache = ModelCache::new(
                cache_dir.unwrap_or_else(|| TranscribeOptions::default().resolve_cache_dir()),
            );
            match download {
                Some(name) => {
                    let model = Model::parse_name(&name).ok_or_else(|| {
                        vidtext::Error::InvalidOption(format!(
                            "unknown model: {name} (run `vidtext models` to list them)"
                        ))
                    })?;
                    let path = cache.ensure(&model).await?;
                    println!("Model ready: {}", path.display());
                }
                None => list_models(&cache),
            }
            Ok(())
        }

        Command::Languages => {
            println!("{:<6} LANGUAGE", "CODE");
            println!("{:<6} --------", "----");
            for (code, name) in Language::supported() {
                println!("{code:<6} {name}");
            }
            Ok(())
        }
    }
}

async fn transcribe(args: TranscribeArgs) -> vidtext::Result<()> {
    let model = match Model::parse_name(&args.model) {
        Some(m) => m,
        None => {
            let path = PathBuf::from(&args.model);
            if !path.exists() {
                return Err(vidtext::Error::InvalidOption(format!(
                    "unknown model: {} (run `vidtext models`, or pass a path to a .ggml file)",
                    args.model
                )));
            }
            Model::Custom(path)
        }
    };

    let mut opts = TranscribeOptions::new()
        .model(model)
        .language(&args.language)?
        .translate(args.translate)
        .word_timestamps(args.word_timestamps)
        .gpu(!args.no_gpu);
    if let Some(n) = args.threads {
        opts = opts.n_threads(n)?;
    }
    if let Some(size) = args.beam_size {
        opts = opts.beam_size(size)?;
    }
    if let Some(dir) = args.cache_dir {
        opts = opts.cache_dir(dir);
    }

    let is_url = args.input.starts_with("http://") || args.input.starts_with("https://");
    let transcript = if is_url {
        vidtext::transcribe_with_options(&args.input, &opts).await?
    } else {
        vidtext::transcribe_file_with_options(&args.input, &opts).await?
    };

    eprintln!(
        "Transcription complete: {:.1}s of audio, {} segments, language: {}",
        transcript.duration,
        transcript.segments.len(),
        transcript.language,
    );

    let text = match args.format {
        TranscriptFormat::Text => transcript.text() + "\n",
        TranscriptFormat::Srt => transcript.to_srt(),
        TranscriptFormat::Vtt => transcript.to_vtt(),
        TranscriptFormat::Json => transcript.to_json_pretty()? + "\n",
    };
    write_output(&args.output, &text)
}

fn list_models(cache: &ModelCache) {
    let cached = cache.list();

    println!("{:<16} {:<9} CACHED", "MODEL", "SIZE");
    println!("{:<16} {:<9} ------", "-----", "----");
    for (model, size) in Model::CATALOG.iter() {
        let mark = if cached.iter().any(|c| c.model.as_ref() == Some(model)) {
            "yes"
        } else {
            ""
        };
        println!("{:<16} {size:<9} {mark}", model.name());
    }

    if !cached.is_empty() {
        println!("\nCached models in {}:", cache.dir().display());
        for model in cached {
            println!("  {} ({})", model.file_name(), format_bytes(model.size));
        }
    }
}

/// Read the whole input file, or stdin for `-` or no file.
fn read_input(file: Option<&PathBuf>) -> vidtext::Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn write_output(output: &OutputArgs, text: &str) -> vidtext::Result<()> {
    match &output.output {
        Some(path) => {
            std::fs::write(path, text)?;
            eprintln!("Written to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.0} MB", bytes as f64 / 1_000_000.0)
    } else {
        format!("{:.0} KB", bytes as f64 / 1_000.0)
    }
}

//! Summarize a text file, then translate the summary.
//!
//! Usage: HF_API_TOKEN=hf_... cargo run --example summarize -- notes.txt de

use vidtext::{GoogleTranslator, HuggingFaceSummarizer, SummarizeOptions, TranslateOptions};

#[tokio::main]
async fn main() -> vidtext::Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args.next().expect("usage: summarize <text-file> [target-lang]");
    let target = args.next().unwrap_or_else(|| "de".into());

    let text = std::fs::read_to_string(path)?;

    let mut summarizer = HuggingFaceSummarizer::default();
    if let Ok(token) = std::env::var("HF_API_TOKEN") {
        summarizer = summarizer.token(token);
    }

    let summary = vidtext::summarize(&summarizer, &text, false, &SummarizeOptions::default()).await?;
    println!("{}\n", summary.text());

    let translated = vidtext::translate(
        &GoogleTranslator::new(),
        &summary.summary,
        &target,
        &TranslateOptions::default(),
    )
    .await?;
    println!("{}", translated.translated_text);

    Ok(())
}

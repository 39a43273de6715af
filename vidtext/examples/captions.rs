//! Fetch a video's captions and print them as SRT and as cleaned paragraphs.
//!
//! Usage: cargo run --example captions -- https://www.youtube.com/watch?v=...

#[tokio::main]
async fn main() -> vidtext::Result<()> {
    let url = std::env::args()
        .nth(1)
        .expect("usage: captions <video-url>");

    let raw = vidtext::fetch_subtitles(&url).await?;

    println!("=== SRT ===\n{}", vidtext::to_indexed_format(&raw));
    println!("=== Text ===\n{}", vidtext::normalize(&raw));

    Ok(())
}

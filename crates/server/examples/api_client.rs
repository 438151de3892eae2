//! Example client for the filegate HTTP API
//!
//! Run the server, then:
//!
//! ```text
//! cargo run -p filegate-server --example api_client -- [report.docx] [memo.mp3]
//! ```
//!
//! Two generated PNGs are always sent to `/images-to-pdf`; pass a Word
//! document and/or an MP3 to exercise the other routes.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::io::Cursor;
use std::path::Path;

const SERVER_URL: &str = "http://localhost:5000";
const USERNAME: &str = "owner";
const PASSWORD: &str = "owner";

fn sample_png(rgb: [u8; 3]) -> anyhow::Result<Vec<u8>> {
    let img = image::RgbImage::from_pixel(64, 48, image::Rgb(rgb));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

async fn file_part(path: &Path) -> anyhow::Result<Part> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(Part::bytes(tokio::fs::read(path).await?).file_name(name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Example 1: Health check
    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 2: Missing credentials
    println!("2. Unauthenticated Request:");
    let resp = client
        .post(format!("{SERVER_URL}/images-to-pdf"))
        .multipart(Form::new())
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 3: Images to PDF
    println!("3. Images to PDF:");
    let form = Form::new()
        .part("files", Part::bytes(sample_png([200, 30, 30])?).file_name("red.png"))
        .part("files", Part::bytes(sample_png([30, 30, 200])?).file_name("blue.png"));
    let resp = client
        .post(format!("{SERVER_URL}/images-to-pdf"))
        .basic_auth(USERNAME, Some(PASSWORD))
        .multipart(form)
        .send()
        .await?;
    let status = resp.status();
    let body = resp.bytes().await?;
    println!("Status: {status}");
    if status.is_success() {
        tokio::fs::write("images.pdf", &body).await?;
        println!("Wrote images.pdf ({} bytes)", body.len());
    } else {
        println!("Body: {}", String::from_utf8_lossy(&body));
    }
    println!();

    // Example 4: Word to PDF
    if let Some(doc) = args.first() {
        println!("4. Word to PDF:");
        let form = Form::new().part("file", file_part(Path::new(doc)).await?);
        let resp = client
            .post(format!("{SERVER_URL}/word-to-pdf"))
            .basic_auth(USERNAME, Some(PASSWORD))
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        println!("Status: {status}");
        if status.is_success() {
            tokio::fs::write("document.pdf", &body).await?;
            println!("Wrote document.pdf ({} bytes)", body.len());
        } else {
            println!("Body: {}", String::from_utf8_lossy(&body));
        }
        println!();
    }

    // Example 5: Audio to text
    if let Some(audio) = args.get(1) {
        println!("5. Audio to Text:");
        let form = Form::new().part("file", file_part(Path::new(audio)).await?);
        let resp = client
            .post(format!("{SERVER_URL}/audio-to-text"))
            .basic_auth(USERNAME, Some(PASSWORD))
            .multipart(form)
            .send()
            .await?;
        println!("Status: {}", resp.status());
        println!("Body: {}", resp.text().await?);
        println!();
    }

    Ok(())
}

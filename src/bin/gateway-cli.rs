use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for whisper-gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Shared API key, sent as a Bearer token.
    #[arg(short, long, env = "API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway and backend health
    Health,
    /// Transcribe an audio file through the OpenAI-compatible endpoint
    Transcribe {
        /// Audio file to upload
        file: PathBuf,
        /// Language of the audio, e.g. "da"
        #[arg(short, long)]
        language: Option<String>,
        /// Response format: json or text
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Transcribe { file, language, format } => {
            let key = cli.key.ok_or("an API key is required (--key or API_KEY)")?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("audio")
                .to_string();
            let audio = tokio::fs::read(&file).await?;

            let mut form = Form::new()
                .part("file", Part::bytes(audio).file_name(file_name))
                .text("model", "whisper-1")
                .text("response_format", format);
            if let Some(language) = language {
                form = form.text("language", language);
            }

            let res = client
                .post(format!("{}/audio/transcriptions", base))
                .bearer_auth(key)
                .multipart(form)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}

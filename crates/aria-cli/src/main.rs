//! aria CLI — Piper-backed TTS HTTP server.
//!
//! ```text
//! aria serve [--port 4000] [--host 127.0.0.1] [--engine python3] [--default-model en_US-amy-low]
//! aria speak "hello world" [--model en_US-amy-low] [--out hello.wav] [--server http://localhost:4000]
//! aria models / sweep / status [--server ...]
//! ```
//!
//! Environment variables (`ARIA_ENGINE`, `ARIA_MODELS_DIR`, `ARIA_AUDIO_DIR`,
//! `DEFAULT_MODEL`, `DEFAULT_FORMAT`, `MAX_TEXT_LENGTH`, `SYNTH_TIMEOUT_SECS`)
//! seed the configuration; CLI flags override them.

use std::path::PathBuf;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};

use aria_core::config::AppConfig;

/// aria — text-to-speech HTTP service wrapping the Piper engine
#[derive(Parser)]
#[command(name = "aria", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the aria TTS server
    Serve {
        /// Listen port
        #[arg(long, default_value = "4000")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Synthesis engine executable (invoked as `<engine> -m piper`)
        #[arg(long)]
        engine: Option<String>,
        /// Voice model storage root
        #[arg(long)]
        models_dir: Option<PathBuf>,
        /// Output artifact directory
        #[arg(long)]
        audio_dir: Option<PathBuf>,
        /// Model used when a request names none
        #[arg(long)]
        default_model: Option<String>,
        /// Maximum accepted text length
        #[arg(long)]
        max_text_length: Option<usize>,
        /// Synthesis deadline in seconds
        #[arg(long)]
        synth_timeout: Option<u64>,
    },
    /// Synthesize text against a running server
    Speak {
        /// Text to synthesize
        text: String,
        /// Voice model name
        #[arg(long)]
        model: Option<String>,
        /// Write decoded audio here instead of printing the response
        #[arg(long)]
        out: Option<PathBuf>,
        /// Server URL
        #[arg(long, default_value = "http://localhost:4000")]
        server: String,
    },
    /// List available voice models
    Models {
        #[arg(long, default_value = "http://localhost:4000")]
        server: String,
    },
    /// Delete audio files older than the retention window
    Sweep {
        #[arg(long, default_value = "http://localhost:4000")]
        server: String,
    },
    /// Get server health
    Status {
        #[arg(long, default_value = "http://localhost:4000")]
        server: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            host,
            engine,
            models_dir,
            audio_dir,
            default_model,
            max_text_length,
            synth_timeout,
        } => {
            let config = build_config(
                engine,
                models_dir,
                audio_dir,
                default_model,
                max_text_length,
                synth_timeout,
            );

            std::fs::create_dir_all(&config.models_dir).expect("failed to create models dir");
            std::fs::create_dir_all(&config.audio_dir).expect("failed to create audio dir");

            let engine = aria_lib::synth::SpeechEngine::new(config);
            let app = aria_lib::server::router(engine);

            let addr = format!("{host}:{port}");
            eprintln!("aria listening on {addr}");

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .expect("failed to bind");

            axum::serve(listener, app).await.expect("server error");
        }

        Command::Speak {
            text,
            model,
            out,
            server,
        } => {
            let resp = reqwest::Client::new()
                .post(format!("{server}/tts"))
                .json(&serde_json::json!({ "text": text, "model": model }))
                .send()
                .await
                .expect("request failed");

            let body: serde_json::Value = resp.json().await.expect("invalid response");
            match out {
                Some(path) => {
                    let encoded = body["base64"].as_str().unwrap_or_default();
                    let audio = BASE64.decode(encoded).expect("invalid base64 audio");
                    std::fs::write(&path, audio).expect("failed to write audio file");
                    eprintln!("wrote {} bytes to {}", body["size"], path.display());
                }
                None => println!("{body}"),
            }
        }

        Command::Models { server } => {
            let resp = reqwest::Client::new()
                .get(format!("{server}/models"))
                .send()
                .await
                .expect("request failed");
            println!("{}", resp.text().await.unwrap_or_default());
        }

        Command::Sweep { server } => {
            let resp = reqwest::Client::new()
                .post(format!("{server}/cleanup"))
                .send()
                .await
                .expect("request failed");
            println!("{}", resp.text().await.unwrap_or_default());
        }

        Command::Status { server } => {
            let resp = reqwest::Client::new()
                .get(format!("{server}/health"))
                .send()
                .await
                .expect("request failed");
            println!("{}", resp.text().await.unwrap_or_default());
        }
    }
}

/// Environment first, CLI flags on top, defaults underneath.
fn build_config(
    engine: Option<String>,
    models_dir: Option<PathBuf>,
    audio_dir: Option<PathBuf>,
    default_model: Option<String>,
    max_text_length: Option<usize>,
    synth_timeout: Option<u64>,
) -> AppConfig {
    let mut config = AppConfig::default();

    if let Ok(v) = std::env::var("ARIA_ENGINE") {
        config.engine = v;
    }
    if let Ok(v) = std::env::var("ARIA_MODELS_DIR") {
        config.models_dir = v.into();
    }
    if let Ok(v) = std::env::var("ARIA_AUDIO_DIR") {
        config.audio_dir = v.into();
    }
    if let Ok(v) = std::env::var("DEFAULT_MODEL") {
        config.default_model = v;
    }
    if let Ok(v) = std::env::var("DEFAULT_FORMAT") {
        config.default_format = v;
    }
    if let Ok(v) = std::env::var("MAX_TEXT_LENGTH") {
        if let Ok(n) = v.parse() {
            config.max_text_length = n;
        }
    }
    if let Ok(v) = std::env::var("SYNTH_TIMEOUT_SECS") {
        if let Ok(n) = v.parse() {
            config.synth_timeout = Duration::from_secs(n);
        }
    }

    if let Some(v) = engine {
        config.engine = v;
    }
    if let Some(v) = models_dir {
        config.models_dir = v;
    }
    if let Some(v) = audio_dir {
        config.audio_dir = v;
    }
    if let Some(v) = default_model {
        config.default_model = v;
    }
    if let Some(v) = max_text_length {
        config.max_text_length = v;
    }
    if let Some(v) = synth_timeout {
        config.synth_timeout = Duration::from_secs(v);
    }

    config
}

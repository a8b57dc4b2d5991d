use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use pocket_reader::{
    engines::kokoro::KokoroEngine,
    server::{create_router, AppState},
    service::TtsService,
    voices::DEFAULT_VOICE,
    Segmenter, ServerConfig,
};

/// Pocket Reader TTS server - local speech synthesis for the browser extension
#[derive(Parser, Debug)]
#[command(name = "pocket-reader-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Directory holding the Kokoro model files
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Skip loading the model and default voice at startup
    #[arg(long)]
    no_preload: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = if let Some(config_path) = &cli.config {
        log::info!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::from_env()?
    };
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(model_dir) = cli.model_dir {
        config.model_dir = model_dir;
    }
    if cli.no_preload {
        config.preload_on_startup = false;
    }

    let engine = KokoroEngine::with_params(config.model_dir.clone(), config.kokoro.clone());
    let tts = Arc::new(TtsService::new(engine));

    if config.preload_on_startup {
        let preload = Arc::clone(&tts);
        let result =
            tokio::task::spawn_blocking(move || preload.preload(&[DEFAULT_VOICE.to_string()]))
                .await?;
        match result {
            Ok(_) => log::info!("Model and default voice ({DEFAULT_VOICE}) ready"),
            Err(e) => log::error!("Startup preload failed, will retry on first request: {e}"),
        }
    }

    let state = AppState::new(tts, Segmenter::new(config.segmenter.clone()));
    let app = create_router(
        state,
        &config.cors_allowed_origins,
        config.max_body_bytes,
    );

    let address = config.address();
    let listener = TcpListener::bind(&address).await?;
    log::info!("Starting Pocket Reader TTS server on http://{address}");
    log::info!("Endpoints:");
    log::info!("  POST /synthesize  - Convert text to speech");
    log::info!("  POST /paragraphs  - Split text into paragraphs");
    log::info!("  POST /preload     - Preload model and voices");
    log::info!("  GET  /voices      - List available voices");
    log::info!("  GET  /health      - Health check");

    axum::serve(listener, app).await?;
    Ok(())
}

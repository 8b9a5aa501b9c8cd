#![deny(warnings)]

use anyhow::Context;
use clap::{ArgGroup, Parser};
use emovoice_core::capture::MicrophoneCapture;
use emovoice_core::config::{
    resolve_api_key, resolve_string_with_default, AppConfig, CaptureLimit, GenerationParams,
    InputSource, ModelName, StdEnv, DEFAULT_CAPTURE_SECS, DEFAULT_MODEL, ENV_GEMINI_API_KEY,
    ENV_GEMINI_MODEL,
};
use emovoice_core::decode::{AudioFileDecoder, FfmpegFileDecoder};
use emovoice_core::history::{HistoryStore, JsonFileHistoryStore};
use emovoice_core::oracle::GeminiOracle;
use emovoice_core::playback::{PlaybackSink, RodioPlaybackSink};
use emovoice_core::session::{AnalysisSession, SessionConfig};
use emovoice_core::transcribe::DummyTranscriptionProvider;
use std::path::PathBuf;
use std::time::SystemTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "emovoice")]
#[command(about = "Voice emotion analysis (record or upload -> scores -> history)")]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(false)
        .args(["record", "file", "show_history"])
))]
struct Args {
    /// Record a clip from the default microphone
    #[arg(long)]
    record: bool,

    /// Analyze an existing audio file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Print stored history, newest first
    #[arg(long)]
    show_history: bool,

    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long, default_value_t = DEFAULT_CAPTURE_SECS)]
    duration_secs: u64,

    /// Where history and saved clips live (defaults to the user data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Play the clip back after analysis
    #[arg(long)]
    play: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|d| d.join("emovoice")))
        .context("could not determine a data directory; pass --data-dir")?;
    let history = JsonFileHistoryStore::new(data_dir.join("history.json"));

    if args.show_history {
        return show_history(&history);
    }

    let play = args.play;
    let env = StdEnv;
    let cfg = build_config(args, &env, data_dir)?;

    tracing::info!(
        model = %cfg.model.as_str(),
        capture_secs = cfg.capture_limit.secs,
        "config loaded"
    );

    run_analysis(cfg, history, play).await
}

async fn run_analysis(
    cfg: AppConfig,
    history: JsonFileHistoryStore,
    play: bool,
) -> anyhow::Result<()> {
    let api_key = cfg
        .api_key
        .clone()
        .context("a Gemini API key is required (--api-key or GEMINI_API_KEY)")?;
    let oracle = GeminiOracle::new(api_key, cfg.model.clone(), cfg.generation);

    let session = AnalysisSession {
        capture: MicrophoneCapture::new(),
        transcriber: DummyTranscriptionProvider::new(),
        oracle,
        history,
        config: SessionConfig {
            capture_limit: cfg.capture_limit.duration(),
            clips_dir: Some(cfg.data_dir.join("clips")),
        },
    };

    let outcome = match &cfg.input {
        InputSource::Microphone => {
            println!("Recording for {}s...", cfg.capture_limit.secs);
            session.analyze_live().await?
        }
        InputSource::File(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            let clip = FfmpegFileDecoder::default().decode(bytes.into()).await?;
            session.analyze_clip(clip).await?
        }
    };

    println!("{}", outcome.result);
    println!();
    println!("Transcript: {}", outcome.transcript);
    if !outcome.audio_url.is_empty() {
        println!("Saved clip: {}", outcome.audio_url);
    }

    if play {
        let sink = RodioPlaybackSink::new();
        if let Err(e) = sink.play(outcome.clip).await {
            tracing::warn!(error = %e, "playback failed");
        }
    }

    Ok(())
}

fn show_history(store: &JsonFileHistoryStore) -> anyhow::Result<()> {
    let records = store.load()?;
    if records.is_empty() {
        println!("No history yet.");
        return Ok(());
    }
    for record in records {
        println!("[{}] dominant: {}", record.timestamp, record.emotions.winner);
        println!("  {}", record.transcript);
        if !record.audio_url.is_empty() {
            println!("  clip: {}", record.audio_url);
        }
    }
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: Args, env: &impl emovoice_core::config::Env, data_dir: PathBuf) -> anyhow::Result<AppConfig> {
    let input = match (args.record, args.file) {
        (true, None) => InputSource::Microphone,
        (false, Some(path)) => InputSource::File(path),
        _ => anyhow::bail!("exactly one of --record or --file must be provided"),
    };

    let model = ModelName::new(resolve_string_with_default(
        args.model,
        ENV_GEMINI_MODEL,
        env,
        DEFAULT_MODEL,
    ))?;
    let api_key = resolve_api_key(args.api_key, ENV_GEMINI_API_KEY, env)?;
    let capture_limit = CaptureLimit::new(args.duration_secs)?;

    Ok(AppConfig {
        input,
        model,
        api_key,
        generation: GenerationParams::default(),
        capture_limit,
        data_dir,
        start_time: SystemTime::now(),
    })
}

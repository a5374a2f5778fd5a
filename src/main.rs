use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatgrab::chrome::{Session, SessionConfig};
use chatgrab::extract::{self, ExtractorConfig};
use chatgrab::loader::{self, LoaderConfig, StopReason};
use chatgrab::output;

#[derive(Parser, Debug)]
#[command(about = "Extract the history of a WhatsApp Web conversation to CSV")]
struct Cli {
    /// Conversation (group or contact) to extract
    chat: String,
    /// Directory the CSV artifact lands in
    #[arg(long, default_value = "scraped_data")]
    out_dir: PathBuf,
    /// Stop loading history once this many messages are materialized
    #[arg(long, default_value_t = 50)]
    max_messages: usize,
    /// Consecutive unchanged message counts that count as "reached the top"
    #[arg(long, default_value_t = 3)]
    stability: u32,
    /// Milliseconds the client gets to render between scrolls
    #[arg(long, default_value_t = 3000)]
    settle_ms: u64,
    /// Seconds to wait for panel presence and per-message visibility
    #[arg(long, default_value_t = 60)]
    wait_secs: u64,
    /// Named Chrome profile for persistent sessions
    #[arg(long, default_value = "default")]
    profile: String,
    /// Override the Chrome user-data-dir
    #[arg(long)]
    user_data_dir: Option<PathBuf>,
    /// Run Chrome without a window (profile must already be authenticated)
    #[arg(long)]
    headless: bool,
    /// Skip the interactive checkpoints
    #[arg(long)]
    no_prompt: bool,
    /// Append a column marking records that lost fields to read errors
    #[arg(long)]
    mark_degraded: bool,
}

#[derive(Serialize)]
struct Output {
    chat: String,
    group_name: String,
    output_path: String,
    messages: usize,
    materialized: usize,
    stop_reason: StopReason,
    started_at: String,
    elapsed_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Cli::parse();
    let started_at = chrono::Local::now();
    let start = Instant::now();

    let loader_cfg = LoaderConfig {
        ceiling: args.max_messages,
        stability_threshold: args.stability,
        settle: Duration::from_millis(args.settle_ms),
        panel_timeout: Duration::from_secs(args.wait_secs),
    };
    let extractor_cfg = ExtractorConfig {
        visibility_timeout: Duration::from_secs(args.wait_secs),
        panel_timeout: Duration::from_secs(args.wait_secs),
    };

    let session = Session::launch(&SessionConfig {
        profile: args.profile.clone(),
        user_data_dir: args.user_data_dir.clone(),
        headless: args.headless,
    })
    .context("chrome session launch failed")?;

    session.open_whatsapp()?;
    pause(args.no_prompt, "Press Enter when the chat list is visible...");

    session
        .locate_chat(&args.chat, Duration::from_secs(10))
        .context("could not open the requested chat")?;
    pause(args.no_prompt, "Press Enter once the chat is open...");

    let dom = session.dom();
    let outcome =
        loader::load_history(&dom, &loader_cfg).context("loading chat history failed")?;

    // let the client settle before reading the header
    std::thread::sleep(Duration::from_secs(5));

    let group_name = extract::resolve_group_name(&dom);
    info!(group = %group_name, "conversation resolved");

    let records = extract::extract_messages(&dom, &group_name, &extractor_cfg)
        .context("message extraction failed")?;

    let path = output::write_chat_csv(&args.out_dir, &records, &group_name, args.mark_degraded)?;
    info!(path = %path.display(), records = records.len(), "artifact written");

    print_json(Output {
        chat: args.chat,
        group_name,
        output_path: path.display().to_string(),
        messages: records.len(),
        materialized: outcome.materialized,
        stop_reason: outcome.reason,
        started_at: started_at.to_rfc3339(),
        elapsed_ms: start.elapsed().as_millis() as u64,
    })?;

    Ok(())
}

fn pause(no_prompt: bool, message: &str) {
    if no_prompt {
        return;
    }
    eprint!("{message} ");
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

fn print_json<T: Serialize>(v: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&v)?);
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use colored::*;
use events::StreamMode;
use std::sync::Arc;
use std::time::Duration;
use stream_client::api_client::ApiClient;
use stream_client::output::{mode_label, print_snapshot};
use stream_client::{EventSourceTransport, EventStore, StoreConfig, DEFAULT_ENDPOINT};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "stream-watch")]
#[command(about = "Watch the event stream from a terminal")]
struct Cli {
    /// Stream endpoint (e.g., http://localhost:4000/events)
    #[arg(long, env = "SSE_URL", default_value = DEFAULT_ENDPOINT)]
    url: String,

    /// Stream mode to start in
    #[arg(long, value_enum, default_value_t = ModeChoice::Continuous)]
    mode: ModeChoice,

    /// Cookie header to send with the stream request
    #[arg(long)]
    cookie: Option<String>,

    /// Connect without credentials
    #[arg(long)]
    no_credentials: bool,

    /// Delay before reconnecting a failed continuous stream
    #[arg(long, default_value_t = 3000)]
    reconnect_ms: u64,

    /// Exit after this many updates
    #[arg(long)]
    max_updates: Option<usize>,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum ModeChoice {
    /// Keep the stream open and reconnect after failures
    Continuous,
    /// Receive one tick, then stop
    Single,
}

impl From<ModeChoice> for StreamMode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::Continuous => StreamMode::Continuous,
            ModeChoice::Single => StreamMode::Single,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = StoreConfig::new(&cli.url)?
        .with_credentials(!cli.no_credentials)
        .reconnect_delay(Duration::from_millis(cli.reconnect_ms))
        .initial_mode(cli.mode.into());

    println!("{}", "=== SERVER ===".bright_white().bold());
    let api_client = ApiClient::for_stream_endpoint(reqwest::Client::new(), config.endpoint());
    match api_client.server_status().await {
        Ok(status) => println!(
            "{} {} (events at {})",
            "✓".green(),
            status.message,
            status.events
        ),
        Err(e) => println!("{} {:#}", "✗".red(), e),
    }

    let mut transport = EventSourceTransport::new();
    if let Some(cookie) = cli.cookie {
        transport = transport.with_cookie(cookie)?;
    }
    let store = EventStore::new(config, Arc::new(transport));

    print_snapshot(&store.server_snapshot());

    println!("\n{}", "=== STREAM ===".bright_white().bold());
    println!(
        "{} Type {} or {} to switch modes, {} to exit",
        "→".blue(),
        "single".cyan(),
        "continuous".cyan(),
        "quit".cyan()
    );

    let (updates_tx, mut updates) = mpsc::unbounded_channel();
    let subscription = store.subscribe(move || {
        let _ = updates_tx.send(());
    });

    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut shown = 0;

    loop {
        tokio::select! {
            Some(()) = updates.recv() => {
                print_snapshot(&store.get_snapshot());
                shown += 1;
                if cli.max_updates.is_some_and(|max| shown >= max) {
                    break;
                }
            }
            line = commands.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "single" => switch_mode(&store, StreamMode::Single),
                    "continuous" => switch_mode(&store, StreamMode::Continuous),
                    "quit" => break,
                    "" => {}
                    other => println!("{} Unknown command {:?}", "✗".red(), other),
                },
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    subscription.unsubscribe();
    println!("\n{} Disconnected", "✓".green());
    Ok(())
}

fn switch_mode(store: &EventStore, mode: StreamMode) {
    println!("{} {}", "→".blue(), mode_label(mode));
    store.set_mode(mode);
}

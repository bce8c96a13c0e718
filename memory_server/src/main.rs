use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use memory::{Board, BoardLayout};
use memory_server::{Config, Recorder, TextServer, WebServer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    board: BoardSource,

    /// Port to listen on, 0 for any free port
    #[arg(short, long, default_value_t = 0)]
    port: u16,

    /// Also serve the board over HTTP on this port, 0 for any free port
    #[arg(long)]
    http_port: Option<u16>,

    /// RNG seed for dealing the cards
    #[arg(long)]
    seed: Option<u64>,

    /// Reply to a watch request after this many seconds even if nothing changed
    #[arg(short, long)]
    watch_timeout_secs: Option<u64>,

    /// Record every session's requests and replies as JSON files into this directory
    #[arg(short, long)]
    record_sessions_to_directory: Option<PathBuf>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Subcommand)]
enum BoardSource {
    /// Read the board size and card labels from a file
    File { path: PathBuf },
    /// Deal a board of the given size from the given cards
    Random {
        columns: usize,
        rows: usize,
        /// Cards as hexadecimal Unicode code points, e.g. 1F308
        #[arg(required = true, value_parser = parse_code_point)]
        cards: Vec<String>,
    },
}

fn parse_code_point(text: &str) -> Result<String, String> {
    let digits = text.trim_start_matches("U+").trim_start_matches("0x");
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| format!("'{}' is not a hexadecimal code point", text))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    // Get a random seed
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let layout = match &args.board {
        BoardSource::File { path } => BoardLayout::load(path, &mut rng)?,
        BoardSource::Random {
            columns,
            rows,
            cards,
        } => BoardLayout::random(*columns, *rows, cards, &mut rng)?,
    };
    let board = Arc::new(Board::from_layout(layout));
    info!(width = board.width(), height = board.height(), "Dealt board");

    let recorder = if let Some(dir_path) = args.record_sessions_to_directory {
        Some(Recorder::new(dir_path)?)
    } else {
        None
    };
    let watch_timeout = args.watch_timeout_secs.map(Duration::from_secs);
    let config = Config {
        recorder,
        watch_timeout,
    };

    if let Some(http_port) = args.http_port {
        let web_server = WebServer::bind(Arc::clone(&board), http_port, watch_timeout)?;
        std::thread::spawn(move || {
            if let Err(err) = web_server.serve() {
                error!("HTTP server failed: {:#}", err);
            }
        });
    }

    let server = TextServer::bind(board, args.port, config)?;
    server.serve()
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().event_format(format))
        .with(filter)
        .init();
}

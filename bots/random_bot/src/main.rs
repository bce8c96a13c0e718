use clap::Parser;
use memory::{BoardState, CellStatus};
use memory_bot_utils::{initialize_logging, Bot, Connection};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
struct Args {
    /// Address of the memory server
    #[arg(short, long, default_value = "127.0.0.1:8789")]
    addr: String,

    /// Play as this player instead of the one assigned by the server
    #[arg(short, long)]
    name: Option<String>,

    /// Stop after this many flips
    #[arg(short, long, default_value_t = 1000)]
    flips: usize,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    initialize_logging(args.log_level);
    let seed = args.seed.unwrap_or_else(rand::random);
    let rng = StdRng::seed_from_u64(seed);

    let mut connection = Connection::connect(args.addr.as_str())?;
    if let Some(name) = &args.name {
        info!("{}", connection.hello(name)?);
    }
    let num_flips = RandomBot { rng }.run(&mut connection, args.flips)?;
    info!(num_flips, "Done");
    connection.quit()
}

struct RandomBot {
    rng: StdRng,
}

impl Bot for RandomBot {
    fn choose_flip(&mut self, state: &BoardState) -> Option<(usize, usize)> {
        let candidates: Vec<(usize, usize)> = state
            .iter()
            .filter(|(_, _, cell)| matches!(cell, CellStatus::Down | CellStatus::Up(_)))
            .map(|(row, col, _)| (row, col))
            .collect();
        // With nothing else left, flipping an own card still settles a held pair
        candidates
            .choose(&mut self.rng)
            .copied()
            .or_else(|| state.mine().first().copied())
    }
}

use clap::Parser;
use memory::{BoardState, CellStatus};
use memory_bot_utils::{initialize_logging, Bot, CardMemory, Connection, HasCardMemory, MemoryWrapper};
use rand::rngs::StdRng;
use rand::{seq::SliceRandom, SeedableRng};
use tracing::{debug, info};
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
    let mut bot = MemoryWrapper::new(GreedyBot {
        rng,
        memory: CardMemory::new(),
    });
    let num_flips = bot.run(&mut connection, args.flips)?;
    info!(num_flips, "Done");
    connection.quit()
}

/// Goes for pairs it has already seen, and turns over unseen cards otherwise.
struct GreedyBot {
    rng: StdRng,
    memory: CardMemory,
}

fn is_available(state: &BoardState, (row, col): (usize, usize)) -> bool {
    matches!(
        state.get(row, col),
        Some(CellStatus::Down | CellStatus::Up(_))
    )
}

impl GreedyBot {
    fn known_pair(&self, state: &BoardState) -> Option<(usize, usize)> {
        self.memory
            .seen
            .keys()
            .copied()
            .filter(|&pos| is_available(state, pos))
            .find(|&(row, col)| {
                self.memory
                    .match_for(row, col)
                    .is_some_and(|other| is_available(state, other))
            })
    }

    fn explore(&mut self, state: &BoardState) -> Option<(usize, usize)> {
        let available: Vec<(usize, usize)> = state
            .iter()
            .map(|(row, col, _)| (row, col))
            .filter(|&pos| is_available(state, pos))
            .collect();
        let unknown: Vec<(usize, usize)> = available
            .iter()
            .copied()
            .filter(|&(row, col)| self.memory.is_unknown(row, col))
            .collect();
        if unknown.is_empty() {
            available.choose(&mut self.rng).copied()
        } else {
            unknown.choose(&mut self.rng).copied()
        }
    }
}

impl HasCardMemory for GreedyBot {
    fn get_memory(&mut self) -> &mut CardMemory {
        &mut self.memory
    }
}

impl Bot for GreedyBot {
    fn choose_flip(&mut self, state: &BoardState) -> Option<(usize, usize)> {
        let mine = state.mine();
        if let [(row, col)] = mine[..] {
            let partner = self
                .memory
                .match_for(row, col)
                .filter(|&other| is_available(state, other));
            if let Some(partner) = partner {
                debug!(?partner, "Completing a pair");
                return Some(partner);
            }
        } else if let Some(first) = self.known_pair(state) {
            debug!(?first, "Starting a known pair");
            return Some(first);
        }
        // With nothing else left, flipping an own card still settles a held pair
        self.explore(state).or_else(|| mine.first().copied())
    }
}

mod card_memory;
mod connection;
pub use card_memory::*;
pub use connection::*;

use memory::BoardState;
use tracing::{debug, trace};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// A trait to simplify writing bots.
pub trait Bot {
    /// Picks the next card to flip, by 1-based `(row, col)`, or `None` to
    /// stop playing.
    fn choose_flip(&mut self, state: &BoardState) -> Option<(usize, usize)>;

    /// Plays until the board is cleared, the bot gives up, or `max_flips`
    /// flips were made. Returns the number of flips.
    fn run(&mut self, connection: &mut Connection, max_flips: usize) -> anyhow::Result<usize> {
        for num_flips in 0..max_flips {
            let state = connection.state()?;
            if state.cards_left() == 0 {
                debug!(num_flips, "Board is cleared");
                return Ok(num_flips);
            }
            let Some((row, col)) = self.choose_flip(&state) else {
                debug!(num_flips, "Bot gave up");
                return Ok(num_flips);
            };
            let view = connection.flip(row, col)?;
            trace!(row, col, view = %view, "Flipped");
        }
        Ok(max_flips)
    }
}

/// Sets up logging to stderr, which is all a bot shares with the terminal.
pub fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

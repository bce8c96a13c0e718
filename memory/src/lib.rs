pub use board::*;
pub use errors::*;
pub use layout::*;
pub use ledger::*;
pub use protocol_types::*;
pub use space::*;
pub use turn::Resolution;
pub use visualization::*;
pub use watch::*;

#[cfg(test)]
mod arbitrary;
mod board;
mod errors;
mod layout;
mod ledger;
mod protocol_types;
mod space;
mod turn;
mod visualization;
mod watch;

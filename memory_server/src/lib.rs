mod error;
mod recording;
mod request;
mod session;
mod text_server;
mod web_server;
pub use error::*;
pub use recording::*;
pub use request::*;
pub use session::*;
pub use text_server::*;
pub use web_server::*;

use std::time::Duration;

pub struct Config {
    pub recorder: Option<recording::Recorder>,
    /// How long `watch` waits for a change before replying anyway.
    pub watch_timeout: Option<Duration>,
}

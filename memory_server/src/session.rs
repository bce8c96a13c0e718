use std::time::Duration;

use memory::{Board, Request};
use tracing::{debug, trace, warn};

use crate::recording::Exchange;
use crate::{parse_request, Config, MalformedRequest};

/// What to send back for one request line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// One or more lines, without the final newline.
    Text(String),
    /// Close the connection without replying.
    Quit,
}

/// The state of one connection: which player it acts as, and what it said so
/// far if sessions are recorded.
pub struct Session<'a> {
    board: &'a Board,
    config: &'a Config,
    player: String,
    exchanges: Vec<Exchange>,
}

impl<'a> Session<'a> {
    /// Starts a session acting as `player`, registering it on the board.
    pub fn new(board: &'a Board, config: &'a Config, player: &str) -> Self {
        board.register_player(player);
        Self {
            board,
            config,
            player: String::from(player),
            exchanges: Vec::new(),
        }
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    /// Handles one request line.
    ///
    /// Malformed requests and recoverable board errors become an `error: `
    /// reply. Fatal board errors are returned, and the connection should be
    /// dropped.
    pub fn handle_line(&mut self, line: &str) -> anyhow::Result<Reply> {
        trace!(player = &self.player, request = line.trim_end(), "Received request");
        let reply = match parse_request(line) {
            Ok(request) => self.handle_request(&request)?,
            Err(err) => {
                debug!(player = &self.player, %err, "Malformed request");
                Reply::Text(format!("error: {}", err))
            }
        };
        if self.config.recorder.is_some() {
            self.exchanges.push(Exchange {
                player: self.player.clone(),
                request: String::from(line.trim_end()),
                response: match &reply {
                    Reply::Text(text) => text.clone(),
                    Reply::Quit => String::new(),
                },
            });
        }
        Ok(reply)
    }

    /// Handles one request line as read from the socket, which need not be
    /// valid UTF-8.
    pub fn handle_bytes(&mut self, line: &[u8]) -> anyhow::Result<Reply> {
        match std::str::from_utf8(line) {
            Ok(line) => self.handle_line(line),
            Err(err) => {
                debug!(player = &self.player, %err, "Request is not UTF-8");
                Ok(Reply::Text(format!("error: {}", MalformedRequest::NotUtf8)))
            }
        }
    }

    fn handle_request(&mut self, request: &Request) -> anyhow::Result<Reply> {
        let result = match request {
            Request::Hello { player } => {
                let added = self.board.register_player(player);
                self.player = player.clone();
                return Ok(Reply::Text(if added {
                    format!("Hello, {}!", player)
                } else {
                    format!("Welcome back, {}!", player)
                }));
            }
            Request::Look => self.board.render(&self.player),
            Request::Flip { column, row } => self
                .board
                .flip(*row, *column, &self.player)
                .and_then(|_| self.board.render(&self.player)),
            Request::Watch => {
                wait_for_change(self.board, self.config.watch_timeout);
                self.board.render(&self.player)
            }
            Request::State => match self.board.state(&self.player) {
                Ok(state) => return Ok(Reply::Text(serde_json::to_string(&state)?)),
                Err(err) => Err(err),
            },
            Request::Quit => return Ok(Reply::Quit),
        };
        match result {
            Ok(text) => Ok(Reply::Text(text)),
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                warn!(player = &self.player, %err, "Request failed");
                Ok(Reply::Text(format!("error: {}", err)))
            }
        }
    }

    /// Ends the session, writing its recording if there is one.
    pub fn finish(self) -> anyhow::Result<()> {
        if let Some(recorder) = &self.config.recorder {
            if !self.exchanges.is_empty() {
                let path = recorder.write_session(&self.exchanges)?;
                debug!(player = &self.player, path = %path.display(), "Recorded session");
            }
        }
        Ok(())
    }
}

/// Blocks until the board changes or `timeout` passes.
///
/// A timeout just means the caller sends the view unchanged.
pub(crate) fn wait_for_change(board: &Board, timeout: Option<Duration>) {
    let (id, changed) = board.watch();
    match timeout {
        Some(timeout) => {
            if changed.recv_timeout(timeout).is_err() {
                board.unsubscribe(id);
            }
        }
        None => {
            let _ = changed.recv();
        }
    }
}

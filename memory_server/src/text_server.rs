use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use memory::Board;
use tracing::{debug, error, info, warn};

use crate::{Config, Reply, Session};

/// Serves one board over a line-based TCP protocol, one thread per
/// connection.
pub struct TextServer {
    listener: TcpListener,
    board: Arc<Board>,
    config: Arc<Config>,
    connections: AtomicUsize,
}

impl TextServer {
    /// Listens on all interfaces. Port 0 picks any free port, see
    /// [`Self::port()`].
    pub fn bind(board: Arc<Board>, port: u16, config: Config) -> anyhow::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
        Ok(Self {
            listener,
            board,
            config: Arc::new(config),
            connections: AtomicUsize::new(0),
        })
    }

    pub fn port(&self) -> anyhow::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Accepts connections forever.
    ///
    /// A failing connection is logged and does not affect the others.
    pub fn serve(&self) -> anyhow::Result<()> {
        info!(port = self.port()?, "Serving");
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(%err, "Could not accept connection");
                    continue;
                }
            };
            let num = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
            let player = format!("player{}", num);
            let board = Arc::clone(&self.board);
            let config = Arc::clone(&self.config);
            std::thread::spawn(move || {
                if let Err(err) = handle_connection(stream, &board, &config, &player) {
                    error!(player, "Connection failed: {:#}", err);
                }
            });
        }
        Ok(())
    }
}

fn handle_connection(
    stream: TcpStream,
    board: &Board,
    config: &Config,
    player: &str,
) -> anyhow::Result<()> {
    let peer = stream.peer_addr()?;
    debug!(%peer, player, "Connection opened");
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    let mut session = Session::new(board, config, player);

    let mut result = Ok(());
    // Read bytes: a line that is not UTF-8 still gets a reply
    let mut line = Vec::new();
    loop {
        line.clear();
        let handled = match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => session.handle_bytes(&line),
            Err(err) => Err(err.into()),
        };
        let reply = match handled {
            Ok(Reply::Text(text)) => text,
            Ok(Reply::Quit) => break,
            Err(err) => {
                result = Err(err);
                break;
            }
        };
        if let Err(err) = writeln!(writer, "{}", reply).and_then(|()| writer.flush()) {
            result = Err(err.into());
            break;
        }
    }
    debug!(%peer, player = session.player(), "Connection closed");
    session.finish()?;
    result
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn start(cells: &[&str], width: usize, height: usize) -> (Arc<Board>, u16) {
        let cells = cells.iter().map(|l| Some(String::from(*l))).collect();
        let board = Arc::new(Board::new(width, height, cells).unwrap());
        let config = Config {
            recorder: None,
            watch_timeout: Some(Duration::from_secs(5)),
        };
        let server = TextServer::bind(Arc::clone(&board), 0, config).unwrap();
        let port = server.port().unwrap();
        std::thread::spawn(move || server.serve());
        (board, port)
    }

    struct Client {
        reader: BufReader<TcpStream>,
        writer: TcpStream,
    }

    impl Client {
        fn connect(port: u16) -> Self {
            let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).unwrap();
            Self {
                reader: BufReader::new(stream.try_clone().unwrap()),
                writer: stream,
            }
        }

        fn send(&mut self, request: &str) {
            writeln!(self.writer, "{}", request).unwrap();
        }

        fn read_lines(&mut self, n: usize) -> Vec<String> {
            (0..n)
                .map(|_| {
                    let mut line = String::new();
                    self.reader.read_line(&mut line).unwrap();
                    String::from(line.trim_end_matches('\n'))
                })
                .collect()
        }

        fn request(&mut self, request: &str, reply_lines: usize) -> Vec<String> {
            self.send(request);
            self.read_lines(reply_lines)
        }
    }

    #[test]
    fn play_over_tcp() {
        let (board, port) = start(&["A", "B", "B", "A"], 2, 2);
        let mut alice = Client::connect(port);
        let mut bob = Client::connect(port);
        assert_eq!(alice.request("hello alice", 1), vec!["Hello, alice!"]);
        assert_eq!(bob.request("hello bob", 1), vec!["Hello, bob!"]);

        assert_eq!(alice.request("flip 1 1", 2), vec![">A *", " * *"]);
        assert_eq!(bob.request("flip 1 1", 2), vec![" A *", " * *"]);
        assert_eq!(alice.request("flip 2 2", 2), vec![">A *", " *>A"]);
        assert_eq!(alice.request("flip 2 1", 2), vec!["  >B", " *  "]);
        assert_eq!(bob.request("look", 2), vec!["   B", " *  "]);
        assert!(board.space(1, 1).unwrap().is_empty());

        let state = bob.request("state", 1);
        let state: memory::BoardState = serde_json::from_str(&state[0]).unwrap();
        assert_eq!(state.cards_left(), 2);
        assert!(state.mine().is_empty());
    }

    #[test]
    fn bad_requests_get_an_error_line() {
        let (_board, port) = start(&["A", "A"], 2, 1);
        let mut client = Client::connect(port);
        let reply = client.request("flip 1", 1);
        assert!(reply[0].starts_with("error: "), "{:?}", reply);
        assert_eq!(client.request("look", 1), vec![" * *"]);
    }

    #[test]
    fn invalid_utf8_keeps_the_connection_open() {
        let (_board, port) = start(&["A", "A"], 2, 1);
        let mut client = Client::connect(port);
        client.writer.write_all(b"\xff\xfe\n").unwrap();
        assert_eq!(
            client.read_lines(1),
            vec!["error: request is not valid UTF-8"]
        );
        assert_eq!(client.request("look", 1), vec![" * *"]);
    }

    #[test]
    fn connections_get_their_own_player() {
        let (board, port) = start(&["A", "A"], 2, 1);
        let mut first = Client::connect(port);
        let mut second = Client::connect(port);
        assert_eq!(first.request("flip 1 1", 1), vec![">A *"]);
        assert_eq!(second.request("flip 2 1", 1), vec![" A>A"]);
        assert_eq!(board.players().len(), 2);
    }

    #[test]
    fn watch_replies_after_a_change() {
        let (_board, port) = start(&["A", "B"], 2, 1);
        let mut watcher = Client::connect(port);
        let mut flipper = Client::connect(port);
        watcher.send("watch");
        // Changes before the watch is registered are missed, so keep changing
        // the board until the watcher replies
        watcher
            .reader
            .get_ref()
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        let mut column = 1;
        let view = loop {
            flipper.request(&format!("flip {} 1", column), 1);
            column = 3 - column;
            let mut line = String::new();
            if watcher.reader.read_line(&mut line).is_ok() && !line.is_empty() {
                break line;
            }
        };
        assert_eq!(view.trim_end().chars().count(), 4);
    }

    #[test]
    fn quit_closes_the_connection() {
        let (_board, port) = start(&["A", "A"], 2, 1);
        let mut client = Client::connect(port);
        client.send("quit");
        let mut line = String::new();
        assert_eq!(client.reader.read_line(&mut line).unwrap(), 0);
    }
}

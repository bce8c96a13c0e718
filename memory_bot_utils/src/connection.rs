use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};

use memory::{BoardState, Request};
use tracing::trace;

/// A client connection to a Memory Scramble text server.
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    // Number of lines in a text view, known after the first `state`
    height: Option<usize>,
    // A re-usable buffer for IO.
    // Should always be empty before and after read_line().
    buf: String,
}

impl Connection {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            height: None,
            buf: String::new(),
        })
    }

    fn send(&mut self, request: &Request) -> anyhow::Result<()> {
        trace!(name: "Sending request", request = %request);
        writeln!(self.writer, "{}", request)?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> anyhow::Result<String> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            anyhow::bail!("Server closed the connection");
        }
        let line = String::from(self.buf.trim_end_matches(['\r', '\n']));
        self.buf.clear();
        trace!(name: "Received line", line = %line);
        if let Some(err) = line.strip_prefix("error: ") {
            anyhow::bail!("Server error: {}", err);
        }
        Ok(line)
    }

    fn read_view(&mut self) -> anyhow::Result<String> {
        let height = match self.height {
            Some(height) => height,
            None => anyhow::bail!("Board height unknown, request the state first"),
        };
        let mut lines = Vec::with_capacity(height);
        for _ in 0..height {
            lines.push(self.read_line()?);
        }
        Ok(lines.join("\n"))
    }

    /// Switches this connection to the given player and returns the greeting.
    pub fn hello(&mut self, player: &str) -> anyhow::Result<String> {
        self.send(&Request::Hello {
            player: String::from(player),
        })?;
        self.read_line()
    }

    pub fn state(&mut self) -> anyhow::Result<BoardState> {
        self.send(&Request::State)?;
        let line = self.read_line()?;
        let state: BoardState = serde_json::from_str(&line)?;
        self.height = Some(state.height);
        Ok(state)
    }

    /// The text view, see [`memory::Board::render()`].
    pub fn look(&mut self) -> anyhow::Result<String> {
        if self.height.is_none() {
            self.state()?;
        }
        self.send(&Request::Look)?;
        self.read_view()
    }

    /// Flips the card at the 1-based coordinates and returns the text view
    /// afterwards.
    pub fn flip(&mut self, row: usize, col: usize) -> anyhow::Result<String> {
        if self.height.is_none() {
            self.state()?;
        }
        self.send(&Request::Flip { column: col, row })?;
        self.read_view()
    }

    pub fn quit(mut self) -> anyhow::Result<()> {
        self.send(&Request::Quit)
    }
}

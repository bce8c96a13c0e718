use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Writes each finished session to its own JSON file.
///
/// Sessions run on many threads at once, so the file number is handed out
/// atomically.
#[derive(Debug)]
pub struct Recorder {
    next_num: AtomicUsize,
    directory: PathBuf,
}

impl Recorder {
    pub fn new(directory: PathBuf) -> anyhow::Result<Self> {
        if !directory.is_dir() {
            anyhow::bail!("Directory '{}' does not exist", directory.display());
        }
        Ok(Self {
            next_num: AtomicUsize::new(1),
            directory,
        })
    }

    /// Writes the exchanges to `session_NNNNNN.json` and returns that path.
    pub fn write_session(&self, exchanges: &[Exchange]) -> anyhow::Result<PathBuf> {
        let num = self.next_num.fetch_add(1, Ordering::Relaxed);
        let filepath = self.directory.join(format!("session_{:0>6}.json", num));
        let mut writer = BufWriter::new(File::create(&filepath)?);
        serde_json::to_writer_pretty(&mut writer, exchanges)?;
        writer.flush()?;
        Ok(filepath)
    }
}

/// One request line and the reply to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub player: String,
    pub request: String,
    pub response: String,
}

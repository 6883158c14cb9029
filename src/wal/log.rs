//! Transaction Log Module
//!
//! Read mode of the file-backed write-ahead log: open, replay, then hand the
//! file over to the writer with [`TransactionLog::run`].

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{KvError, Result};
use crate::wal::{Event, TransactionLogWriter};

// == Replay Cursor ==
#[derive(Debug, Default)]
struct ReplayCursor {
    last_sequence: u64,
    /// Length of the file up to the end of the last complete line
    valid_len: u64,
    /// The file ends in a record cut short by an interrupted append
    torn_tail: bool,
    /// Set once a scan reaches the end of the file without error
    complete: bool,
}

// == Transaction Log ==
/// An opened log file that has not started accepting writes yet.
#[derive(Debug)]
pub struct TransactionLog {
    path: PathBuf,
    file: File,
    cursor: ReplayCursor,
}

impl TransactionLog {
    // == Open ==
    /// Opens the log at `path`, creating an empty one if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        debug!(path = %path.display(), "transaction log opened");
        Ok(Self {
            path,
            file,
            cursor: ReplayCursor::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest sequence observed by the most recent scan.
    pub fn last_sequence(&self) -> u64 {
        self.cursor.last_sequence
    }

    // == Read Events ==
    /// Streams every event from the start of the file in sequence order.
    pub fn read_events(&mut self) -> Result<ReadEvents<'_>> {
        self.read_events_after(0)
    }

    /// Streams the events whose sequence is greater than `after`.
    ///
    /// The whole file is still scanned so sequence integrity is checked from
    /// the first record.
    pub fn read_events_after(&mut self, after: u64) -> Result<ReadEvents<'_>> {
        (&self.file).seek(SeekFrom::Start(0))?;
        self.cursor = ReplayCursor::default();

        Ok(ReadEvents {
            reader: BufReader::new(&self.file),
            cursor: &mut self.cursor,
            after,
            line: 0,
            buf: Vec::new(),
            done: false,
        })
    }

    // == Run ==
    /// Switches the log into write mode.
    ///
    /// Sequence numbering continues from the highest replayed sequence. If no
    /// full replay happened yet, the file is scanned first so numbering never
    /// collides with existing records. A torn final record is cut off so new
    /// records start on a fresh line.
    pub fn run(mut self, buffer: usize) -> Result<TransactionLogWriter> {
        if !self.cursor.complete {
            for event in self.read_events()? {
                event?;
            }
        }

        if self.cursor.torn_tail {
            warn!(
                path = %self.path.display(),
                len = self.cursor.valid_len,
                "truncating torn record at end of transaction log"
            );
            self.file.set_len(self.cursor.valid_len)?;
        }

        info!(
            path = %self.path.display(),
            last_sequence = self.cursor.last_sequence,
            "transaction log switching to write mode"
        );
        Ok(TransactionLogWriter::spawn(
            self.file,
            self.cursor.last_sequence,
            buffer,
        ))
    }
}

// == Read Events Iterator ==
/// Lazy, single-pass replay of a log file.
///
/// Yields at most one error, after which it is exhausted. A final record
/// without its newline is the remains of an interrupted append and ends the
/// replay like end of file.
pub struct ReadEvents<'a> {
    reader: BufReader<&'a File>,
    cursor: &'a mut ReplayCursor,
    after: u64,
    line: usize,
    buf: Vec<u8>,
    done: bool,
}

impl ReadEvents<'_> {
    fn fail(&mut self, err: KvError) -> Option<Result<Event>> {
        self.done = true;
        Some(Err(err))
    }
}

impl Iterator for ReadEvents<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            let read = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    self.cursor.complete = true;
                    return None;
                }
                Ok(read) => read as u64,
                Err(err) => return self.fail(err.into()),
            };
            self.line += 1;

            // read_until only stops short of a newline at end of file
            let Some(record) = self.buf.strip_suffix(b"\n") else {
                warn!(
                    line = self.line,
                    bytes = read,
                    "ignoring torn record at end of transaction log"
                );
                self.done = true;
                self.cursor.torn_tail = true;
                self.cursor.complete = true;
                return None;
            };
            if record.is_empty() {
                self.cursor.valid_len += read;
                continue;
            }

            let event = match Event::decode(record, self.line) {
                Ok(event) => event,
                Err(err) => return self.fail(err),
            };

            let previous = self.cursor.last_sequence;
            if event.sequence != previous + 1 {
                let line = self.line;
                return self.fail(KvError::OutOfSequence {
                    line,
                    previous,
                    found: event.sequence,
                });
            }
            self.cursor.last_sequence = event.sequence;
            self.cursor.valid_len += read;

            if event.sequence > self.after {
                return Some(Ok(event));
            }
        }
        None
    }
}

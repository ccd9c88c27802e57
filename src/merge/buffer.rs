//! Spillable result buffering.
//!
//! A merge over large layers can produce millions of unconflicted changes
//! before the scenario finishes, so results are held in a bounded in-memory
//! chunk and overflow to an unlinked scratch file as JSON lines. Draining
//! yields items back in exact insertion order: spilled chunks first, then
//! whatever is still in memory.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::MergeError;

// ---------------------------------------------------------------------------
// SpillBuffer
// ---------------------------------------------------------------------------

/// An append-only buffer that spills to disk past a configured chunk size.
#[derive(Debug)]
pub struct SpillBuffer<T> {
    chunk_size: usize,
    buffered: Vec<T>,
    spill: Option<BufWriter<File>>,
    spilled: usize,
}

impl<T: Serialize + DeserializeOwned> SpillBuffer<T> {
    /// Create a buffer that holds up to `chunk_size` items in memory.
    ///
    /// A `chunk_size` of zero is treated as one: every push spills.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            buffered: Vec::new(),
            spill: None,
            spilled: 0,
        }
    }

    /// Append one item.
    ///
    /// # Errors
    /// Fails if a full chunk cannot be written to the scratch file.
    pub fn push(&mut self, item: T) -> Result<(), MergeError> {
        self.buffered.push(item);
        if self.buffered.len() >= self.chunk_size {
            self.spill_chunk()?;
        }
        Ok(())
    }

    /// Total items held, in memory and on disk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spilled + self.buffered.len()
    }

    /// Returns `true` if nothing has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn spill_chunk(&mut self) -> Result<(), MergeError> {
        if self.spill.is_none() {
            // The scratch file is created unlinked; the OS reclaims it when
            // the buffer drops, even on panic.
            self.spill = Some(BufWriter::new(tempfile::tempfile()?));
        }
        let Some(writer) = self.spill.as_mut() else {
            unreachable!("spill writer was just created")
        };
        for item in self.buffered.drain(..) {
            let line = serde_json::to_vec(&item).map_err(std::io::Error::other)?;
            writer.write_all(&line)?;
            writer.write_all(b"\n")?;
            self.spilled += 1;
        }
        Ok(())
    }

    /// Consume the buffer, yielding every item in insertion order.
    ///
    /// # Errors
    /// Fails if the scratch file cannot be flushed or rewound. Decode errors
    /// on individual items surface through the returned iterator.
    pub fn drain(self) -> Result<SpillDrain<T>, MergeError> {
        let lines = match self.spill {
            None => None,
            Some(writer) => {
                let mut file = writer
                    .into_inner()
                    .map_err(std::io::IntoInnerError::into_error)?;
                file.seek(SeekFrom::Start(0))?;
                Some(BufReader::new(file).lines())
            }
        };
        Ok(SpillDrain {
            lines,
            buffered: self.buffered.into_iter(),
        })
    }
}

// ---------------------------------------------------------------------------
// SpillDrain
// ---------------------------------------------------------------------------

/// Draining iterator over a [`SpillBuffer`]: spilled items, then in-memory
/// ones.
#[derive(Debug)]
pub struct SpillDrain<T> {
    lines: Option<std::io::Lines<BufReader<File>>>,
    buffered: std::vec::IntoIter<T>,
}

impl<T: DeserializeOwned> Iterator for SpillDrain<T> {
    type Item = Result<T, MergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(lines) = self.lines.as_mut() {
            match lines.next() {
                Some(Ok(line)) => {
                    return Some(
                        serde_json::from_str(&line)
                            .map_err(|e| MergeError::Io(std::io::Error::other(e))),
                    );
                }
                Some(Err(e)) => return Some(Err(MergeError::Io(e))),
                None => self.lines = None,
            }
        }
        self.buffered.next().map(Ok)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

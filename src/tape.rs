//! The random-access "tape": a seekable byte window over a backing file,
//! driven by the cooperative `Top`/`Bottom`/`Seek`/`Get`/`Peek`/`Discard`
//! protocol of the reader core.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{PdfError, Result};

/// Which way `Get`/`Peek`/`Discard` read relative to the current
/// position. Only the tail scan for `startxref` uses `Backward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A stateful, seekable byte source. Owns `Position` and `Direction`;
/// every operation either queries or advances that state.
pub struct Tape {
    file: File,
    size: u64,
    position: u64,
    direction: Direction,
}

impl Tape {
    /// Opens `path` as a tape, positioned at the top in the forward
    /// direction.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Tape {
            file,
            size,
            position: 0,
            direction: Direction::Forward,
        })
    }

    /// Wraps an already-open file.
    pub fn from_file(mut file: File) -> Result<Self> {
        let size = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;
        Ok(Tape {
            file,
            size,
            position: 0,
            direction: Direction::Forward,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// `Top` — position to 0, direction forward.
    pub fn top(&mut self) {
        self.position = 0;
        self.direction = Direction::Forward;
    }

    /// `Bottom` — position to end of file, direction backward.
    pub fn bottom(&mut self) {
        self.position = self.size;
        self.direction = Direction::Backward;
    }

    /// `GetSeek` — current position.
    pub fn get_seek(&self) -> u64 {
        self.position
    }

    /// `Seek n` — absolute reposition; fails `TapeBounds` outside
    /// `[0, fileSize]`.
    pub fn seek(&mut self, n: u64) -> Result<()> {
        if n > self.size {
            return Err(PdfError::TapeBounds);
        }
        self.position = n;
        Ok(())
    }

    /// `GetForward` — current direction.
    pub fn get_forward(&self) -> Direction {
        self.direction
    }

    pub fn set_forward(&mut self) {
        self.direction = Direction::Forward;
    }

    pub fn set_backward(&mut self) {
        self.direction = Direction::Backward;
    }

    /// `Get k` — advances position by `min(k, remaining)` bytes in the
    /// current direction, returning what was read (may be shorter than
    /// `k` at EOF).
    pub fn get(&mut self, k: u64) -> Result<Vec<u8>> {
        let bytes = self.peek(k)?;
        match self.direction {
            Direction::Forward => self.position += bytes.len() as u64,
            Direction::Backward => self.position -= bytes.len() as u64,
        }
        Ok(bytes)
    }

    /// `Peek k` — same bytes `Get` would return, without moving
    /// position.
    pub fn peek(&mut self, k: u64) -> Result<Vec<u8>> {
        let (start, len) = match self.direction {
            Direction::Forward => {
                let remaining = self.size - self.position;
                (self.position, remaining.min(k))
            }
            Direction::Backward => {
                let remaining = self.position;
                let len = remaining.min(k);
                (self.position - len, len)
            }
        };
        if len == 0 {
            return Ok(Vec::new());
        }
        self.file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; len as usize];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// `Discard k` — advances position as `Get` would, without
    /// returning the bytes read.
    pub fn discard(&mut self, k: u64) -> Result<()> {
        self.get(k)?;
        Ok(())
    }
}

//! The receive buffer: an append-only byte accumulator
//! with O(1) amortized append and O(1) amortized prefix removal.
//!
//! Grounded in `hyper::proto::h1::io::Buffered`'s `read_buf: BytesMut`
//! field and its `split_to`-based extraction idiom, simplified here to
//! a standalone type with no socket behind it (this engine performs no
//! I/O of its own).

use bytes::{Bytes, BytesMut};

use crate::config::INIT_BUFFER_SIZE;

/// An append-only byte buffer with cheap prefix extraction.
///
/// Line scans remember their last position (`scan_pos`) so that
/// feeding a long line one byte at a time stays linear in the total
/// number of bytes scanned, rather than quadratic.
#[derive(Debug, Default)]
pub struct ReceiveBuffer {
    buf: BytesMut,
    scan_pos: usize,
}

impl ReceiveBuffer {
    /// An empty buffer with the default initial capacity.
    pub fn new() -> ReceiveBuffer {
        ReceiveBuffer {
            buf: BytesMut::with_capacity(INIT_BUFFER_SIZE),
            scan_pos: 0,
        }
    }

    /// Append bytes to the end of the buffer.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// A view of every byte currently buffered.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume up to `n` bytes from the front of the buffer.
    ///
    /// Returns `None` only when the buffer is empty; otherwise returns
    /// all available bytes, which may be fewer than `n`.
    pub fn maybe_extract_at_most(&mut self, n: usize) -> Option<Bytes> {
        if self.buf.is_empty() {
            return None;
        }
        let take = n.min(self.buf.len());
        self.scan_pos = 0;
        Some(self.buf.split_to(take).freeze())
    }

    /// Consume through the next `\n` (inclusive) and return it.
    ///
    /// Returns `None` if no newline has arrived yet. The scan resumes
    /// from wherever the previous probe left off.
    pub fn maybe_extract_next_line(&mut self) -> Option<Bytes> {
        let start = self.scan_pos.min(self.buf.len());
        match self.buf[start..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let end = start + offset + 1;
                self.scan_pos = 0;
                Some(self.buf.split_to(end).freeze())
            }
            None => {
                self.scan_pos = self.buf.len();
                None
            }
        }
    }

    /// Consume a header block: repeated lines terminated by a blank
    /// line, returning each line with its trailing `\r?\n` stripped
    /// (an empty `Vec` if the block itself is empty — i.e. the very
    /// first line was the blank terminator).
    ///
    /// Returns `None` if the terminating blank line has not yet
    /// arrived. Tolerates both `\r\n` and bare `\n` delimiters.
    pub fn maybe_extract_lines(&mut self) -> Option<Vec<Bytes>> {
        let terminator_at = find_blank_line(&self.buf, &mut self.scan_pos)?;
        self.scan_pos = 0;
        let block = self.buf.split_to(terminator_at).freeze();
        Some(split_lines(&block))
    }
}

/// Find the index just past the header block's terminating blank line,
/// i.e. the index at which the remaining, unrelated bytes begin.
/// `scan_pos` both resumes a prior partial scan and records how far
/// this one got, so repeated probes over a growing buffer stay linear.
fn find_blank_line(buf: &[u8], scan_pos: &mut usize) -> Option<usize> {
    let mut line_start = (*scan_pos).min(buf.len());
    loop {
        let offset = match buf[line_start..].iter().position(|&b| b == b'\n') {
            Some(offset) => offset,
            None => {
                *scan_pos = line_start;
                return None;
            }
        };
        let nl = line_start + offset;
        let mut before = nl;
        if before > line_start && buf[before - 1] == b'\r' {
            before -= 1;
        }
        if before == line_start {
            return Some(nl + 1);
        }
        line_start = nl + 1;
    }
}

/// Split a header block into lines with trailing `\r?\n` stripped,
/// dropping the final (blank) line.
fn split_lines(block: &Bytes) -> Vec<Bytes> {
    let mut lines = Vec::new();
    let mut start = 0;
    while start < block.len() {
        let nl = match block[start..].iter().position(|&b| b == b'\n') {
            Some(offset) => start + offset,
            None => block.len(),
        };
        let mut end = nl;
        if end > start && block[end - 1] == b'\r' {
            end -= 1;
        }
        let line = block.slice(start..end);
        start = nl + 1;
        if line.is_empty() && start >= block.len() {
            // trailing blank terminator line, not a header
            break;
        }
        lines.push(line);
    }
    lines
}

//! Body readers: three framing strategies modeled as one
//! tagged variant with a single `step` entry point, avoiding dynamic
//! dispatch and keeping the reader's state exhaustively visible.
//!
//! The chunked phases mirror `hyper::proto::h1::decode::ChunkedState`
//! (`Size`/`Body`/`BodyCr`.../`Trailer`), collapsed to four phases
//! (between chunks, in chunk, discarding, trailer) since this engine
//! parses a whole chunk-header line at once via
//! [`crate::grammar::chunk_header`] rather than byte-by-byte.

use bytes::Bytes;
use tracing::trace;

use crate::buf::ReceiveBuffer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::grammar;
use crate::headers::normalize;

/// What a body reader produced on one `step`.
#[derive(Debug)]
pub enum StepOutcome {
    Data(Event),
    EndOfMessage(Event),
    NeedData,
}

/// The chunked-reader's position within one chunk cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkPhase {
    /// Waiting for the next chunk-header line.
    BetweenChunks,
    /// Streaming `remaining` bytes of the current chunk; `started` is
    /// set once the first `Data` for this chunk has been emitted.
    InChunk { remaining: u64, started: bool },
    /// Consuming the 2-byte CRLF that follows a chunk's data.
    Discarding { remaining: u8 },
    /// Reading the trailer header block.
    Trailer,
}

/// One of the three body-framing strategies: counted, chunked, or
/// read-until-close.
#[derive(Debug)]
pub enum BodyReader {
    ContentLength { remaining: u64 },
    Chunked { phase: ChunkPhase, extension_bytes: usize },
    Http10,
}

impl BodyReader {
    pub fn content_length(n: u64) -> BodyReader {
        BodyReader::ContentLength { remaining: n }
    }

    pub fn chunked() -> BodyReader {
        BodyReader::Chunked {
            phase: ChunkPhase::BetweenChunks,
            extension_bytes: 0,
        }
    }

    pub fn http10() -> BodyReader {
        BodyReader::Http10
    }

    /// Advance the reader using whatever bytes are available in `buf`.
    /// Never errors on plain insufficient data — that's `NeedData`.
    pub fn step(&mut self, buf: &mut ReceiveBuffer, cfg: &Config) -> Result<StepOutcome> {
        match self {
            BodyReader::ContentLength { remaining } => {
                if *remaining == 0 {
                    return Ok(StepOutcome::EndOfMessage(Event::EndOfMessage {
                        headers: vec![],
                    }));
                }
                match buf.maybe_extract_at_most(*remaining as usize) {
                    None => Ok(StepOutcome::NeedData),
                    Some(data) => {
                        *remaining -= data.len() as u64;
                        Ok(StepOutcome::Data(Event::Data {
                            data,
                            chunk_start: true,
                            chunk_end: true,
                        }))
                    }
                }
            }
            BodyReader::Http10 => match buf.maybe_extract_at_most(usize::MAX) {
                None => Ok(StepOutcome::NeedData),
                Some(data) => Ok(StepOutcome::Data(Event::Data {
                    data,
                    chunk_start: true,
                    chunk_end: true,
                })),
            },
            BodyReader::Chunked {
                phase,
                extension_bytes,
            } => step_chunked(phase, extension_bytes, buf, cfg),
        }
    }

    /// Called when the stream has hit EOF while this reader is still
    /// active. Decides whether that EOF is a natural terminator
    /// (`Http10`) or a protocol violation (everything else).
    pub fn on_eof(&self) -> Result<Event> {
        match self {
            BodyReader::ContentLength { remaining } if *remaining > 0 => Err(Error::remote(
                "connection closed before Content-Length body completed",
            )),
            BodyReader::ContentLength { .. } => {
                Ok(Event::EndOfMessage { headers: vec![] })
            }
            BodyReader::Chunked { .. } => Err(Error::remote(
                "connection closed before chunked body terminator chunk",
            )),
            BodyReader::Http10 => Ok(Event::EndOfMessage { headers: vec![] }),
        }
    }
}

fn step_chunked(
    phase: &mut ChunkPhase,
    extension_bytes: &mut usize,
    buf: &mut ReceiveBuffer,
    cfg: &Config,
) -> Result<StepOutcome> {
    loop {
        match *phase {
            ChunkPhase::BetweenChunks => {
                let line = match buf.maybe_extract_next_line() {
                    None => return Ok(StepOutcome::NeedData),
                    Some(line) => line,
                };
                let parsed = grammar::chunk_header(&line, cfg.error_snippet_len)?;
                trace!("chunk size is {:#x} ({} bytes)", parsed.size, parsed.size);
                *extension_bytes += line.len().saturating_sub(parsed.consumed.min(line.len()));
                if *extension_bytes > cfg.max_chunk_extension_bytes {
                    return Err(Error::remote("chunk extensions over limit"));
                }
                if parsed.size == 0 {
                    *phase = ChunkPhase::Trailer;
                } else {
                    *phase = ChunkPhase::InChunk {
                        remaining: parsed.size,
                        started: false,
                    };
                }
            }
            ChunkPhase::InChunk {
                ref mut remaining,
                ref mut started,
            } => {
                let data = match buf.maybe_extract_at_most(*remaining as usize) {
                    None => return Ok(StepOutcome::NeedData),
                    Some(data) => data,
                };
                let chunk_start = !*started;
                *started = true;
                *remaining -= data.len() as u64;
                let chunk_end = *remaining == 0;
                if chunk_end {
                    *phase = ChunkPhase::Discarding { remaining: 2 };
                }
                return Ok(StepOutcome::Data(Event::Data {
                    data,
                    chunk_start,
                    chunk_end,
                }));
            }
            ChunkPhase::Discarding { ref mut remaining } => {
                if *remaining == 0 {
                    *phase = ChunkPhase::BetweenChunks;
                    continue;
                }
                match buf.maybe_extract_at_most(*remaining as usize) {
                    None => return Ok(StepOutcome::NeedData),
                    Some(consumed) => {
                        *remaining -= consumed.len() as u8;
                    }
                }
            }
            ChunkPhase::Trailer => {
                let lines = match buf.maybe_extract_lines() {
                    None => return Ok(StepOutcome::NeedData),
                    Some(lines) => lines,
                };
                if lines.len() > cfg.max_headers {
                    return Err(Error::remote("too many trailer fields"));
                }
                let mut fields = Vec::with_capacity(lines.len());
                for line in &lines {
                    fields.push(grammar::header_field(line, cfg.error_snippet_len)?);
                }
                return Ok(StepOutcome::EndOfMessage(Event::EndOfMessage {
                    headers: normalize(fields),
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn content_length_zero_ends_immediately() {
        let mut reader = BodyReader::content_length(0);
        let mut buf = ReceiveBuffer::new();
        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::EndOfMessage(Event::EndOfMessage { headers }) => assert!(headers.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn content_length_reads_exact_bytes_then_ends() {
        let mut reader = BodyReader::content_length(5);
        let mut buf = ReceiveBuffer::new();
        buf.append(b"hello");
        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::Data(Event::Data { data, .. }) => assert_eq!(&data[..], b"hello"),
            other => panic!("unexpected {:?}", other),
        }
        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::EndOfMessage(_) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn content_length_needs_data_when_buffer_empty() {
        let mut reader = BodyReader::content_length(5);
        let mut buf = ReceiveBuffer::new();
        assert!(matches!(
            reader.step(&mut buf, &cfg()).unwrap(),
            StepOutcome::NeedData
        ));
    }

    #[test]
    fn content_length_eof_with_bytes_outstanding_is_remote_error() {
        let reader = BodyReader::ContentLength { remaining: 3 };
        assert!(reader.on_eof().is_err());
    }

    #[test]
    fn http10_returns_all_available_then_eof_ends() {
        let mut reader = BodyReader::http10();
        let mut buf = ReceiveBuffer::new();
        buf.append(b"abc");
        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::Data(Event::Data { data, .. }) => assert_eq!(&data[..], b"abc"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(reader.on_eof().unwrap(), Event::EndOfMessage { .. }));
    }

    #[test]
    fn chunked_single_chunk_round_trip() {
        let mut reader = BodyReader::chunked();
        let mut buf = ReceiveBuffer::new();
        buf.append(b"5\r\nhello\r\n0\r\n\r\n");

        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::Data(Event::Data {
                data,
                chunk_start,
                chunk_end,
            }) => {
                assert_eq!(&data[..], b"hello");
                assert!(chunk_start);
                assert!(chunk_end);
            }
            other => panic!("unexpected {:?}", other),
        }
        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::EndOfMessage(Event::EndOfMessage { headers }) => assert!(headers.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn chunked_splits_large_chunk_across_reads() {
        let mut reader = BodyReader::chunked();
        let mut buf = ReceiveBuffer::new();
        buf.append(b"5\r\nhe");
        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::Data(Event::Data {
                data,
                chunk_start,
                chunk_end,
            }) => {
                assert_eq!(&data[..], b"he");
                assert!(chunk_start);
                assert!(!chunk_end);
            }
            other => panic!("unexpected {:?}", other),
        }
        buf.append(b"llo\r\n0\r\n\r\n");
        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::Data(Event::Data {
                data,
                chunk_start,
                chunk_end,
            }) => {
                assert_eq!(&data[..], b"llo");
                assert!(!chunk_start);
                assert!(chunk_end);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            reader.step(&mut buf, &cfg()).unwrap(),
            StepOutcome::EndOfMessage(_)
        ));
    }

    #[test]
    fn chunked_eof_before_terminator_is_remote_error() {
        let reader = BodyReader::chunked();
        assert!(reader.on_eof().is_err());
    }

    #[test]
    fn chunked_discards_extensions() {
        let mut reader = BodyReader::chunked();
        let mut buf = ReceiveBuffer::new();
        buf.append(b"5;foo=bar\r\nhello\r\n0\r\n\r\n");
        let outcome = reader.step(&mut buf, &cfg()).unwrap();
        match outcome {
            StepOutcome::Data(Event::Data { data, .. }) => assert_eq!(&data[..], b"hello"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn chunked_rejects_bare_lf_in_extension() {
        let mut reader = BodyReader::chunked();
        let mut buf = ReceiveBuffer::new();
        buf.append(b"5;foo\nbar\r\nhello\r\n0\r\n\r\n");
        assert!(reader.step(&mut buf, &cfg()).is_err());
    }

    #[test]
    fn chunked_with_trailers() {
        let mut reader = BodyReader::chunked();
        let mut buf = ReceiveBuffer::new();
        buf.append(b"0\r\nX-Trailer: yes\r\n\r\n");
        match reader.step(&mut buf, &cfg()).unwrap() {
            StepOutcome::EndOfMessage(Event::EndOfMessage { headers }) => {
                assert_eq!(headers, vec![(Bytes::from_static(b"x-trailer"), Bytes::from_static(b"yes"))]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
